//! Remote command text
//!
//! These strings are what devices actually answer to; keep them verbatim.

use crate::batch::CommandBatch;
use crate::error::BatchResult;

/// Memory figures
pub const MEMINFO_COMMAND: &str = "cat /proc/meminfo";

/// CPU jiffies, load averages and the `/proc` listing
pub const CPU_COMMAND: &str = "cat /proc/stat; cat /proc/loadavg; ls /proc/";

/// Interface counters
pub const NET_DEV_COMMAND: &str = "cat /proc/net/dev";

/// Paging counters and storage diagnostics
pub const DISK_COMMAND: &str = "grep -E '^pgpgin |^pgpgout ' /proc/vmstat; dumpsys diskstats | grep -E 'Latency:|Recent Disk Write Speed'";

/// Thermal HAL dump
pub const THERMAL_COMMAND: &str = "dumpsys thermalservice";

/// Time since boot
pub const UPTIME_COMMAND: &str = "uptime";

/// Aggregate stat, every per-process stat, and UID ownership, separated by
/// `---` lines
pub const PROCESS_STAT_COMMAND: &str =
    "cat /proc/stat; echo ---; cat /proc/[0-9]*/stat; echo ---; ls -ldn /proc/[0-9]*";

/// PID to command line, run concurrently with [`PROCESS_STAT_COMMAND`]
pub const PROCESS_ARGS_COMMAND: &str = "ps -A -o PID,ARGS";

/// Separator line between the blocks of [`PROCESS_STAT_COMMAND`]
pub const PROCESS_BLOCK_SEPARATOR: &str = "---";

/// Section ids of the system batch
pub mod system_ids {
    /// `/proc/meminfo`
    pub const MEMORY: &str = "mem";
    /// `/proc/stat` + loadavg + listing
    pub const CPU: &str = "cpu";
    /// `/proc/net/dev`
    pub const NETWORK: &str = "net";
    /// vmstat + diskstats
    pub const DISK: &str = "disk";
    /// thermalservice
    pub const THERMAL: &str = "thermal";
    /// uptime
    pub const UPTIME: &str = "uptime";
}

/// Section ids of the device-info batch
pub mod device_ids {
    /// `ro.product.model`
    pub const MODEL: &str = "model";
    /// `ro.product.manufacturer`
    pub const MANUFACTURER: &str = "manufacturer";
    /// `ro.build.version.release`
    pub const RELEASE: &str = "release";
    /// `ro.build.version.sdk`
    pub const SDK: &str = "sdk";
    /// `ro.product.cpu.abi`
    pub const ABI: &str = "abi";
    /// uptime
    pub const UPTIME: &str = "uptime";
}

/// Builds the batch polled on every tick
///
/// # Errors
///
/// Never fails for the built-in ids; the `Result` is kept so a broken id
/// surfaces at construction instead of silently dropping a section.
pub fn system_batch() -> BatchResult<CommandBatch> {
    CommandBatch::new("system")
        .with_command(system_ids::MEMORY, MEMINFO_COMMAND)?
        .with_command(system_ids::CPU, CPU_COMMAND)?
        .with_command(system_ids::NETWORK, NET_DEV_COMMAND)?
        .with_command(system_ids::DISK, DISK_COMMAND)?
        .with_command(system_ids::THERMAL, THERMAL_COMMAND)?
        .with_command(system_ids::UPTIME, UPTIME_COMMAND)
}

/// Builds the batch read once per connection
///
/// # Errors
///
/// See [`system_batch`].
pub fn device_info_batch() -> BatchResult<CommandBatch> {
    CommandBatch::new("device-info")
        .with_command(device_ids::MODEL, "getprop ro.product.model")?
        .with_command(device_ids::MANUFACTURER, "getprop ro.product.manufacturer")?
        .with_command(device_ids::RELEASE, "getprop ro.build.version.release")?
        .with_command(device_ids::SDK, "getprop ro.build.version.sdk")?
        .with_command(device_ids::ABI, "getprop ro.product.cpu.abi")?
        .with_command(device_ids::UPTIME, UPTIME_COMMAND)
}
