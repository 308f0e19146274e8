//! Data models for device telemetry
//!
//! Snapshots hold raw readings from one poll: cumulative counters (CPU
//! jiffies, network and paging counters) or instantaneous values (memory,
//! temperatures). Rates and percentages come from [`crate::diff`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregate CPU jiffies from the bare `cpu` line of `/proc/stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CpuTimes {
    /// Time in user mode
    pub user: u64,
    /// Time in user mode with low priority
    pub nice: u64,
    /// Time in kernel mode
    pub system: u64,
    /// Idle time
    pub idle: u64,
    /// Time waiting for I/O
    pub iowait: u64,
    /// Time servicing hardware interrupts
    pub irq: u64,
    /// Time servicing softirqs
    pub softirq: u64,
    /// Time stolen by the hypervisor (absent on older kernels)
    pub steal: u64,
}

impl CpuTimes {
    /// Builds times from the numeric fields of a `cpu` line; missing trailing
    /// fields are zero
    #[must_use]
    pub fn from_fields(fields: &[u64]) -> Self {
        let f = |i: usize| fields.get(i).copied().unwrap_or(0);
        Self {
            user: f(0),
            nice: f(1),
            system: f(2),
            idle: f(3),
            iowait: f(4),
            irq: f(5),
            softirq: f(6),
            steal: f(7),
        }
    }

    /// User-side time: user + nice
    #[must_use]
    pub const fn user_total(&self) -> u64 {
        self.user.saturating_add(self.nice)
    }

    /// Kernel-side time: system + iowait + irq + softirq + steal
    #[must_use]
    pub const fn system_total(&self) -> u64 {
        self.system
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
            .saturating_add(self.steal)
    }

    /// Every non-idle field
    #[must_use]
    pub const fn active(&self) -> u64 {
        self.user_total().saturating_add(self.system_total())
    }

    /// Active plus idle
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.active().saturating_add(self.idle)
    }
}

/// Jiffies of one `cpuN` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreJiffies {
    /// Label as reported by the kernel, e.g. `cpu3`
    pub label: String,
    /// Sum of all non-idle fields
    pub active: u64,
    /// Active plus idle
    pub total: u64,
}

/// CPU counters from one poll
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CpuSnapshot {
    /// Aggregate over all cores
    pub aggregate: CpuTimes,
    /// Online cores in reported order; offline cores are absent
    pub cores: Vec<CoreJiffies>,
}

/// Load averages and scheduler counts from `/proc/loadavg`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadAverage {
    /// 1-minute load average
    pub one: f32,
    /// 5-minute load average
    pub five: f32,
    /// 15-minute load average
    pub fifteen: f32,
    /// Runnable scheduling entities
    pub running: u32,
    /// Total scheduling entities (threads)
    pub total: u32,
}

/// Memory readings in bytes from `/proc/meminfo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// `MemTotal`
    pub total_bytes: u64,
    /// `MemFree`
    pub free_bytes: u64,
    /// `MemAvailable` (0 on kernels that do not report it)
    pub available_bytes: u64,
    /// `Buffers`
    pub buffers_bytes: u64,
    /// `Cached`
    pub cached_bytes: u64,
    /// `SwapTotal` (zram on most devices)
    pub swap_total_bytes: u64,
    /// `SwapFree`
    pub swap_free_bytes: u64,
}

impl MemorySnapshot {
    /// Memory the system could hand out, estimated from free + buffers +
    /// cached when `MemAvailable` is absent
    #[must_use]
    pub const fn effective_available_bytes(&self) -> u64 {
        if self.available_bytes > 0 {
            self.available_bytes
        } else {
            self.free_bytes
                .saturating_add(self.buffers_bytes)
                .saturating_add(self.cached_bytes)
        }
    }

    /// Memory in use
    #[must_use]
    pub const fn used_bytes(&self) -> u64 {
        self.total_bytes
            .saturating_sub(self.effective_available_bytes())
    }

    /// Memory usage as a percentage (0.0–100.0)
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes() as f32 / self.total_bytes as f32) * 100.0
    }

    /// Swap in use
    #[must_use]
    pub const fn swap_used_bytes(&self) -> u64 {
        self.swap_total_bytes.saturating_sub(self.swap_free_bytes)
    }

    /// Swap usage as a percentage, or 0 without swap
    #[must_use]
    pub fn swap_percent(&self) -> f32 {
        if self.swap_total_bytes == 0 {
            return 0.0;
        }
        (self.swap_used_bytes() as f32 / self.swap_total_bytes as f32) * 100.0
    }
}

/// Cumulative counters summed over every non-loopback interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Received bytes
    pub rx_bytes: u64,
    /// Received packets
    pub rx_packets: u64,
    /// Transmitted bytes
    pub tx_bytes: u64,
    /// Transmitted packets
    pub tx_packets: u64,
}

/// Paging counters and storage diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiskSnapshot {
    /// Cumulative bytes paged in (`pgpgin` × 1024)
    pub paged_in_bytes: u64,
    /// Cumulative bytes paged out (`pgpgout` × 1024)
    pub paged_out_bytes: u64,
    /// Last storage latency benchmark from `dumpsys diskstats`
    pub latency_ms: Option<u32>,
    /// Recent write speed from `dumpsys diskstats`
    pub recent_write_kib_per_sec: Option<u64>,
}

/// One temperature sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalZone {
    /// Sensor name reported by the thermal HAL
    pub name: String,
    /// Temperature in degrees Celsius
    pub celsius: f32,
}

/// Cooling fan state; one fan is reported per device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanState {
    /// Cooling device level 0
    Off,
    /// Running at the given level
    Active(u32),
}

impl FanState {
    /// Maps a cooling device level to a fan state
    #[must_use]
    pub const fn from_level(level: u32) -> Self {
        if level == 0 { Self::Off } else { Self::Active(level) }
    }
}

impl std::fmt::Display for FanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Active(level) => write!(f, "Active (Level {level})"),
        }
    }
}

/// Readings from `dumpsys thermalservice`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThermalSnapshot {
    /// Zones in reported order
    pub zones: Vec<ThermalZone>,
    /// Fan state, `None` when the device reports no cooling device
    pub fan: Option<FanState>,
}

impl ThermalSnapshot {
    /// The hottest zone, if any
    #[must_use]
    pub fn hottest(&self) -> Option<&ThermalZone> {
        self.zones
            .iter()
            .max_by(|a, b| a.celsius.total_cmp(&b.celsius))
    }

    /// Temperatures keyed by zone name; duplicate names keep the last reading
    #[must_use]
    pub fn by_name(&self) -> BTreeMap<String, f32> {
        self.zones
            .iter()
            .map(|z| (z.name.clone(), z.celsius))
            .collect()
    }
}

/// Static device properties, read once per connection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// `ro.product.model`
    pub model: String,
    /// `ro.product.manufacturer`
    pub manufacturer: String,
    /// `ro.build.version.release`
    pub android_version: String,
    /// `ro.build.version.sdk`
    pub sdk_level: Option<u32>,
    /// `ro.product.cpu.abi`
    pub abi: String,
    /// Time since boot when the info was read
    pub uptime: Option<Duration>,
}

/// Everything read in one system poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// CPU counters
    pub cpu: CpuSnapshot,
    /// Memory readings
    pub memory: MemorySnapshot,
    /// Paging counters and storage diagnostics
    pub disk: DiskSnapshot,
    /// Network counters
    pub network: NetworkSnapshot,
    /// Temperatures and fan state
    pub thermal: ThermalSnapshot,
    /// Load averages
    pub load: LoadAverage,
    /// Number of numeric entries under `/proc`
    pub process_count: u32,
    /// Total scheduling entities from `/proc/loadavg`
    pub thread_count: u32,
    /// Time since boot
    pub uptime: Option<Duration>,
    /// When the snapshot was taken, for display
    pub timestamp: DateTime<Utc>,
    /// When the snapshot was taken, for differencing
    #[serde(skip, default = "Instant::now")]
    pub taken_at: Instant,
}

/// User/system/idle split of one CPU window, each 0.0–100.0
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CpuBreakdown {
    /// user + nice
    pub user: f32,
    /// system + iowait + irq + softirq + steal
    pub system: f32,
    /// idle
    pub idle: f32,
}

/// Network throughput; each figure is `None` when its counter regressed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkRates {
    /// Received bytes per second
    pub rx_bytes_per_sec: Option<f64>,
    /// Transmitted bytes per second
    pub tx_bytes_per_sec: Option<f64>,
    /// Received packets per second
    pub rx_packets_per_sec: Option<f64>,
    /// Transmitted packets per second
    pub tx_packets_per_sec: Option<f64>,
}

/// Paging throughput; each figure is `None` when its counter regressed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiskRates {
    /// Bytes paged in per second
    pub read_bytes_per_sec: Option<f64>,
    /// Bytes paged out per second
    pub write_bytes_per_sec: Option<f64>,
}

/// A system snapshot annotated with figures derived from the previous poll
///
/// Every derived figure is `None` on the first poll and after a counter
/// regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// The raw snapshot
    pub snapshot: SystemSnapshot,
    /// Aggregate CPU usage
    pub cpu_percent: Option<f32>,
    /// Aggregate CPU split
    pub cpu_breakdown: Option<CpuBreakdown>,
    /// Per-core usage keyed by core label
    pub core_percents: BTreeMap<String, Option<f32>>,
    /// Network throughput
    pub network: NetworkRates,
    /// Paging throughput
    pub disk: DiskRates,
}
