//! Telemetry queries against one device
//!
//! Turns a [`DeviceClient`] round trip into typed snapshots. A transport
//! failure yields `None`; anything short of that yields a snapshot, with
//! defaults for every section that was missing or unparseable.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::adb::CancellationToken;
use crate::batch::{CommandBatch, SectionMap};
use crate::client::DeviceClient;
use crate::error::BatchResult;
use crate::metrics::{DeviceInfo, SystemSnapshot};
use crate::parser::{
    CpuReport, parse_cpu_report, parse_device_info, parse_disk, parse_meminfo, parse_net_dev,
    parse_thermal, parse_uptime,
};
use crate::process::{ProcessSnapshot, parse_snapshot};
use crate::queries::{
    PROCESS_ARGS_COMMAND, PROCESS_STAT_COMMAND, device_info_batch, system_batch, system_ids,
};

/// Builds a [`SystemSnapshot`] from the system batch sections
#[must_use]
pub fn system_snapshot_from_sections(sections: &SectionMap) -> SystemSnapshot {
    let CpuReport {
        cpu,
        load,
        process_count,
        thread_count,
    } = sections.parse_or_default(system_ids::CPU, parse_cpu_report);

    SystemSnapshot {
        cpu,
        memory: sections.parse_or_default(system_ids::MEMORY, parse_meminfo),
        disk: sections.parse_or_default(system_ids::DISK, parse_disk),
        network: sections.parse_or_default(system_ids::NETWORK, parse_net_dev),
        thermal: sections.parse_or_default(system_ids::THERMAL, parse_thermal),
        load,
        process_count,
        thread_count,
        uptime: sections.get(system_ids::UPTIME).and_then(parse_uptime),
        timestamp: Utc::now(),
        taken_at: Instant::now(),
    }
}

/// Prebuilt batches bound to a device client
#[derive(Debug, Clone)]
pub struct Telemetry {
    client: Arc<DeviceClient>,
    system: CommandBatch,
    device_info: CommandBatch,
}

impl Telemetry {
    /// Creates the query set for `client`
    ///
    /// # Errors
    ///
    /// Propagates a [`crate::error::BatchError`] from building the batches.
    pub fn new(client: Arc<DeviceClient>) -> BatchResult<Self> {
        Ok(Self {
            client,
            system: system_batch()?,
            device_info: device_info_batch()?,
        })
    }

    /// The underlying client
    #[must_use]
    pub const fn client(&self) -> &Arc<DeviceClient> {
        &self.client
    }

    /// One system poll: memory, CPU, network, disk, thermal and uptime in a
    /// single round trip
    pub async fn poll_system(&self, cancel: &CancellationToken) -> Option<SystemSnapshot> {
        let sections = self.client.run_batch(&self.system, cancel).await?;
        Some(system_snapshot_from_sections(&sections))
    }

    /// One process poll
    ///
    /// The stat command goes through the session while `ps` runs in its own
    /// process at the same time. Only a failed stat command fails the poll;
    /// without `ps` output every command line falls back to the process name.
    pub async fn poll_processes(&self, cancel: &CancellationToken) -> Option<ProcessSnapshot> {
        let (stat, args) = tokio::join!(
            self.client.run_shell(PROCESS_STAT_COMMAND, cancel),
            self.client.run_one_off(PROCESS_ARGS_COMMAND, cancel),
        );
        let stat = stat?;
        if args.is_none() {
            tracing::debug!("Process listing unavailable, using kernel names");
        }
        Some(parse_snapshot(&stat, args.as_deref().unwrap_or("")))
    }

    /// Static properties and uptime in one round trip
    pub async fn device_info(&self, cancel: &CancellationToken) -> Option<DeviceInfo> {
        let sections = self.client.run_batch(&self.device_info, cancel).await?;
        Some(parse_device_info(&sections))
    }
}
