//! Shared event loop for the streaming commands.

use droidmon_core::collector::{MetricsEvent, start_collector};
use droidmon_core::config::{AdbSettings, MonitoringSettings};
use droidmon_core::metrics::{DeviceInfo, SystemMetrics};
use droidmon_core::process::ProcessTable;
use serde::Serialize;

use crate::error::CliError;
use crate::util::{connect_telemetry, create_runtime};

/// One line of `--format json` output
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum JsonEvent<'a> {
    /// Device properties
    Device(&'a DeviceInfo),
    /// A system update
    Metrics(&'a SystemMetrics),
    /// A process table
    Processes(&'a ProcessTable),
}

impl JsonEvent<'_> {
    /// Prints the event as a single JSON line
    pub fn print(&self) -> Result<(), CliError> {
        println!("{}", serde_json::to_string(self)?);
        Ok(())
    }
}

/// Runs the collector and hands every event to `on_event`.
///
/// `on_event` returns whether the event counts towards `count`. The loop
/// ends after `count` counted events, on Ctrl-C, or when the collector stops.
pub fn run_stream<F>(
    adb: &AdbSettings,
    monitoring: &MonitoringSettings,
    count: Option<u32>,
    mut on_event: F,
) -> Result<(), CliError>
where
    F: FnMut(&MetricsEvent) -> Result<bool, CliError>,
{
    if count == Some(0) {
        return Ok(());
    }
    let runtime = create_runtime()?;

    runtime.block_on(async {
        let (client, telemetry) = connect_telemetry(adb)?;
        let (handle, mut events) = start_collector(monitoring, telemetry);
        let mut produced: u32 = 0;

        let result = loop {
            let event = tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping collector");
                    break Ok(());
                }
                event = events.recv() => event,
            };
            let Some(event) = event else {
                break Ok(());
            };
            if matches!(event, MetricsEvent::Stopped) {
                break Ok(());
            }
            match on_event(&event) {
                Ok(true) => {
                    produced += 1;
                    if count.is_some_and(|c| produced >= c) {
                        break Ok(());
                    }
                }
                Ok(false) => {}
                Err(e) => break Err(e),
            }
        };

        handle.stop().await;
        client.dispose().await;
        result
    })
}
