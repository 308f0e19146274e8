//! One-shot system snapshot command.

use std::time::Duration;

use droidmon_core::adb::CancellationToken;
use droidmon_core::collector::MetricsComputer;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::metrics_table;
use crate::util::{CliContext, connect_telemetry, create_runtime, no_response, prepare};

/// Snapshot command handler
///
/// Reads twice, `interval` seconds apart, so rates and CPU usage are
/// available; with `interval == 0` only instantaneous figures are shown.
pub fn cmd_snapshot(
    context: &CliContext,
    format: OutputFormat,
    interval: u8,
) -> Result<(), CliError> {
    let settings = prepare(context)?;
    let monitoring = settings.monitoring_for(settings.adb.serial.as_deref());
    if !monitoring.enabled {
        return Err(CliError::Config(
            "Monitoring is disabled for this device in config.toml".to_string(),
        ));
    }
    let runtime = create_runtime()?;

    let metrics = runtime.block_on(async {
        let (client, telemetry) = connect_telemetry(&settings.adb)?;
        let cancel = CancellationToken::new();
        let mut computer = MetricsComputer::new();

        let first = telemetry.poll_system(&cancel).await;
        let result = match first {
            None => Err(no_response(&settings.adb)),
            Some(first) if interval == 0 => Ok(computer.compute(first)),
            Some(first) => {
                computer.compute(first);
                tokio::time::sleep(Duration::from_secs(u64::from(interval))).await;
                telemetry
                    .poll_system(&cancel)
                    .await
                    .map(|second| computer.compute(second))
                    .ok_or_else(|| no_response(&settings.adb))
            }
        };
        client.dispose().await;
        result
    })?;

    match format {
        OutputFormat::Table => println!("{}", metrics_table(&metrics, &monitoring)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&metrics)?),
    }
    Ok(())
}
