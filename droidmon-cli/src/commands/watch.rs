//! Streaming system metrics command.

use droidmon_core::collector::MetricsEvent;

use super::stream::{JsonEvent, run_stream};
use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::metrics_line;
use crate::util::{CliContext, prepare};

/// Watch command handler
pub fn cmd_watch(
    context: &CliContext,
    format: OutputFormat,
    interval: Option<u8>,
    count: Option<u32>,
) -> Result<(), CliError> {
    let settings = prepare(context)?;
    let mut monitoring = settings.monitoring_for(settings.adb.serial.as_deref());
    if !monitoring.enabled {
        return Err(CliError::Config(
            "Monitoring is disabled for this device in config.toml".to_string(),
        ));
    }
    if let Some(secs) = interval {
        monitoring.interval_secs = secs;
    }
    monitoring.processes_enabled = false;

    if !context.quiet && format == OutputFormat::Table {
        eprintln!(
            "Polling every {}s, press Ctrl-C to stop",
            monitoring.effective_interval_secs()
        );
    }

    run_stream(&settings.adb, &monitoring, count, |event| match event {
        MetricsEvent::DeviceInfoReady(info) => {
            match format {
                OutputFormat::Table => println!(
                    "{} {} (Android {})",
                    info.manufacturer, info.model, info.android_version
                ),
                OutputFormat::Json => JsonEvent::Device(info).print()?,
            }
            Ok(false)
        }
        MetricsEvent::Update(metrics) => {
            match format {
                OutputFormat::Table => println!("{}", metrics_line(metrics)),
                OutputFormat::Json => JsonEvent::Metrics(metrics).print()?,
            }
            Ok(true)
        }
        MetricsEvent::Processes(_) | MetricsEvent::Stopped => Ok(false),
    })
}
