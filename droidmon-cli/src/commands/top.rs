//! Process table command.

use droidmon_core::collector::MetricsEvent;

use super::stream::{JsonEvent, run_stream};
use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::process_table;
use crate::util::{CliContext, prepare};

/// Parameters for the top command
pub struct TopParams {
    pub format: OutputFormat,
    pub limit: usize,
    pub apps_only: bool,
    pub interval: Option<u8>,
    pub count: Option<u32>,
}

/// Top command handler
///
/// The first poll only establishes a baseline, so the first table appears
/// after one interval.
pub fn cmd_top(context: &CliContext, params: TopParams) -> Result<(), CliError> {
    let settings = prepare(context)?;
    let mut monitoring = settings.monitoring_for(settings.adb.serial.as_deref());
    if let Some(secs) = params.interval {
        monitoring.interval_secs = secs;
    }
    monitoring.processes_enabled = true;

    run_stream(&settings.adb, &monitoring, params.count, |event| {
        let MetricsEvent::Processes(table) = event else {
            return Ok(false);
        };
        if table.system_cpu_percent.is_none() {
            return Ok(false);
        }
        match params.format {
            OutputFormat::Table => {
                println!("{}\n", process_table(table, params.limit, params.apps_only));
            }
            OutputFormat::Json => JsonEvent::Processes(table).print()?,
        }
        Ok(true)
    })
}
