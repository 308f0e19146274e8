//! Device properties command.

use droidmon_core::adb::CancellationToken;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::format::device_table;
use crate::util::{CliContext, connect_telemetry, create_runtime, no_response, prepare};

/// Info command handler
pub fn cmd_info(context: &CliContext, format: OutputFormat) -> Result<(), CliError> {
    let settings = prepare(context)?;
    let runtime = create_runtime()?;

    let info = runtime.block_on(async {
        let (client, telemetry) = connect_telemetry(&settings.adb)?;
        let info = telemetry.device_info(&CancellationToken::new()).await;
        client.dispose().await;
        info.ok_or_else(|| no_response(&settings.adb))
    })?;

    match format {
        OutputFormat::Table => println!("{}", device_table(&info)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
    }
    Ok(())
}
