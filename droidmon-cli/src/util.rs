//! Shared utility functions used across command modules.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use droidmon_core::config::{AdbSettings, AppSettings, ConfigManager};
use droidmon_core::tracing::init_tracing;
use droidmon_core::{DeviceClient, Telemetry};

use crate::error::CliError;

/// Global flags shared by every command
#[derive(Debug, Clone, Default)]
pub struct CliContext {
    /// Custom configuration directory
    pub config_path: Option<PathBuf>,
    /// Device serial overriding the configured one
    pub serial: Option<String>,
    /// adb executable overriding the configured one
    pub adb_path: Option<String>,
    /// Number of `-v` flags
    pub verbose: u8,
    /// Suppress logs and progress messages
    pub quiet: bool,
}

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads settings and applies the `--serial` and `--adb` overrides
pub fn load_settings(context: &CliContext) -> Result<AppSettings, CliError> {
    let manager = create_config_manager(context.config_path.as_deref())?;
    let mut settings = manager.load_settings()?;
    apply_overrides(&mut settings.adb, context);
    Ok(settings)
}

fn apply_overrides(adb: &mut AdbSettings, context: &CliContext) {
    if let Some(serial) = context.serial.as_deref().filter(|s| !s.is_empty()) {
        adb.serial = Some(serial.to_string());
    }
    if let Some(path) = context.adb_path.as_deref().filter(|s| !s.is_empty()) {
        adb.adb_path = path.to_string();
    }
}

/// Loads settings and starts logging; the common preamble of device commands
pub fn prepare(context: &CliContext) -> Result<AppSettings, CliError> {
    let settings = load_settings(context)?;
    if !context.quiet {
        let config = settings.logging.tracing_config(context.verbose);
        if let Err(e) = init_tracing(&config) {
            eprintln!("Warning: failed to initialize logging: {e}");
        }
    }
    Ok(settings)
}

/// Creates the async runtime used by device commands
pub fn create_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Device(format!("Failed to create async runtime: {e}")))
}

/// Builds a client and its telemetry queries
pub fn connect_telemetry(adb: &AdbSettings) -> Result<(Arc<DeviceClient>, Telemetry), CliError> {
    let client = Arc::new(DeviceClient::new(adb));
    let telemetry = Telemetry::new(Arc::clone(&client))?;
    Ok((client, telemetry))
}

/// Error for a device that did not answer
pub fn no_response(adb: &AdbSettings) -> CliError {
    match &adb.serial {
        Some(serial) => CliError::Device(format!("No response from device '{serial}'")),
        None => CliError::Device(format!(
            "No response from device (is one attached? try `{} devices`)",
            adb.adb_path
        )),
    }
}
