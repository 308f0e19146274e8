//! CLI error types and exit codes.

use droidmon_core::error::{ActionError, BatchError, ConfigError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or output errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Device failure - the device did not answer or refused an action
    pub const DEVICE_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The device did not answer
    #[error("Device error: {0}")]
    Device(String),

    /// A device action was refused or failed
    #[error("{0}")]
    Action(#[from] ActionError),

    /// Output could not be rendered
    #[error("Output error: {0}")]
    Output(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<BatchError> for CliError {
    fn from(err: BatchError) -> Self {
        Self::Device(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(format!("Failed to serialize to JSON: {err}"))
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, output, IO)
    /// - 2: Device failure (no answer, action failed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Device(_) | Self::Action(_) => exit_codes::DEVICE_FAILURE,
            Self::Config(_) | Self::Output(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
