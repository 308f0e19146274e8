//! Error types for droidmon
//!
//! Telemetry polling never surfaces these to the UI layer: transport failures
//! collapse into `None` results and parse failures into default values. The
//! errors below exist for session setup, batch construction, configuration,
//! and explicit user-initiated actions.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while starting or driving the remote shell process
#[derive(Debug, Error)]
pub enum ShellError {
    /// The shell process could not be spawned
    #[error("Failed to spawn `{program}`: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// A standard stream of the child process was not captured
    #[error("Shell process has no {0} pipe")]
    MissingPipe(&'static str),

    /// Writing the command to the shell failed
    #[error("Failed to write to shell: {0}")]
    Write(#[source] std::io::Error),

    /// The shell closed its output stream mid-command
    #[error("Shell output stream closed")]
    Closed,

    /// The session was disposed and refuses new work
    #[error("Shell session has been disposed")]
    Disposed,

    /// The remote command did not finish in time
    #[error("Shell command timed out after {0}s")]
    Timeout(u64),
}

/// Errors raised while building a [`crate::batch::CommandBatch`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BatchError {
    /// Two commands in one batch share an id
    #[error("Duplicate query id in batch: {0}")]
    DuplicateId(String),

    /// The id is empty or spans lines, so its marker could not be scanned
    #[error("Invalid query id {0:?}: ids must be non-empty single-line text")]
    InvalidId(String),

    /// The id contains the section sentinel and would corrupt demultiplexing
    #[error("Query id {0:?} contains the section sentinel")]
    SentinelInId(String),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration directory could not be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,

    /// Reading or writing the settings file failed
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File that could not be accessed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`crate::config::AppSettings`]
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// File that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// Failure of an explicit user-initiated action (connect, install, uninstall, kill)
///
/// Carries the captured output so the caller can display it verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{action} failed: {}", summary(.stdout, .stderr))]
pub struct ActionError {
    /// Short action name, e.g. `install`
    pub action: String,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

fn summary(stdout: &str, stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.to_string()
    }
}

/// Result type for shell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Result type for batch construction
pub type BatchResult<T> = Result<T, BatchError>;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
