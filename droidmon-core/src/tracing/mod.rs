//! Tracing integration for structured logging
//!
//! Transport, batching and poll-loop code emit `tracing` events and spans
//! under the names in [`span_names`]. Front ends call [`init_tracing`] once
//! at startup to install a subscriber.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

static TRACING_CONFIG: OnceLock<TracingConfig> = OnceLock::new();

/// Crate targets covered by the default filter
const DEFAULT_TARGETS: &[&str] = &["droidmon_core", "droidmon"];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to install the subscriber or parse the filter
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,

    /// Failed to create the log file
    #[error("Failed to create log file {path}: {message}")]
    FileCreationFailed {
        /// Requested log file
        path: PathBuf,
        /// Underlying I/O error text
        message: String,
    },
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Log verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    /// Only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings and info (default)
    #[default]
    Info,
    /// All above plus transport chatter
    Debug,
    /// Everything
    Trace,
}

impl TracingLevel {
    /// Converts to the tracing crate's `Level`
    #[must_use]
    pub const fn to_tracing_level(self) -> Level {
        match self {
            Self::Error => Level::ERROR,
            Self::Warn => Level::WARN,
            Self::Info => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Raises verbosity by `steps` (one per `-v` flag), saturating at trace
    #[must_use]
    pub const fn raised_by(self, steps: u8) -> Self {
        let rank = match self {
            Self::Error => 0u8,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
        };
        match rank.saturating_add(steps) {
            0 => Self::Error,
            1 => Self::Warn,
            2 => Self::Info,
            3 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl std::str::FromStr for TracingLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TracingOutput {
    /// Standard output
    Stdout,
    /// Standard error. Keeps stdout clean for JSON output.
    #[default]
    Stderr,
    /// A file, truncated on startup
    File(PathBuf),
}

/// Configuration for tracing initialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Log level for the droidmon crates
    pub level: TracingLevel,
    /// Output destination
    pub output: TracingOutput,
    /// Whether to include thread ids in every line
    pub thread_ids: bool,
    /// Whether to include the event target
    pub targets: bool,
    /// Custom `EnvFilter` directives (overrides `level` if set)
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: TracingLevel::Info,
            output: TracingOutput::Stderr,
            thread_ids: cfg!(debug_assertions),
            targets: true,
            filter: None,
        }
    }
}

impl TracingConfig {
    /// Creates a new tracing configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output destination
    #[must_use]
    pub fn with_output(mut self, output: TracingOutput) -> Self {
        self.output = output;
        self
    }

    /// Enables or disables thread ids
    #[must_use]
    pub const fn with_thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Enables or disables event targets
    #[must_use]
    pub const fn with_targets(mut self, enabled: bool) -> Self {
        self.targets = enabled;
        self
    }

    /// Sets custom filter directives
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Debug level on stderr with thread ids
    #[must_use]
    pub const fn development() -> Self {
        Self {
            level: TracingLevel::Debug,
            output: TracingOutput::Stderr,
            thread_ids: true,
            targets: true,
            filter: None,
        }
    }

    /// Warn level on stderr, quiet enough for interactive CLI use
    #[must_use]
    pub const fn production() -> Self {
        Self {
            level: TracingLevel::Warn,
            output: TracingOutput::Stderr,
            thread_ids: false,
            targets: false,
            filter: None,
        }
    }

    /// Filter directives this configuration installs
    #[must_use]
    pub fn filter_directives(&self) -> String {
        if let Some(custom) = &self.filter {
            return custom.clone();
        }
        DEFAULT_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Installs the global subscriber described by `config`
///
/// Call once at startup; later calls fail with
/// [`TracingError::AlreadyInitialized`].
///
/// # Errors
///
/// Returns an error if tracing was already initialized, the filter does not
/// parse, the log file cannot be created, or the subscriber fails to install.
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let result = install_subscriber(config);
    if result.is_err() {
        TRACING_INITIALIZED.store(false, Ordering::SeqCst);
        return result;
    }
    let _ = TRACING_CONFIG.set(config.clone());

    tracing::debug!(
        level = %config.level,
        filter = %config.filter_directives(),
        "Tracing initialized"
    );
    Ok(())
}

fn install_subscriber(config: &TracingConfig) -> TracingResult<()> {
    let filter = EnvFilter::try_new(config.filter_directives())
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    let (writer, ansi) = match &config.output {
        TracingOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        TracingOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        TracingOutput::File(path) => {
            let file =
                std::fs::File::create(path).map_err(|e| TracingError::FileCreationFailed {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            (BoxMakeWriter::new(file), false)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(config.targets)
                .with_level(true)
                .with_thread_ids(config.thread_ids)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))
}

/// Checks if tracing has been initialized
#[must_use]
pub fn is_tracing_initialized() -> bool {
    TRACING_INITIALIZED.load(Ordering::SeqCst)
}

/// The configuration passed to the successful [`init_tracing`] call
#[must_use]
pub fn get_tracing_config() -> Option<&'static TracingConfig> {
    TRACING_CONFIG.get()
}

/// Creates an info-level span with standard fields
///
/// ```ignore
/// use droidmon_core::trace_operation;
///
/// let span = trace_operation!("batch.execute", batch = %batch.name());
/// ```
#[macro_export]
macro_rules! trace_operation {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Like `trace_operation!` but at debug level, for per-command spans
#[macro_export]
macro_rules! trace_operation_debug {
    ($name:expr) => {
        tracing::debug_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::debug_span!($name, $($field)*)
    };
}

/// Standard span names
pub mod span_names {
    /// Spawning the persistent shell
    pub const SESSION_OPEN: &str = "session.open";
    /// One command through the persistent shell
    pub const SESSION_RUN: &str = "session.run";
    /// Closing the persistent shell
    pub const SESSION_CLOSE: &str = "session.close";
    /// One batched round trip
    pub const BATCH_EXECUTE: &str = "batch.execute";
    /// One poll-loop iteration
    pub const COLLECTOR_TICK: &str = "collector.tick";
    /// Process snapshot reconciliation
    pub const PROCESS_RECONCILE: &str = "process.reconcile";
    /// A user-initiated action (connect, install, ...)
    pub const ACTION_EXECUTE: &str = "action.execute";
    /// Configuration load
    pub const CONFIG_LOAD: &str = "config.load";
}
