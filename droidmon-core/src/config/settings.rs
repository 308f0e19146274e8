//! Settings types stored in `config.toml`

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::tracing::{TracingConfig, TracingLevel, TracingOutput};

/// Fastest allowed polling interval
pub const MIN_INTERVAL_SECS: u8 = 1;
/// Slowest allowed polling interval
pub const MAX_INTERVAL_SECS: u8 = 30;

/// Top-level settings (`config.toml`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppSettings {
    /// How to reach the device
    #[serde(default)]
    pub adb: AdbSettings,
    /// Polling behaviour
    #[serde(default)]
    pub monitoring: MonitoringSettings,
    /// Log output
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Per-device polling overrides keyed by serial (`[devices.<serial>]`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub devices: BTreeMap<String, MonitoringConfig>,
}

impl AppSettings {
    /// Polling settings for `serial`, with its override applied if one exists
    #[must_use]
    pub fn monitoring_for(&self, serial: Option<&str>) -> MonitoringSettings {
        serial
            .and_then(|s| self.devices.get(s))
            .map_or_else(|| self.monitoring.clone(), |o| o.apply(&self.monitoring))
    }
}

/// Debug bridge settings (`[adb]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdbSettings {
    /// Path or name of the `adb` executable
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Device serial passed as `-s`; `None` lets adb pick the only device
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    /// Give up on a single shell command after this many seconds
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Treat output containing "error" or "failed" as failure for actions
    #[serde(default = "default_true")]
    pub strict_success: bool,
}

fn default_adb_path() -> String {
    "adb".to_string()
}

const fn default_command_timeout_secs() -> u64 {
    10
}

const fn default_true() -> bool {
    true
}

const fn default_interval_secs() -> u8 {
    2
}

impl Default for AdbSettings {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            command_timeout_secs: default_command_timeout_secs(),
            strict_success: true,
        }
    }
}

/// Global polling settings (`[monitoring]`)
#[allow(clippy::struct_excessive_bools)] // independent display toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    /// Whether polling runs at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Polling interval in seconds (1–30, default: 2)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u8,
    /// Also poll the process table
    #[serde(default = "default_true")]
    pub processes_enabled: bool,
    /// Show CPU figures
    #[serde(default = "default_true")]
    pub show_cpu: bool,
    /// Show memory figures
    #[serde(default = "default_true")]
    pub show_memory: bool,
    /// Show paging throughput
    #[serde(default = "default_true")]
    pub show_disk: bool,
    /// Show network throughput
    #[serde(default = "default_true")]
    pub show_network: bool,
    /// Show temperatures and fan state
    #[serde(default = "default_true")]
    pub show_thermal: bool,
}

impl Default for MonitoringSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_interval_secs(),
            processes_enabled: true,
            show_cpu: true,
            show_memory: true,
            show_disk: true,
            show_network: true,
            show_thermal: true,
        }
    }
}

impl MonitoringSettings {
    /// Returns the interval clamped to 1–30 seconds
    #[must_use]
    pub const fn effective_interval_secs(&self) -> u8 {
        if self.interval_secs < MIN_INTERVAL_SECS {
            MIN_INTERVAL_SECS
        } else if self.interval_secs > MAX_INTERVAL_SECS {
            MAX_INTERVAL_SECS
        } else {
            self.interval_secs
        }
    }
}

/// Per-device override; `None` fields fall back to [`MonitoringSettings`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Override the global enabled flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Override the polling interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u8>,
    /// Override whether the process table is polled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processes_enabled: Option<bool>,
}

impl MonitoringConfig {
    /// Whether polling is enabled for this device
    #[must_use]
    pub fn is_enabled(&self, global: &MonitoringSettings) -> bool {
        self.enabled.unwrap_or(global.enabled)
    }

    /// Polling interval for this device, clamped to 1–30 seconds
    #[must_use]
    pub fn effective_interval(&self, global: &MonitoringSettings) -> u8 {
        self.interval_secs
            .unwrap_or_else(|| global.effective_interval_secs())
            .clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS)
    }

    /// Global settings with this override applied
    #[must_use]
    pub fn apply(&self, global: &MonitoringSettings) -> MonitoringSettings {
        MonitoringSettings {
            enabled: self.is_enabled(global),
            interval_secs: self.effective_interval(global),
            processes_enabled: self.processes_enabled.unwrap_or(global.processes_enabled),
            ..global.clone()
        }
    }
}

/// Log settings (`[logging]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Base level before `-v` flags
    #[serde(default = "default_log_level")]
    pub level: TracingLevel,
    /// Write logs to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Raw `EnvFilter` directives, overriding `level`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

const fn default_log_level() -> TracingLevel {
    TracingLevel::Warn
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            filter: None,
        }
    }
}

impl LoggingSettings {
    /// Builds a [`TracingConfig`], raising the level by `verbosity` steps
    #[must_use]
    pub fn tracing_config(&self, verbosity: u8) -> TracingConfig {
        let mut config = TracingConfig::production().with_level(self.level.raised_by(verbosity));
        if let Some(path) = &self.file {
            config = config.with_output(TracingOutput::File(path.clone()));
        }
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter.clone());
        }
        config
    }
}
