//! droidmon core library
//!
//! Android device telemetry over an `adb shell`: a persistent shell session
//! with a one-off fallback, command batching, parsers for kernel pseudo-files
//! and vendor dumps, a differencing engine, and a process table reconciler.
//!
//! # Crate Structure
//!
//! - [`adb`] - Persistent session, one-off runner, fallback policy
//! - [`batch`] - Merges queries into one round trip and splits the response
//! - [`parser`] - One parser per telemetry query
//! - [`metrics`] - Snapshot and derived-figure types
//! - [`diff`] - Rates and percentages from two snapshots
//! - [`process`] - Process snapshot, reconciler, tracker
//! - [`telemetry`] / [`collector`] - Polling a device, once or on a cadence
//! - [`actions`] / [`packages`] - User-initiated one-off operations
//! - [`config`] - Settings and the config file

#![warn(missing_docs)]

pub mod actions;
pub mod adb;
pub mod batch;
pub mod client;
pub mod collector;
pub mod config;
pub mod diff;
pub mod error;
pub mod metrics;
pub mod packages;
pub mod parser;
pub mod process;
pub mod queries;
pub mod telemetry;
pub mod tracing;

pub use actions::{ActionOutcome, ActionResult};
pub use adb::{
    CancellationToken, CommandOutput, OneOffRunner, OneOffShell, RemoteShellSession,
    SessionState, ShellLauncher, ShellTransport, run_with_fallback,
};
pub use batch::{CommandBatch, SectionMap};
pub use client::DeviceClient;
pub use collector::{CollectorHandle, MetricsComputer, MetricsEvent, start_collector};
pub use config::{AdbSettings, AppSettings, ConfigManager, MonitoringConfig, MonitoringSettings};
pub use error::{ActionError, BatchError, ConfigError, ShellError};
pub use metrics::{
    CpuBreakdown, CpuSnapshot, DeviceInfo, DiskRates, FanState, MemorySnapshot, NetworkRates,
    SystemMetrics, SystemSnapshot, ThermalSnapshot,
};
pub use process::{ProcessRow, ProcessSnapshot, ProcessTable, ProcessTracker};
pub use telemetry::Telemetry;
