//! Configuration for droidmon
//!
//! Settings live in `config.toml` under the directory resolved by
//! [`ConfigManager`]. Every field has a default, so a missing or partial
//! file is valid.

mod manager;
pub mod settings;

pub use manager::{CONFIG_DIR_ENV, CONFIG_FILE_NAME, ConfigManager};
pub use settings::{AdbSettings, AppSettings, LoggingSettings, MonitoringConfig, MonitoringSettings};
