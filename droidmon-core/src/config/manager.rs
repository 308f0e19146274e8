//! Locating and loading `config.toml`
//!
//! The directory is `$DROIDMON_CONFIG_DIR` when set, else `droidmon` under
//! the platform config directory. A missing file means default settings.

use std::path::{Path, PathBuf};

use super::settings::AppSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::tracing::span_names;

/// Overrides the configuration directory
pub const CONFIG_DIR_ENV: &str = "DROIDMON_CONFIG_DIR";

/// Settings file name inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Locates and reads `config.toml`
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Resolves `$DROIDMON_CONFIG_DIR`, else `<config dir>/droidmon`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if neither is available.
    pub fn new() -> ConfigResult<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_config_dir(PathBuf::from(dir)));
        }
        let dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("droidmon");
        Ok(Self::with_config_dir(dir))
    }

    /// Uses an explicit directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// The configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Full path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads settings; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file exists but cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid settings TOML.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        let _span = tracing::debug_span!(span_names::CONFIG_LOAD, path = %path.display()).entered();

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file, using defaults");
                return Ok(AppSettings::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })
    }

    /// Writes settings, creating the directory if needed
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] or [`ConfigError::Io`].
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<PathBuf> {
        let text =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::create_dir_all(&self.config_dir).map_err(|source| ConfigError::Io {
            path: self.config_dir.clone(),
            source,
        })?;

        let path = self.settings_path();
        std::fs::write(&path, text).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Settings written");
        Ok(path)
    }
}
