//! TOML-based application configuration.
//!
//! Stores user preferences for notifications and the due-reminder poller.
//! Configuration is stored at `~/.config/medminder/config.toml`.

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Due-reminder poller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between due-reminder checks. One minute keeps the
    /// fire-once-per-minute guarantee of the minute-string match.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/medminder/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub poller: PollerConfig,
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    60
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notifications: NotificationsConfig::default(),
            poller: PollerConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration, falling back to defaults when the file is
    /// missing.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let path = match data_dir() {
            Ok(dir) => dir.join("config.toml"),
            Err(e) => {
                return Err(ConfigError::LoadFailed {
                    path: "config.toml".into(),
                    message: e.to_string(),
                })
            }
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Save the configuration to `config.toml`.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = match data_dir() {
            Ok(dir) => dir.join("config.toml"),
            Err(e) => {
                return Err(ConfigError::SaveFailed {
                    path: "config.toml".into(),
                    message: e.to_string(),
                })
            }
        };

        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, raw).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}
