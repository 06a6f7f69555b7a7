//! Application settings loading and validation.
//!
//! Settings come from a TOML file (`stackwatch.toml` by default). Backend
//! connection parameters do not live here; they are per-family documents in
//! [`Settings::config_dir`], handled by [`ConfigStore`](super::store::ConfigStore).
//!
//! # Example
//!
//! ```no_run
//! use stackwatch::infrastructure::config::settings::Settings;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::load("stackwatch.toml")?;
//!     settings.init_logging();
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Polling and delivery timing (`[monitoring]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Deadline for each individual backend call.
    pub request_timeout_ms: u64,
    /// Period of the realtime broadcast tick.
    pub broadcast_interval_secs: u64,
    /// Deadline for one push to one subscriber.
    pub delivery_timeout_ms: u64,
    /// Period of the config file watcher.
    pub watch_interval_secs: u64,
}

impl MonitoringConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_secs(self.broadcast_interval_secs)
    }

    #[must_use]
    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    #[must_use]
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 3000,
            broadcast_interval_secs: 5,
            delivery_timeout_ms: 2000,
            watch_interval_secs: 2,
        }
    }
}

/// Realtime push endpoint (`[server]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8085".into(),
        }
    }
}

impl ServerConfig {
    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if `listen` is not a socket address.
    pub fn addr(&self) -> std::result::Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|_| ConfigError::InvalidValue {
            field: "listen",
            reason: format!("'{}' is not a socket address", self.listen),
        })
    }
}

/// Main application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub monitoring: MonitoringConfig,

    #[serde(default)]
    pub server: ServerConfig,

    /// Directory holding `redis.toml`, `kafka.toml`, `postgresql.toml`, `mysql.toml`.
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("./configs")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            monitoring: MonitoringConfig::default(),
            server: ServerConfig::default(),
            config_dir: default_config_dir(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or fails
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load settings from `path` if it exists, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is unreadable or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let timing = &self.monitoring;
        if timing.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if timing.broadcast_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "broadcast_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if timing.delivery_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "delivery_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if timing.watch_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "watch_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        self.server.addr()?;
        if self.config_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "config_dir",
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let settings = Settings::parse_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.monitoring.request_timeout(), Duration::from_secs(3));
        assert_eq!(settings.monitoring.broadcast_interval(), Duration::from_secs(5));
    }

    #[test]
    fn parses_all_sections() {
        let settings = Settings::parse_toml(
            r#"
            config_dir = "/etc/stackwatch"

            [logging]
            level = "debug"
            format = "json"

            [monitoring]
            request_timeout_ms = 1500
            broadcast_interval_secs = 10

            [server]
            listen = "0.0.0.0:9000"
            "#,
        )
        .unwrap();
        assert_eq!(settings.config_dir, PathBuf::from("/etc/stackwatch"));
        assert_eq!(settings.monitoring.request_timeout_ms, 1500);
        assert_eq!(settings.monitoring.delivery_timeout_ms, 2000);
        assert_eq!(settings.server.listen, "0.0.0.0:9000");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Settings::parse_toml("[monitoring]\nrequest_timeout_ms = 0").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                ..
            })
        ));
    }

    #[test]
    fn bad_listen_address_is_rejected() {
        let err = Settings::parse_toml("[server]\nlisten = \"nowhere\"").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { field: "listen", .. })
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = Settings::load_or_default("/definitely/not/here.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }
}
