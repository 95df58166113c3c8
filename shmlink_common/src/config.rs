//! Configuration loading traits and types.
//!
//! Both binaries accept an optional TOML file. Every field has a default
//! matching the fixed protocol values, so running without a file is the
//! normal case.
//!
//! # Usage
//!
//! ```rust,no_run
//! use shmlink_common::config::{ConfigLoader, LinkConfig, ConfigError};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = LinkConfig::load(Path::new("shmlink.toml"))?;
//!     config.validate()?;
//!     println!("Base key: {:#x}", config.channel.base_key);
//!     Ok(())
//! }
//! ```

use crate::consts::{DEFAULT_BASE_KEY, DEFAULT_WAIT_TIMEOUT_SECS, MAX_WAIT_TIMEOUT_SECS};
use crate::keys::ChannelKeys;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Common fields shared by both binaries.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "shmlink-receiver"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance name used in log lines. Empty means the binary name.
    #[serde(default)]
    pub service_name: String,
}

/// Channel identity and timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    /// Base System V key; all objects sit at fixed offsets around it.
    #[serde(default = "default_base_key")]
    pub base_key: i32,

    /// Ceiling for every blocking semaphore operation, in seconds.
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,

    /// Sub-second override for the ceiling, in milliseconds. Takes
    /// precedence over `wait_timeout_secs` when set.
    #[serde(default)]
    pub wait_timeout_ms: Option<u64>,
}

fn default_base_key() -> i32 {
    DEFAULT_BASE_KEY
}

fn default_wait_timeout_secs() -> u64 {
    DEFAULT_WAIT_TIMEOUT_SECS
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            base_key: DEFAULT_BASE_KEY,
            wait_timeout_secs: DEFAULT_WAIT_TIMEOUT_SECS,
            wait_timeout_ms: None,
        }
    }
}

impl ChannelConfig {
    /// Config for `base_key` with a millisecond ceiling.
    pub fn with_timeout(base_key: i32, timeout: Duration) -> Self {
        Self {
            base_key,
            wait_timeout_secs: timeout.as_secs(),
            wait_timeout_ms: Some(timeout.as_millis() as u64),
        }
    }

    /// Effective ceiling for blocking waits.
    pub fn wait_timeout(&self) -> Duration {
        match self.wait_timeout_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(self.wait_timeout_secs),
        }
    }

    /// Key set derived from `base_key`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the key range touches
    /// `IPC_PRIVATE` or overflows.
    pub fn keys(&self) -> Result<ChannelKeys, ConfigError> {
        ChannelKeys::new(self.base_key).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "base_key {:#x} produces an invalid key range",
                self.base_key
            ))
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - the wait timeout is zero
    /// - the wait timeout exceeds `MAX_WAIT_TIMEOUT_SECS`
    /// - the key range is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.wait_timeout();
        if timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "wait timeout cannot be zero".to_string(),
            ));
        }
        if timeout > Duration::from_secs(MAX_WAIT_TIMEOUT_SECS) {
            return Err(ConfigError::ValidationError(format!(
                "wait timeout {timeout:?} exceeds the {MAX_WAIT_TIMEOUT_SECS} s maximum"
            )));
        }
        self.keys().map(|_| ())
    }
}

/// Top-level configuration file.
///
/// ```toml
/// [shared]
/// log_level = "info"
///
/// [channel]
/// base_key = 3565
/// wait_timeout_secs = 60
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkConfig {
    /// Logging and naming.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Channel keys and timeout.
    #[serde(default)]
    pub channel: ChannelConfig,
}

impl LinkConfig {
    /// Load `path` if given, defaults otherwise, then validate.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.channel.validate()
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_to_tracing() {
        assert_eq!(tracing::Level::from(LogLevel::Trace), tracing::Level::TRACE);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"debug\"")
                .unwrap()
                .level,
            LogLevel::Debug
        );
        assert_eq!(
            toml::from_str::<TestWrapper>("level = \"error\"")
                .unwrap()
                .level,
            LogLevel::Error
        );
    }

    #[test]
    fn test_channel_defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.base_key, 0xDED);
        assert_eq!(config.wait_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_millisecond_override_wins() {
        let config = ChannelConfig::with_timeout(0x5000, Duration::from_millis(250));
        assert_eq!(config.wait_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ChannelConfig {
            wait_timeout_secs: 0,
            ..ChannelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_huge_timeout_rejected() {
        let config: ChannelConfig =
            toml::from_str("wait_timeout_secs = 18446744073709551615").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let config = ChannelConfig {
            wait_timeout_ms: Some(u64::MAX),
            ..ChannelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_maximum_timeout_accepted() {
        let config = ChannelConfig {
            wait_timeout_secs: MAX_WAIT_TIMEOUT_SECS,
            ..ChannelConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_base_key_rejected() {
        let config = ChannelConfig {
            base_key: 1,
            ..ChannelConfig::default()
        };
        assert!(matches!(config.keys(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_empty_document_is_all_defaults() {
        let config: LinkConfig = toml::from_str("").unwrap();
        assert_eq!(config.channel, ChannelConfig::default());
        assert_eq!(config.shared.log_level, LogLevel::Info);
        assert!(config.shared.service_name.is_empty());
    }
}
