//! Bot settings loaded from TOML and the environment.
//!
//! The token and prefix are consumed by the chat framework; this crate only
//! loads them alongside its own logging settings.

use std::fmt;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::logging::{LogLevel, LoggingConfig};

/// Errors that can occur when loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),
}

/// Logging section of the settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogSettings {
    #[serde(default)]
    pub level: LogLevel,
    /// `tracing` target of the chat framework
    #[serde(default = "default_framework_target")]
    pub framework_target: String,
    #[serde(default)]
    pub framework_level: LogLevel,
    #[serde(default = "default_true")]
    pub timestamps: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            framework_target: default_framework_target(),
            framework_level: LogLevel::Info,
            timestamps: true,
        }
    }
}

fn default_framework_target() -> String {
    "serenity".to_string()
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_true() -> bool {
    true
}

/// Root settings structure.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Bot token handed to the framework
    #[serde(default)]
    pub token: Option<String>,
    /// Command prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: None,
            prefix: default_prefix(),
            log: LogSettings::default(),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("prefix", &self.prefix)
            .field("log", &self.log)
            .finish()
    }
}

impl Settings {
    /// Load settings from a TOML file, with `IAM_` environment overrides.
    ///
    /// Nested keys use a double underscore, e.g. `IAM_LOG__LEVEL=debug`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(env_source())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load settings from the environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config::builder().add_source(env_source()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Logging configuration for [`crate::logging::init_logging`].
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new()
            .with_level(self.log.level)
            .with_framework(self.log.framework_target.clone(), self.log.framework_level)
            .with_timestamps(self.log.timestamps)
    }

    /// Human-readable summary with the token redacted.
    pub fn summary(&self) -> String {
        let token = if self.token.is_some() { "set" } else { "missing" };
        format!(
            "token: {}\nprefix: {}\nlog level: {}\nframework: {} ({})",
            token,
            self.prefix,
            self.log.level.as_directive(),
            self.log.framework_target,
            self.log.framework_level.as_directive()
        )
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("IAM")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
