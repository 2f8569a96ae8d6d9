pub mod env;
mod validation;

use crate::sender::{ChannelConfig, Credentials};
use clap::ValueEnum;
use env::{load_env_flag, load_env_string, load_env_var};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const MAX_BATCH_SIZE: usize = 200;
pub const DEFAULT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_CACHE_CAPACITY: usize = 50;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 30_000;

/// Prefix of every environment variable read by [`ShipperConfig::from_env`].
pub const ENV_PREFIX: &str = "SHIPPER_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Server URL must not be empty")]
    EmptyServerUrl,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Environment error: {0}")]
    EnvError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidConfig(format!("Invalid log level: {value}"))),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Everything needed to build a batch engine.
///
/// Zero values fall back to defaults when resolved, so a partially filled
/// file or environment behaves like the corresponding constructor defaults.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipperConfig {
    /// Collector base URL; `/logagent` is appended when missing.
    pub server_url: String,
    pub project: String,
    pub user: String,
    pub secret: String,
    /// Records per batch, clamped to `1..=200` (0 means default).
    pub batch_size: usize,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    pub compress: bool,
    pub auto_flush: bool,
    /// Auto-flush period in seconds.
    pub interval_secs: u64,
    pub cache_capacity: usize,
    /// Whether `close` waits for uploads already in flight.
    pub await_uploads_on_close: bool,
    pub shutdown_timeout_ms: u64,
    pub log_level: LogLevel,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            project: String::new(),
            user: String::new(),
            secret: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            compress: true,
            auto_flush: false,
            interval_secs: DEFAULT_INTERVAL_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            await_uploads_on_close: true,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            log_level: LogLevel::Info,
        }
    }
}

impl fmt::Debug for ShipperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShipperConfig")
            .field("server_url", &self.server_url)
            .field("project", &self.project)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .field("timeout_ms", &self.timeout_ms)
            .field("compress", &self.compress)
            .field("auto_flush", &self.auto_flush)
            .field("interval_secs", &self.interval_secs)
            .field("cache_capacity", &self.cache_capacity)
            .field("await_uploads_on_close", &self.await_uploads_on_close)
            .field("shutdown_timeout_ms", &self.shutdown_timeout_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ShipperConfig {
    pub fn new(
        server_url: impl Into<String>,
        project: impl Into<String>,
        user: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            project: project.into(),
            user: user.into(),
            secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ShipperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reads `SHIPPER_*` variables over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields with any `SHIPPER_*` variables that are set.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        load_env_string(&env_name("SERVER_URL"), &mut self.server_url);
        load_env_string(&env_name("PROJECT"), &mut self.project);
        load_env_string(&env_name("USER"), &mut self.user);
        load_env_string(&env_name("SECRET"), &mut self.secret);
        load_env_var(&env_name("BATCH_SIZE"), &mut self.batch_size)?;
        load_env_var(&env_name("TIMEOUT_MS"), &mut self.timeout_ms)?;
        load_env_flag(&env_name("COMPRESS"), &mut self.compress)?;
        load_env_flag(&env_name("AUTO_FLUSH"), &mut self.auto_flush)?;
        load_env_var(&env_name("INTERVAL_SECS"), &mut self.interval_secs)?;
        load_env_var(&env_name("CACHE_CAPACITY"), &mut self.cache_capacity)?;
        load_env_flag(
            &env_name("AWAIT_UPLOADS_ON_CLOSE"),
            &mut self.await_uploads_on_close,
        )?;
        load_env_var(&env_name("SHUTDOWN_TIMEOUT_MS"), &mut self.shutdown_timeout_ms)?;
        load_env_var(&env_name("LOG_LEVEL"), &mut self.log_level)?;
        Ok(())
    }

    pub fn effective_batch_size(&self) -> usize {
        match self.batch_size {
            0 => DEFAULT_BATCH_SIZE,
            size if size > MAX_BATCH_SIZE => MAX_BATCH_SIZE,
            size => size,
        }
    }

    pub fn effective_cache_capacity(&self) -> usize {
        if self.cache_capacity == 0 {
            DEFAULT_CACHE_CAPACITY
        } else {
            self.cache_capacity
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(non_zero_or(self.timeout_ms, DEFAULT_TIMEOUT_MS))
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(non_zero_or(self.interval_secs, DEFAULT_INTERVAL_SECS))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(non_zero_or(
            self.shutdown_timeout_ms,
            DEFAULT_SHUTDOWN_TIMEOUT_MS,
        ))
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.project, &self.user, &self.secret)
    }

    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            endpoint: self.server_url.clone(),
            timeout: self.request_timeout(),
            ..ChannelConfig::default()
        }
    }
}

fn env_name(key: &str) -> String {
    format!("{ENV_PREFIX}{key}")
}

fn non_zero_or(value: u64, default: u64) -> u64 {
    if value == 0 { default } else { value }
}
