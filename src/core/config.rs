//! Configuration management for lineflux.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - CLI argument overrides
//! - Validation and defaults

use crate::core::{LineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration for lineflux
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Point pool configuration
    pub pool: PoolConfig,
    /// Encoder buffer configuration
    pub encoder: EncoderConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Point pool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Points allocated up front when the pool is built
    pub size: usize,
    /// Upper bound the pool may grow to under load
    pub max_size: usize,
    /// How long `acquire` waits for a released point once growth is exhausted
    #[serde(with = "humantime_serde")]
    pub acquire_timeout: Duration,
    /// What to do when no point is free and the pool is at `max_size`
    pub exhaustion: ExhaustionPolicy,
}

/// Encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Initial capacity in bytes of each of a point's two segment buffers
    pub initial_buffer_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Behaviour of `acquire` when the pool has nothing free
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhaustionPolicy {
    /// Block until a point is released or the acquire timeout expires
    Wait,
    /// Fail immediately
    Fail,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            size: 64,
            max_size: 1024,
            acquire_timeout: Duration::from_millis(100),
            exhaustion: ExhaustionPolicy::Wait,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            initial_buffer_size: 128,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.pool.validate()?;

        if self.encoder.initial_buffer_size == 0 {
            return Err(LineError::config("initial_buffer_size must be greater than 0"));
        }

        Ok(())
    }
}

impl PoolConfig {
    /// Validate pool sizing
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(LineError::config("max_size must be greater than 0"));
        }

        if self.size > self.max_size {
            return Err(LineError::config(format!(
                "pool size {} exceeds max_size {}",
                self.size, self.max_size
            )));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| LineError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Load configuration from a YAML file
    pub fn from_file(self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LineError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        self.from_yaml(&content)
    }

    /// Set the number of pre-allocated points, raising `max_size` to match
    pub fn pool_size(mut self, size: usize) -> Self {
        self.config.pool.size = size;
        if self.config.pool.max_size < size {
            self.config.pool.max_size = size;
        }
        self
    }

    /// Set the pool growth ceiling
    pub fn max_pool_size(mut self, max_size: usize) -> Self {
        self.config.pool.max_size = max_size;
        self
    }

    /// Set the acquire timeout
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool.acquire_timeout = timeout;
        self
    }

    /// Set the exhaustion policy
    pub fn exhaustion(mut self, policy: ExhaustionPolicy) -> Self {
        self.config.pool.exhaustion = policy;
        self
    }

    /// Set the initial segment buffer size
    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.config.encoder.initial_buffer_size = size;
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.encoder.initial_buffer_size, 128);
        assert_eq!(config.pool.exhaustion, ExhaustionPolicy::Wait);
    }

    #[test]
    fn test_size_above_max_rejected() {
        let mut config = Config::default();
        config.pool.size = 10;
        config.pool.max_size = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let result = ConfigBuilder::new().pool_size(0).max_pool_size(0).build();
        assert!(matches!(result, Err(LineError::Config(_))));
    }

    #[test]
    fn test_zero_buffer_size_rejected() {
        let result = ConfigBuilder::new().initial_buffer_size(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .pool_size(4)
            .max_pool_size(8)
            .acquire_timeout(Duration::from_millis(5))
            .exhaustion(ExhaustionPolicy::Fail)
            .initial_buffer_size(16)
            .log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.pool.size, 4);
        assert_eq!(config.pool.max_size, 8);
        assert_eq!(config.pool.acquire_timeout, Duration::from_millis(5));
        assert_eq!(config.pool.exhaustion, ExhaustionPolicy::Fail);
        assert_eq!(config.encoder.initial_buffer_size, 16);
        assert_eq!(config.logging.level.as_str(), "debug");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
pool:
  size: 2
  max_size: 4
  acquire_timeout: 250ms
  exhaustion: fail
encoder:
  initial_buffer_size: 256
logging:
  level: warn
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

        assert_eq!(config.pool.size, 2);
        assert_eq!(config.pool.max_size, 4);
        assert_eq!(config.pool.acquire_timeout, Duration::from_millis(250));
        assert_eq!(config.pool.exhaustion, ExhaustionPolicy::Fail);
        assert_eq!(config.encoder.initial_buffer_size, 256);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_very_long_acquire_timeout_accepted() {
        let config = ConfigBuilder::new()
            .from_yaml("pool:\n  acquire_timeout: 500000000years\n")
            .unwrap()
            .build()
            .unwrap();
        assert!(config.pool.acquire_timeout > Duration::from_secs(u64::from(u32::MAX)));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ConfigBuilder::new()
            .from_yaml("pool:\n  size: 3\n")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.pool.size, 3);
        assert_eq!(config.pool.max_size, 1024);
        assert_eq!(config.encoder.initial_buffer_size, 128);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "pool:\n  max_size: 7").unwrap();

        let config = ConfigBuilder::new()
            .from_file(file.path())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.pool.max_size, 7);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ConfigBuilder::new().from_file(Path::new("/nonexistent/lineflux.yaml"));
        assert!(matches!(result, Err(LineError::Config(_))));
    }
}
