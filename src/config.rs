//! # Configuration Management
//!
//! Centralized configuration for the packet envelope.
//!
//! This module provides structured configuration for the packet pool, the
//! standard crypto table and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Security Considerations
//! - `max_frame_size` bounds every length prefix before any allocation on parse
//! - Padding hides exact game payload lengths at block granularity

use crate::error::{ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::Level;

/// Max allowed frame body size (64 KB)
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Default game plaintext padding block
pub const PADDING_BLOCK: usize = 16;

/// Default reserved capacity of a freshly allocated packet buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EnvelopeConfig {
    /// Packet pool configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Standard crypto table configuration
    #[serde(default)]
    pub crypto: CryptoConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EnvelopeConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(prewarm) = std::env::var("GAME_ENVELOPE_POOL_PREWARM") {
            if let Ok(val) = prewarm.parse::<usize>() {
                config.pool.prewarm = val;
            }
        }

        if let Ok(capacity) = std::env::var("GAME_ENVELOPE_BUFFER_CAPACITY") {
            if let Ok(val) = capacity.parse::<usize>() {
                config.pool.buffer_capacity = val;
            }
        }

        if let Ok(size) = std::env::var("GAME_ENVELOPE_MAX_FRAME_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.crypto.max_frame_size = val;
            }
        }

        if let Ok(level) = std::env::var("GAME_ENVELOPE_LOG_LEVEL") {
            config.logging.log_level = level.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid log level: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.pool.validate());
        errors.extend(self.crypto.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Packet pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Packets allocated up front when the factory is built
    pub prewarm: usize,

    /// Capacity reserved in each newly allocated packet buffer
    pub buffer_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            prewarm: 32,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.prewarm > 100_000 {
            errors.push(format!(
                "Pool prewarm too large: {} (max recommended: 100,000)",
                self.prewarm
            ));
        }

        if self.buffer_capacity > MAX_FRAME_SIZE * 4 {
            errors.push(format!(
                "Buffer capacity too large: {} bytes (maximum: {} bytes)",
                self.buffer_capacity,
                MAX_FRAME_SIZE * 4
            ));
        }

        errors
    }
}

/// Configuration for the standard crypto table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CryptoConfig {
    /// Maximum frame body accepted on parse or produced on finish
    pub max_frame_size: usize,

    /// Game plaintext is zero-padded to a multiple of this (0 or 1 disables)
    pub padding_block: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            max_frame_size: MAX_FRAME_SIZE,
            padding_block: PADDING_BLOCK,
        }
    }
}

impl CryptoConfig {
    /// Validate crypto configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_frame_size < 64 {
            errors.push("Max frame size too small (minimum: 64 bytes)".to_string());
        } else if self.max_frame_size > u32::MAX as usize {
            errors.push(format!(
                "Max frame size too large: {} bytes (must fit a 32-bit length prefix)",
                self.max_frame_size
            ));
        }

        if self.padding_block > 1024 {
            errors.push(format!(
                "Padding block too large: {} (maximum: 1024)",
                self.padding_block
            ));
        } else if self.padding_block >= self.max_frame_size {
            errors.push("Padding block cannot exceed max frame size".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("game-envelope"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
