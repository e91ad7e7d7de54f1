//! # Configuration Management
//!
//! Centralized configuration for the keep service.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides (`KEEP_*`)
//!
//! ## Security Considerations
//! - The packet size ceiling (64 KiB default) is enforced before full
//!   buffering, bounding memory per connection
//! - The read timeout and idle grace bound how long a slow or silent
//!   sender can hold a session task

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::Level;

use crate::error::{ProtocolError, Result};
use crate::utils::timeout;

/// Default listen port of the exercised deployment.
pub const DEFAULT_PORT: u16 = 9009;

/// Default ceiling on one inbound packet (64 KiB).
pub const DEFAULT_MAX_PACKET_BYTES: usize = 64 * 1024;

/// Main configuration structure containing all configurable settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct KeepConfig {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-session resource ceilings
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl KeepConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables over the defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("KEEP_ADDRESS") {
            config.server.address = addr;
        }
        if let Ok(max) = std::env::var("KEEP_MAX_CONNECTIONS") {
            if let Ok(val) = max.parse::<usize>() {
                config.server.max_connections = val;
            }
        }
        if let Ok(bytes) = std::env::var("KEEP_MAX_PACKET_BYTES") {
            if let Ok(val) = bytes.parse::<usize>() {
                config.limits.max_packet_bytes = val;
            }
        }
        if let Ok(ms) = std::env::var("KEEP_READ_TIMEOUT_MS") {
            if let Ok(val) = ms.parse::<u64>() {
                config.limits.read_timeout = Duration::from_millis(val);
            }
        }

        Ok(config)
    }

    /// Generate example configuration file content.
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common misconfigurations.
    ///
    /// Returns a list of findings; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.limits.validate());
        errors
    }

    /// Validate and return Result - convenience method.
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

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:9009")
    pub address: String,

    /// Maximum number of concurrent sessions
    pub max_connections: usize,

    /// Timeout for graceful shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("0.0.0.0:{DEFAULT_PORT}"),
            max_connections: 1024,
            shutdown_timeout: timeout::DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:9009')",
                self.address
            ));
        }

        if self.max_connections == 0 {
            errors.push("Max connections must be greater than 0".to_string());
        }

        if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        errors
    }
}

/// Per-session resource ceilings. Exceeding any of them is treated like
/// a verification failure: silent close, no reply.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Maximum inbound bytes buffered for one packet
    pub max_packet_bytes: usize,

    /// Hard ceiling on the whole inbound read
    #[serde(with = "duration_serde")]
    pub read_timeout: Duration,

    /// Idle gap after the first bytes that ends the message
    #[serde(with = "duration_serde")]
    pub read_idle_grace: Duration,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_packet_bytes: DEFAULT_MAX_PACKET_BYTES,
            read_timeout: timeout::DEFAULT_READ_TIMEOUT,
            read_idle_grace: timeout::DEFAULT_READ_IDLE_GRACE,
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_packet_bytes == 0 {
            errors.push("Max packet size cannot be 0".to_string());
        } else if self.max_packet_bytes > 16 * 1024 * 1024 {
            errors.push(format!(
                "Max packet size too large: {} bytes (maximum: 16 MB)",
                self.max_packet_bytes
            ));
        }

        if self.read_timeout.as_millis() < 100 {
            errors.push("Read timeout too short (minimum: 100ms)".to_string());
        } else if self.read_timeout.as_secs() > 300 {
            errors.push("Read timeout too long (maximum: 300s)".to_string());
        }

        if self.read_idle_grace >= self.read_timeout {
            errors.push("Idle grace must be shorter than the read timeout".to_string());
        }

        errors
    }
}

/// Logging configuration.
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
            app_name: String::from("keep"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

/// Helper module for Duration serialization/deserialization (millis).
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization.
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
