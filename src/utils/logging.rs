//! Structured logging setup.
//!
//! Thin wrapper over `tracing-subscriber`, driven by
//! [`LoggingConfig`](crate::config::LoggingConfig). Drop reasons are
//! logged here and nowhere else; nothing in this module may write to a
//! client connection.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};

/// Initialize the global subscriber from config.
///
/// `RUST_LOG` wins over the configured level when set, which keeps ad
/// hoc debugging possible without touching config files.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string().to_lowercase()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| ProtocolError::ConfigError(format!("Failed to init logging: {e}")))
}
