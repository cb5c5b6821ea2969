//! Error types for `rfbview`
//!
//! Each concern gets its own `thiserror` enum. Faults raised on the network
//! thread never reach the UI as errors; they are logged and surface only as
//! a connection-state change.

use thiserror::Error;

/// Errors raised by session operations that the UI can act on
#[derive(Debug, Error)]
pub enum SessionError {
    /// A worker thread could not be started
    #[error("Failed to spawn {name} thread: {reason}")]
    ThreadSpawn {
        /// Thread name
        name: &'static str,
        /// OS error description
        reason: String,
    },

    /// The outbound queue has been shut down
    #[error("Message queue is closed")]
    ChannelClosed,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
