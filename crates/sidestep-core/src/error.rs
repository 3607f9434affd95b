//! Error types for sidestep-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Main error type for core operations
#[derive(Error, Debug)]
pub enum Error {
    /// DNS question section could not be parsed
    #[error("malformed DNS query at offset {offset}")]
    MalformedQuery {
        /// Offset in the DNS message where parsing failed
        offset: usize,
    },

    /// DNS answer section could not be parsed
    #[error("malformed DNS answer record at offset {offset}")]
    MalformedAnswer {
        /// Offset in the answer section where parsing failed
        offset: usize,
    },

    /// Packet is too small to carry the expected headers
    #[error("packet too small: expected at least {expected} bytes, got {actual}")]
    TruncatedPacket {
        /// Minimum expected size
        expected: usize,
        /// Actual packet size
        actual: usize,
    },

    /// Packet headers are structurally invalid
    #[error("packet parse error: {0}")]
    MalformedPacket(String),

    /// Configuration file is unusable as a whole
    #[error("configuration error: {0}")]
    ConfigInvalid(String),

    /// A single configuration value failed validation
    #[error("invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// What was wrong with it
        message: String,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a packet parse error
    pub fn malformed_packet(message: impl Into<String>) -> Self {
        Self::MalformedPacket(message.into())
    }

    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }
}
