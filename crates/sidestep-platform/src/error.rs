//! Error types for the diversion layer

use thiserror::Error;

/// Errors raised by capture drivers
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The diversion handle could not be opened.
    ///
    /// Fatal for the daemon that wanted it; other daemons keep running.
    #[error("failed to open divert handle for '{filter}': {message}")]
    DivertOpenFailed {
        /// Filter the open was attempted with
        filter: String,
        /// Driver-reported reason
        message: String,
    },

    /// A receive on an open handle failed
    #[error("packet capture failed: {0}")]
    CaptureFailed(String),

    /// An injection on an open handle failed
    #[error("packet injection failed: {0}")]
    InjectFailed(String),

    /// The filter expression was rejected
    #[error("invalid filter expression: {0}")]
    InvalidFilter(String),

    /// No capture driver exists on this platform
    #[error("packet diversion is not supported on this platform")]
    Unsupported,
}

/// Result type alias using PlatformError
pub type Result<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    /// Create a DivertOpenFailed error
    pub fn open_failed(filter: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DivertOpenFailed {
            filter: filter.into(),
            message: message.into(),
        }
    }
}
