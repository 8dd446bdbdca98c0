//! Error types for session cache operations.

use std::time::Duration;

/// Result type alias for cache operations.
pub type CacheResult<T, E = CacheError> = Result<T, E>;

/// Errors that can occur while talking to the session cache.
#[derive(Debug, thiserror::Error)]
#[must_use = "cache errors should be handled appropriately"]
pub enum CacheError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to establish a connection to the cache server.
    #[error("Cache connection error: {0}")]
    Connection(#[source] redis::RedisError),

    /// Cache operation did not complete within the configured timeout.
    #[error("Cache operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// Timeout that was exceeded.
        timeout: Duration,
    },

    /// The requested key is absent or expired.
    #[error("Cache key not found")]
    KeyNotFound,

    /// Cache command failed.
    #[error("Cache command error: {0}")]
    Command(#[from] redis::RedisError),
}

impl CacheError {
    /// Returns whether the error means the key does not exist.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound)
    }

    /// Returns whether this error indicates a transient failure that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Connection(err) | Self::Command(err) => {
                err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal()
            }
            _ => false,
        }
    }
}
