//! Server error types.

use std::io;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Errors raised while starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Server configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to bind to the specified address.
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Runtime server error.
    #[error("Runtime error: {0}")]
    Runtime(#[source] io::Error),
}

impl ServerError {
    /// Creates an invalid configuration error from an anyhow error.
    pub fn invalid_config(err: &anyhow::Error) -> Self {
        Self::InvalidConfig(format!("{err:#}"))
    }

    /// Returns a unique error code for this error type.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "E001",
            Self::Bind { .. } => "E002",
            Self::Runtime(_) => "E003",
        }
    }

    /// Returns the underlying I/O error kind, if any.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::InvalidConfig(_) => None,
            Self::Bind { source, .. } => Some(source.kind()),
            Self::Runtime(err) => Some(err.kind()),
        }
    }

    /// Whether retrying (possibly after freeing the port) could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.io_kind(),
            Some(
                io::ErrorKind::AddrInUse
                    | io::ErrorKind::AddrNotAvailable
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::TimedOut
            )
        )
    }

    /// Provides a human-readable suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        if let Self::InvalidConfig(_) = self {
            return Some("Check the command-line arguments and environment variables");
        }

        match self.io_kind()? {
            io::ErrorKind::PermissionDenied => {
                Some("Try using a port above 1024 or run with appropriate privileges")
            }
            io::ErrorKind::AddrInUse => Some(
                "The port is already in use. Try a different port or stop the conflicting service",
            ),
            io::ErrorKind::AddrNotAvailable => {
                Some("The address is not available. Check network interface configuration")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind_error(kind: io::ErrorKind) -> ServerError {
        ServerError::Bind {
            address: "127.0.0.1:8080".to_owned(),
            source: io::Error::new(kind, "bind failed"),
        }
    }

    #[test]
    fn error_codes_are_unique() {
        let codes = [
            ServerError::InvalidConfig("test".to_owned()).error_code(),
            bind_error(io::ErrorKind::Other).error_code(),
            ServerError::Runtime(io::Error::other("test")).error_code(),
        ];
        assert_ne!(codes[0], codes[1]);
        assert_ne!(codes[1], codes[2]);
        assert_ne!(codes[0], codes[2]);
    }

    #[test]
    fn address_in_use_is_recoverable() {
        let err = bind_error(io::ErrorKind::AddrInUse);
        assert!(err.is_recoverable());
        assert!(err.suggestion().is_some());
        assert!(err.to_string().contains("127.0.0.1:8080"));
    }

    #[test]
    fn invalid_config_is_not_recoverable() {
        let err = ServerError::invalid_config(&anyhow::anyhow!("port is zero"));
        assert!(!err.is_recoverable());
        assert!(err.suggestion().is_some());
        assert_eq!(err.io_kind(), None);
    }
}
