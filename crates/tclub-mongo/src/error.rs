//! Error types for document store operations.

use std::borrow::Cow;
use std::time::Duration;

use mongodb::bson;
use mongodb::error::{ErrorKind, WriteFailure};

/// Server error code reported for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Result type alias for document store operations.
pub type MongoResult<T, E = MongoError> = Result<T, E>;

/// Comprehensive error type for all document store operations.
///
/// Covers configuration problems, connectivity, timeouts, unique index
/// violations and (de)serialization failures of stored documents.
#[derive(Debug, thiserror::Error)]
#[must_use = "database errors should be handled appropriately"]
pub enum MongoError {
    /// Configuration error.
    ///
    /// Invalid connection string, missing database name or an out of range
    /// timeout.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failed to establish or maintain a database connection.
    #[error("Database connection error: {0}")]
    Connection(#[source] mongodb::error::Error),

    /// Database operation did not complete within the configured timeout.
    #[error("Database operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// Timeout that was exceeded.
        timeout: Duration,
    },

    /// A unique index rejected the write.
    ///
    /// Carries the name of the violated index, which matches the indexed
    /// field path for indexes created by this crate.
    #[error("Duplicate key for unique index '{index}'")]
    DuplicateKey {
        /// Name of the violated unique index.
        index: String,
    },

    /// Database query execution failed.
    #[error("Database query error: {0}")]
    Query(#[source] mongodb::error::Error),

    /// Failed to encode a document or filter value as BSON.
    #[error("Document serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    /// Failed to decode a stored document.
    #[error("Document deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    /// Unexpected error occurred.
    #[error("Unexpected error: {0}")]
    Unexpected(Cow<'static, str>),
}

impl MongoError {
    /// Returns the violated index name if this error is a duplicate key rejection.
    pub fn duplicate_index(&self) -> Option<&str> {
        match self {
            Self::DuplicateKey { index } => Some(index),
            _ => None,
        }
    }

    /// Returns whether this error indicates a transient failure that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Connection(err) => matches!(
                err.kind.as_ref(),
                ErrorKind::Io(_)
                    | ErrorKind::ServerSelection { .. }
                    | ErrorKind::ConnectionPoolCleared { .. }
            ),
            _ => false,
        }
    }
}

impl From<mongodb::error::Error> for MongoError {
    fn from(error: mongodb::error::Error) -> Self {
        match error.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                Self::DuplicateKey {
                    index: duplicate_index_name(&write_error.message),
                }
            }
            ErrorKind::Command(command_error) if command_error.code == DUPLICATE_KEY_CODE => {
                Self::DuplicateKey {
                    index: duplicate_index_name(&command_error.message),
                }
            }
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::Authentication { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => Self::Connection(error),
            ErrorKind::InvalidArgument { message, .. } => Self::Config(message.clone()),
            _ => Self::Query(error),
        }
    }
}

/// Extracts the index name from a server duplicate key message.
///
/// Messages look like `E11000 duplicate key error collection: db.accounts
/// index: username dup key: { username: "alice" }`.
fn duplicate_index_name(message: &str) -> String {
    message
        .split_once("index: ")
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .unwrap_or("unknown")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_index_name() {
        let message = "E11000 duplicate key error collection: tclub.accounts index: email.value dup key: { email.value: \"a@b.io\" }";
        assert_eq!(duplicate_index_name(message), "email.value");
        assert_eq!(duplicate_index_name("E11000 duplicate key"), "unknown");
    }

    #[test]
    fn test_duplicate_index_accessor() {
        let error = MongoError::DuplicateKey {
            index: "username".to_owned(),
        };
        assert_eq!(error.duplicate_index(), Some("username"));
        assert!(!error.is_transient());

        let timeout = MongoError::Timeout {
            operation: "find_one",
            timeout: Duration::from_secs(5),
        };
        assert_eq!(timeout.duplicate_index(), None);
        assert!(timeout.is_transient());
    }

    #[tokio::test]
    async fn test_invalid_connection_string_is_config_error() {
        let driver_error = mongodb::options::ClientOptions::parse("http://localhost:27017")
            .await
            .expect_err("http scheme is not a connection string");

        let error = MongoError::from(driver_error);
        assert!(matches!(error, MongoError::Config(_)), "got {error:?}");
        assert!(!error.is_transient());
    }
}
