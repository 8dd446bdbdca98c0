//! Document store error to HTTP error conversion.

use tclub_mongo::MongoError;
use tclub_mongo::query::AccountKey;

use super::http_error::{Error, ErrorKind};
use crate::utility::tracing_targets::TRACING_TARGET_STORE as TRACING_TARGET;

impl From<MongoError> for Error<'static> {
    fn from(error: MongoError) -> Self {
        match error {
            MongoError::DuplicateKey { ref index } => {
                tracing::warn!(target: TRACING_TARGET, %index, "unique index violation");

                let message = match AccountKey::from_index(index) {
                    Some(key) => format!("{key} is already taken"),
                    None => "Resource already exists".to_owned(),
                };

                ErrorKind::Conflict
                    .with_message(message)
                    .with_context(error.to_string())
                    .with_resource("account")
            }
            MongoError::Timeout { operation, timeout } => {
                tracing::error!(
                    target: TRACING_TARGET,
                    operation,
                    timeout_ms = timeout.as_millis() as u64,
                    "document store timeout"
                );
                ErrorKind::InternalServerError.into_error()
            }
            MongoError::Connection(ref connection_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %connection_error,
                    "document store connection error"
                );
                ErrorKind::InternalServerError.into_error()
            }
            other => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %other,
                    "document store error"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}
