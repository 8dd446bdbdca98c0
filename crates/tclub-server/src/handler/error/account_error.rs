//! Account workflow error to HTTP error conversion.

use super::http_error::{Error, ErrorKind};
use crate::handler::response::ValidationErrorDetail;
use crate::service::AccountError;
use crate::utility::tracing_targets::TRACING_TARGET_ACCOUNT as TRACING_TARGET;

impl From<AccountError> for Error<'static> {
    fn from(error: AccountError) -> Self {
        match error {
            AccountError::Validation { field, ref message } => {
                tracing::warn!(target: TRACING_TARGET, field, "account field rejected");

                let detail = ValidationErrorDetail {
                    field: field.to_owned(),
                    code: field.to_owned(),
                    message: message.to_string(),
                    params: None,
                };

                ErrorKind::BadRequest
                    .with_message(error.to_string())
                    .with_resource("account")
                    .with_validation(vec![detail])
            }
            AccountError::Conflict(key) => {
                tracing::warn!(target: TRACING_TARGET, %key, "account key already taken");
                ErrorKind::Conflict
                    .with_message(error.to_string())
                    .with_resource("account")
            }
            AccountError::InvalidKey => {
                tracing::warn!(target: TRACING_TARGET, "unknown account lookup key");
                ErrorKind::BadRequest
                    .with_message(error.to_string())
                    .with_resource("account")
            }
            AccountError::Store(store_error) => store_error.into(),
            AccountError::Cache(cache_error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %cache_error,
                    "session cache failed during account operation"
                );
                ErrorKind::InternalServerError.into_error()
            }
            AccountError::Hashing(_) | AccountError::Token(_) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    "account operation failed"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}
