//! Service layer error to HTTP error conversion.

use super::http_error::{Error as HttpError, ErrorKind};
use crate::utility::tracing_targets::TRACING_TARGET_SERVICE as TRACING_TARGET;
use crate::{Error, ErrorKind as ServiceErrorKind};

impl From<Error> for HttpError<'static> {
    fn from(error: Error) -> Self {
        match error.kind() {
            ServiceErrorKind::Auth => {
                tracing::warn!(target: TRACING_TARGET, error = %error, "authentication failed");
                ErrorKind::Unauthorized.with_context(error.message().to_owned())
            }
            kind => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %error,
                    error_kind = %kind,
                    "service failure"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}
