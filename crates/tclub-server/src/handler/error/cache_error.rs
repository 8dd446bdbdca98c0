//! Session cache error to HTTP error conversion.

use tclub_redis::CacheError;

use super::http_error::{Error, ErrorKind};
use crate::utility::tracing_targets::TRACING_TARGET_CACHE as TRACING_TARGET;

impl From<CacheError> for Error<'static> {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::KeyNotFound => {
                tracing::debug!(target: TRACING_TARGET, "cache key not found");
                ErrorKind::NotFound
                    .with_message("Session not found")
                    .with_resource("session")
            }
            other => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %other,
                    transient = other.is_transient(),
                    "session cache error"
                );
                ErrorKind::InternalServerError.into_error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let error = Error::from(CacheError::KeyNotFound);
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn config_error_is_internal() {
        let error = Error::from(CacheError::Config("bad address".to_owned()));
        assert_eq!(error.kind(), ErrorKind::InternalServerError);
    }
}
