use std::borrow::Cow;

use tclub_mongo::MongoError;
use tclub_mongo::query::AccountKey;
use tclub_redis::CacheError;

use crate::service::security::{HashError, TokenError};

/// Result type for account workflow operations.
pub type AccountResult<T, E = AccountError> = std::result::Result<T, E>;

/// Failures of the account workflow.
///
/// `Validation`, `Conflict` and `InvalidKey` are caused by the request. The
/// remaining variants are server-side failures of a collaborator.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// A field does not have the required format.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// What the field must look like.
        message: Cow<'static, str>,
    },

    /// Another account already uses this username or email.
    #[error("{0} is already taken")]
    Conflict(AccountKey),

    /// The lookup key is neither `username` nor `email`.
    #[error("invalid key, expected 'username' or 'email'")]
    InvalidKey,

    /// The account store failed.
    #[error("account store failure: {0}")]
    Store(#[from] MongoError),

    /// The password could not be hashed.
    #[error("password hashing failed: {0}")]
    Hashing(#[from] HashError),

    /// A token could not be issued.
    #[error("token issuance failed: {0}")]
    Token(#[from] TokenError),

    /// The session cache failed.
    #[error("session cache failure: {0}")]
    Cache(#[from] CacheError),
}
