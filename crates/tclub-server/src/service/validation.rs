//! Format rules for account fields.
//!
//! The `validate_*` functions are plain predicates. The `check_*` adapters
//! wrap them for `#[validate(custom(function = ...))]` on request bodies.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

/// Shortest accepted password, in characters.
pub const PASSWORD_MIN_LENGTH: usize = 6;

/// Longest accepted password, in characters.
pub const PASSWORD_MAX_LENGTH: usize = 32;

/// `local@domain` where the domain ends in an alphabetic label of two or
/// more letters, or is a bare dotted-quad IPv4 address.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9._%+\-]+@(?:[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}|(?:[0-9]{1,3}\.){3}[0-9]{1,3})$",
    )
    .expect("email pattern compiles")
});

/// Returns whether `username` is a valid handle.
///
/// Only ASCII letters, digits, `.` and `_` are allowed, and the first
/// character may not be `.` or `_`.
pub fn validate_username(username: &str) -> bool {
    let Some(first) = username.chars().next() else {
        return false;
    };

    if first == '.' || first == '_' {
        return false;
    }

    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// Returns whether `email` has a supported address format.
///
/// Bracketed IP literals such as `user@[10.0.0.1]` are rejected.
pub fn validate_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Returns whether `password` is between 6 and 32 characters long.
pub fn validate_password(password: &str) -> bool {
    let length = password.chars().count();
    (PASSWORD_MIN_LENGTH..=PASSWORD_MAX_LENGTH).contains(&length)
}

fn validation_error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// [`validate_username`] for `validator` derives.
pub fn check_username(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        return Ok(());
    }

    Err(validation_error(
        "username",
        "must start with a letter or digit and contain only letters, digits, '.' or '_'",
    ))
}

/// [`validate_email`] for `validator` derives.
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        return Ok(());
    }

    Err(validation_error("email", "must be a valid email address"))
}

/// [`validate_password`] for `validator` derives.
pub fn check_password(password: &str) -> Result<(), ValidationError> {
    if validate_password(password) {
        return Ok(());
    }

    Err(validation_error("password", "must be between 6 and 32 characters long"))
}
