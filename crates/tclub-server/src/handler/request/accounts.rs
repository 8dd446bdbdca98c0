//! Account request types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::service::Registration;

/// Request payload to create an account.
#[must_use]
#[derive(Clone, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccount {
    /// Unique handle of letters, digits, `.` and `_`, not starting with `.` or `_`.
    #[validate(custom(function = "crate::service::validation::check_username"))]
    pub username: String,

    /// Email address (must be a valid email format).
    #[validate(custom(function = "crate::service::validation::check_email"))]
    pub email: String,

    /// Password (6-32 characters, hashed before storage).
    #[validate(custom(function = "crate::service::validation::check_password"))]
    pub password: String,
}

impl CreateAccount {
    /// Converts this request into the workflow input.
    pub fn into_registration(self) -> Registration {
        Registration {
            username: self.username,
            email: self.email,
            password: self.password,
        }
    }
}

impl std::fmt::Debug for CreateAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateAccount")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> CreateAccount {
        CreateAccount {
            username: username.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request("alice", "alice@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let errors = request("_alice", "not-an-email", "short")
            .validate()
            .expect_err("all fields are invalid");
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", request("alice", "alice@example.com", "secret1"));
        assert!(!rendered.contains("secret1"));
    }
}
