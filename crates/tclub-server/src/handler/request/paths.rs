//! Path parameter types for HTTP handlers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Path parameters for account lookups by a unique field.
///
/// `key` is either `username` or `email`.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountKeyPathParams {
    /// Field to look up by.
    pub key: String,
    /// Value the field must equal exactly.
    pub value: String,
}

/// Path parameters for email confirmation.
#[must_use]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPathParams {
    /// Identifier sent in the confirmation email.
    pub confirm_id: String,
}
