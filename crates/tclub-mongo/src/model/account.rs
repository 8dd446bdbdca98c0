//! Account document model.
//!
//! ## Models
//!
//! - [`Account`] - Stored account document with email confirmation state and metadata
//! - [`NewAccount`] - Data required to create an account

use jiff::Timestamp;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Account document as stored in the `account` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Store-assigned identifier, absent until inserted.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Unique, immutable handle.
    pub username: String,
    /// Email address with its confirmation state.
    pub email: AccountEmail,
    /// PHC-formatted password hash.
    pub password: String,
    /// Profile and activity information.
    pub metadata: AccountMetadata,
}

/// Email address record that can be confirmed later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEmail {
    /// Address as submitted at registration; unique across accounts.
    pub value: String,
    /// Whether the address has been confirmed.
    pub confirmed: bool,
    /// When the record was last changed.
    pub confirmed_at: Timestamp,
}

/// Account metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub profile: AccountProfile,
    pub created_at: Timestamp,
    pub last_seen_at: Timestamp,
}

/// Public profile, empty at registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub display_name: String,
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    /// PHC-formatted password hash, never the plaintext.
    pub password_hash: String,
}

impl Account {
    /// Name of the collection holding account documents.
    pub const COLLECTION: &'static str = "account";

    /// Field path of the username.
    pub const USERNAME_PATH: &'static str = "username";

    /// Field path of the email address.
    pub const EMAIL_PATH: &'static str = "email.value";

    /// Field path of the last activity timestamp.
    pub const LAST_SEEN_PATH: &'static str = "metadata.last_seen_at";

    /// Builds an unconfirmed account document created at `now`.
    pub fn from_new(new_account: NewAccount, now: Timestamp) -> Self {
        Self {
            id: None,
            username: new_account.username,
            email: AccountEmail {
                value: new_account.email,
                confirmed: false,
                confirmed_at: now,
            },
            password: new_account.password_hash,
            metadata: AccountMetadata {
                profile: AccountProfile::default(),
                created_at: now,
                last_seen_at: now,
            },
        }
    }

    /// Returns whether the email address has been confirmed.
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.email.confirmed
    }
}
