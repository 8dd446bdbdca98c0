//! Document models stored by the account service.

mod account;

pub use account::{Account, AccountEmail, AccountMetadata, AccountProfile, NewAccount};
