//! Repositories providing account-level operations over a [`DocumentStore`].
//!
//! [`DocumentStore`]: crate::DocumentStore

pub mod account;

pub use account::{
    AccountKey, AccountRepository, AccountStore, duplicate_account_key, memory_account_store,
};
