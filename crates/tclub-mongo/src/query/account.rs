//! Account repository for managing user accounts.

use std::future::Future;
use std::sync::Arc;

use jiff::Timestamp;
use mongodb::bson::oid::ObjectId;

use crate::model::{Account, NewAccount};
use crate::{
    DocumentStore, Filter, MemoryStore, MongoClient, MongoError, MongoResult, MongoStore, Patch,
    TRACING_TARGET_QUERY,
};

/// Shared handle to the account collection.
pub type AccountStore = Arc<dyn DocumentStore<Account>>;

/// Account field that can be used to look up an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum AccountKey {
    /// Lookup by username.
    Username,
    /// Lookup by email address.
    Email,
}

impl AccountKey {
    /// Returns the stored field path queried for this key.
    pub fn field_path(self) -> &'static str {
        match self {
            Self::Username => Account::USERNAME_PATH,
            Self::Email => Account::EMAIL_PATH,
        }
    }

    /// Maps a unique index name back to the key it protects.
    pub fn from_index(index: &str) -> Option<Self> {
        match index {
            Account::USERNAME_PATH => Some(Self::Username),
            Account::EMAIL_PATH => Some(Self::Email),
            _ => None,
        }
    }
}

/// Repository for account operations.
///
/// Implemented for every [`DocumentStore`] of accounts, so the same calls
/// work against MongoDB and the in-memory backend.
pub trait AccountRepository {
    /// Creates the unique indexes on username and email address.
    fn ensure_indexes(&self) -> impl Future<Output = MongoResult<()>> + Send;

    /// Finds an account whose `key` field equals `value` exactly.
    ///
    /// Comparison is case-sensitive.
    fn find_account_by_key_value(
        &self,
        key: AccountKey,
        value: &str,
    ) -> impl Future<Output = MongoResult<Option<Account>>> + Send;

    /// Finds an account by its identifier.
    fn find_account_by_id(
        &self,
        account_id: ObjectId,
    ) -> impl Future<Output = MongoResult<Option<Account>>> + Send;

    /// Inserts a new unconfirmed account, returning its identifier.
    ///
    /// A collision on username or email surfaces as
    /// [`MongoError::DuplicateKey`] naming the field path.
    fn create_account(
        &self,
        new_account: NewAccount,
    ) -> impl Future<Output = MongoResult<ObjectId>> + Send;

    /// Records activity for the account.
    ///
    /// Returns whether an account was matched.
    fn touch_last_seen(
        &self,
        account_id: ObjectId,
    ) -> impl Future<Output = MongoResult<bool>> + Send;
}

impl<S> AccountRepository for S
where
    S: DocumentStore<Account> + ?Sized,
{
    async fn ensure_indexes(&self) -> MongoResult<()> {
        self.ensure_unique(Account::USERNAME_PATH).await?;
        self.ensure_unique(Account::EMAIL_PATH).await?;
        tracing::info!(target: TRACING_TARGET_QUERY, "Account indexes ensured");
        Ok(())
    }

    async fn find_account_by_key_value(
        &self,
        key: AccountKey,
        value: &str,
    ) -> MongoResult<Option<Account>> {
        tracing::debug!(target: TRACING_TARGET_QUERY, %key, "Looking up account");
        self.find_one(Filter::new().eq(key.field_path(), value))
            .await
    }

    async fn find_account_by_id(&self, account_id: ObjectId) -> MongoResult<Option<Account>> {
        self.find_one(Filter::by_id(account_id)).await
    }

    async fn create_account(&self, new_account: NewAccount) -> MongoResult<ObjectId> {
        let account = Account::from_new(new_account, Timestamp::now());
        let account_id = self.insert(&account).await?;
        tracing::info!(target: TRACING_TARGET_QUERY, %account_id, "Account document created");
        Ok(account_id)
    }

    async fn touch_last_seen(&self, account_id: ObjectId) -> MongoResult<bool> {
        let patch = Patch::new().set(Account::LAST_SEEN_PATH, Timestamp::now().to_string());
        let matched = self.update(account_id, patch).await?;
        Ok(matched > 0)
    }
}

impl MongoClient {
    /// Returns an account store backed by the `account` collection.
    pub fn account_store(&self) -> AccountStore {
        Arc::new(MongoStore::<Account>::new(self, Account::COLLECTION))
    }
}

/// Returns an empty in-memory account store.
pub fn memory_account_store() -> AccountStore {
    Arc::new(MemoryStore::<Account>::new())
}

/// Returns the account key whose unique index rejected a write, if any.
pub fn duplicate_account_key(error: &MongoError) -> Option<AccountKey> {
    error.duplicate_index().and_then(AccountKey::from_index)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn new_account(username: &str, email: &str) -> NewAccount {
        NewAccount {
            username: username.to_owned(),
            email: email.to_owned(),
            password_hash: "$argon2id$v=19$stub".to_owned(),
        }
    }

    #[test]
    fn account_key_parsing() {
        assert_eq!(AccountKey::from_str("username").ok(), Some(AccountKey::Username));
        assert_eq!(AccountKey::from_str("email").ok(), Some(AccountKey::Email));
        assert!(AccountKey::from_str("phone").is_err());
        assert!(AccountKey::from_str("Email").is_err());
        assert_eq!(AccountKey::Email.field_path(), "email.value");
        assert_eq!(AccountKey::Username.to_string(), "username");
    }

    #[tokio::test]
    async fn create_then_lookup_by_each_key() -> anyhow::Result<()> {
        let store = memory_account_store();
        store.ensure_indexes().await?;

        let id = store
            .create_account(new_account("alice", "alice@example.com"))
            .await?;

        let by_username = store
            .find_account_by_key_value(AccountKey::Username, "alice")
            .await?
            .expect("found by username");
        assert_eq!(by_username.id, Some(id));

        let by_email = store
            .find_account_by_key_value(AccountKey::Email, "alice@example.com")
            .await?;
        assert!(by_email.is_some());

        let case_differs = store
            .find_account_by_key_value(AccountKey::Email, "Alice@example.com")
            .await?;
        assert!(case_differs.is_none());

        let by_id = store.find_account_by_id(id).await?.expect("found by id");
        assert!(!by_id.is_confirmed());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_maps_to_key() -> anyhow::Result<()> {
        let store = memory_account_store();
        store.ensure_indexes().await?;
        store
            .create_account(new_account("alice", "shared@example.com"))
            .await?;

        let error = store
            .create_account(new_account("bob", "shared@example.com"))
            .await
            .expect_err("duplicate email");
        assert_eq!(duplicate_account_key(&error), Some(AccountKey::Email));

        let error = store
            .create_account(new_account("alice", "other@example.com"))
            .await
            .expect_err("duplicate username");
        assert_eq!(duplicate_account_key(&error), Some(AccountKey::Username));
        Ok(())
    }

    #[tokio::test]
    async fn touch_last_seen_updates_metadata() -> anyhow::Result<()> {
        let store = memory_account_store();
        let id = store
            .create_account(new_account("alice", "alice@example.com"))
            .await?;

        assert!(store.touch_last_seen(id).await?);
        assert!(!store.touch_last_seen(ObjectId::new()).await?);

        let account = store.find_account_by_id(id).await?.expect("exists");
        assert!(account.metadata.last_seen_at >= account.metadata.created_at);
        Ok(())
    }
}
