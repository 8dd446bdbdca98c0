use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tclub_mongo::model::NewAccount;
use tclub_mongo::query::{AccountKey, AccountRepository, AccountStore, duplicate_account_key};
use tclub_redis::RefreshTokenStore;
use validator::ValidationError;

use super::{AccountError, AccountResult};
use crate::service::security::{PasswordHasher, TokenService};
use crate::service::validation::{check_email, check_password, check_username};
use crate::utility::tracing_targets::TRACING_TARGET_ACCOUNT as TRACING_TARGET;

/// Data submitted to create an account.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct CreatedAccount {
    /// Hex identifier of the new account.
    pub account_id: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the refresh token, used for the cookie.
    pub refresh_token_ttl: Duration,
}

/// Orchestrates account registration and availability checks.
///
/// Holds explicit handles to every collaborator; cloning is cheap.
#[derive(Clone)]
pub struct AccountWorkflow {
    hasher: PasswordHasher,
    tokens: TokenService,
    accounts: AccountStore,
    refresh_tokens: RefreshTokenStore,
}

impl AccountWorkflow {
    /// Creates the workflow over its collaborators.
    pub fn new(
        hasher: PasswordHasher,
        tokens: TokenService,
        accounts: AccountStore,
        refresh_tokens: RefreshTokenStore,
    ) -> Self {
        Self {
            hasher,
            tokens,
            accounts,
            refresh_tokens,
        }
    }

    /// Returns `Ok(())` when no account uses `value` for `key`.
    ///
    /// `key` must be `username` or `email`, and `value` must satisfy the
    /// format rule for that field.
    #[tracing::instrument(skip(self), target = TRACING_TARGET)]
    pub async fn check_availability(&self, key: &str, value: &str) -> AccountResult<()> {
        let key = AccountKey::from_str(key).map_err(|_| AccountError::InvalidKey)?;

        let checked = match key {
            AccountKey::Username => check_username(value),
            AccountKey::Email => check_email(value),
        };
        checked.map_err(|e| invalid_field(field_name(key), e))?;

        self.ensure_unused(key, value).await
    }

    /// Registers a new account and opens its first session.
    ///
    /// Steps run strictly in order: validation, email then username
    /// duplicate checks, hashing, insert, token issuance and refresh token
    /// caching. Failures after the insert leave the account in place.
    #[tracing::instrument(skip_all, target = TRACING_TARGET, fields(username = %registration.username))]
    pub async fn create_account(&self, registration: Registration) -> AccountResult<CreatedAccount> {
        check_username(&registration.username).map_err(|e| invalid_field("username", e))?;
        check_email(&registration.email).map_err(|e| invalid_field("email", e))?;
        check_password(&registration.password).map_err(|e| invalid_field("password", e))?;

        self.ensure_unused(AccountKey::Email, &registration.email)
            .await?;
        self.ensure_unused(AccountKey::Username, &registration.username)
            .await?;

        let password_hash = self.hasher.hash_password(&registration.password)?;

        let new_account = NewAccount {
            username: registration.username,
            email: registration.email,
            password_hash,
        };

        let account_id = match self.accounts.create_account(new_account).await {
            Ok(account_id) => account_id.to_hex(),
            Err(error) => {
                return Err(match duplicate_account_key(&error) {
                    Some(key) => {
                        tracing::warn!(
                            target: TRACING_TARGET,
                            %key,
                            "Concurrent registration rejected by unique index"
                        );
                        AccountError::Conflict(key)
                    }
                    None => AccountError::Store(error),
                });
            }
        };

        match self.open_session(&account_id).await {
            Ok(created) => {
                tracing::info!(
                    target: TRACING_TARGET,
                    account_id = %created.account_id,
                    "Account created"
                );
                Ok(created)
            }
            Err(error) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    %account_id,
                    %error,
                    "Account stored but session could not be opened, account is orphaned"
                );
                Err(error)
            }
        }
    }

    /// Issues both tokens and caches the refresh token.
    async fn open_session(&self, account_id: &str) -> AccountResult<CreatedAccount> {
        let access_token = self.tokens.issue_access_token(account_id)?;
        let refresh_token = self.tokens.issue_refresh_token(account_id)?;
        let refresh_token_ttl = self.tokens.refresh_token_ttl();

        self.refresh_tokens
            .store(&refresh_token, account_id, refresh_token_ttl)
            .await?;

        Ok(CreatedAccount {
            account_id: account_id.to_owned(),
            access_token,
            refresh_token,
            refresh_token_ttl,
        })
    }

    async fn ensure_unused(&self, key: AccountKey, value: &str) -> AccountResult<()> {
        match self.accounts.find_account_by_key_value(key, value).await? {
            Some(_) => {
                tracing::debug!(target: TRACING_TARGET, %key, "Value already taken");
                Err(AccountError::Conflict(key))
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for AccountWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountWorkflow")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

fn field_name(key: AccountKey) -> &'static str {
    match key {
        AccountKey::Username => "username",
        AccountKey::Email => "email",
    }
}

fn invalid_field(field: &'static str, error: ValidationError) -> AccountError {
    AccountError::Validation {
        field,
        message: error.message.unwrap_or_else(|| "has an invalid format".into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tclub_mongo::MongoError;
    use tclub_mongo::query::memory_account_store;
    use tclub_redis::{CacheError, MemoryCache};

    use super::*;
    use crate::handler::test::{UnavailableCache, UnavailableStore};
    use crate::service::security::TokenConfig;

    struct Fixture {
        workflow: AccountWorkflow,
        accounts: AccountStore,
        refresh_tokens: RefreshTokenStore,
        tokens: TokenService,
    }

    async fn fixture() -> anyhow::Result<Fixture> {
        let accounts = memory_account_store();
        accounts.ensure_indexes().await?;
        let refresh_tokens = RefreshTokenStore::new(MemoryCache::new());
        let tokens = TokenService::from_config(&TokenConfig::new("access", "refresh"))?;

        let workflow = AccountWorkflow::new(
            PasswordHasher::new(),
            tokens.clone(),
            accounts.clone(),
            refresh_tokens.clone(),
        );

        Ok(Fixture {
            workflow,
            accounts,
            refresh_tokens,
            tokens,
        })
    }

    fn registration(username: &str, email: &str, password: &str) -> Registration {
        Registration {
            username: username.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        }
    }

    #[tokio::test]
    async fn create_account_issues_tokens_and_caches_refresh() -> anyhow::Result<()> {
        let fx = fixture().await?;
        let created = fx
            .workflow
            .create_account(registration("alice", "alice@example.com", "secret1"))
            .await?;

        assert_eq!(created.account_id.len(), 24);
        assert_ne!(created.access_token, created.refresh_token);
        assert_eq!(
            fx.tokens.verify_access_token(&created.access_token)?.account_id,
            created.account_id
        );
        assert_eq!(
            fx.refresh_tokens.lookup(&created.refresh_token).await?,
            created.account_id
        );
        assert_eq!(created.refresh_token_ttl, Duration::from_secs(10080 * 60));

        let stored = fx
            .accounts
            .find_account_by_key_value(AccountKey::Username, "alice")
            .await?
            .expect("account stored");
        assert_ne!(stored.password, "secret1");
        assert!(!stored.is_confirmed());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_fields_are_named() -> anyhow::Result<()> {
        let fx = fixture().await?;

        let cases = [
            (registration(".alice", "alice@example.com", "secret1"), "username"),
            (registration("alice", "alice@", "secret1"), "email"),
            (registration("alice", "alice@example.com", "short"), "password"),
        ];

        for (registration, expected) in cases {
            match fx.workflow.create_account(registration).await {
                Err(AccountError::Validation { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected validation error for {expected}, got {other:?}"),
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn email_conflict_is_reported_before_username() -> anyhow::Result<()> {
        let fx = fixture().await?;
        fx.workflow
            .create_account(registration("alice", "alice@example.com", "secret1"))
            .await?;

        let error = fx
            .workflow
            .create_account(registration("alice", "alice@example.com", "secret1"))
            .await
            .expect_err("duplicate");
        assert!(matches!(error, AccountError::Conflict(AccountKey::Email)));

        let error = fx
            .workflow
            .create_account(registration("alice", "other@example.com", "secret1"))
            .await
            .expect_err("duplicate username");
        assert!(matches!(error, AccountError::Conflict(AccountKey::Username)));
        Ok(())
    }

    #[tokio::test]
    async fn email_comparison_is_case_sensitive() -> anyhow::Result<()> {
        let fx = fixture().await?;
        fx.workflow
            .create_account(registration("alice", "alice@example.com", "secret1"))
            .await?;

        fx.workflow
            .check_availability("email", "Alice@example.com")
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn availability_until_created() -> anyhow::Result<()> {
        let fx = fixture().await?;

        for _ in 0..2 {
            fx.workflow.check_availability("username", "bob").await?;
        }

        fx.workflow
            .create_account(registration("bob", "bob@example.com", "secret1"))
            .await?;

        assert!(matches!(
            fx.workflow.check_availability("username", "bob").await,
            Err(AccountError::Conflict(AccountKey::Username))
        ));
        assert!(matches!(
            fx.workflow.check_availability("email", "bob@example.com").await,
            Err(AccountError::Conflict(AccountKey::Email))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn availability_rejects_bad_key_and_value() -> anyhow::Result<()> {
        let fx = fixture().await?;

        let error = fx
            .workflow
            .check_availability("phone", "123")
            .await
            .expect_err("bad key");
        assert!(matches!(error, AccountError::InvalidKey));
        assert_eq!(
            error.to_string(),
            "invalid key, expected 'username' or 'email'"
        );

        assert!(matches!(
            fx.workflow.check_availability("email", "plainaddress").await,
            Err(AccountError::Validation { field: "email", .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_is_reported_as_store_error() -> anyhow::Result<()> {
        let fx = fixture().await?;
        let workflow = AccountWorkflow::new(
            PasswordHasher::new(),
            fx.tokens.clone(),
            Arc::new(UnavailableStore),
            fx.refresh_tokens.clone(),
        );

        let error = workflow
            .create_account(registration("alice", "alice@example.com", "secret1"))
            .await
            .expect_err("store is unavailable");
        assert!(matches!(error, AccountError::Store(MongoError::Timeout { .. })));

        assert!(matches!(
            workflow.check_availability("username", "alice").await,
            Err(AccountError::Store(MongoError::Timeout { .. }))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn cache_failure_after_insert_keeps_the_account() -> anyhow::Result<()> {
        let fx = fixture().await?;
        let workflow = AccountWorkflow::new(
            PasswordHasher::new(),
            fx.tokens.clone(),
            fx.accounts.clone(),
            RefreshTokenStore::new(UnavailableCache),
        );

        let error = workflow
            .create_account(registration("alice", "alice@example.com", "secret1"))
            .await
            .expect_err("cache is unavailable");
        assert!(matches!(
            error,
            AccountError::Cache(CacheError::Timeout { operation: "set", .. })
        ));

        let stored = fx
            .accounts
            .find_account_by_key_value(AccountKey::Username, "alice")
            .await?;
        assert!(stored.is_some());
        assert!(matches!(
            fx.workflow.check_availability("email", "alice@example.com").await,
            Err(AccountError::Conflict(AccountKey::Email))
        ));
        Ok(())
    }
}
