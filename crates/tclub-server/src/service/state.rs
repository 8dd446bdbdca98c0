//! Application state and dependency injection.

use tclub_mongo::query::{AccountRepository, AccountStore};
use tclub_redis::RefreshTokenStore;

use crate::service::account::AccountWorkflow;
use crate::service::config::CookieConfig;
use crate::service::security::{PasswordHasher, TokenService};
use crate::service::{Result, ServiceConfig};
use crate::utility::tracing_targets::TRACING_TARGET_SERVICE as TRACING_TARGET;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    account_store: AccountStore,
    refresh_tokens: RefreshTokenStore,

    password_hasher: PasswordHasher,
    token_service: TokenService,
    cookie_config: CookieConfig,
    account_workflow: AccountWorkflow,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to MongoDB and Redis and ensures the account indexes exist.
    pub async fn from_config(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let mongo = config.connect_mongo().await?;
        let redis = config.connect_redis().await?;

        let account_store = mongo.account_store();
        account_store.ensure_indexes().await?;

        let refresh_tokens = RefreshTokenStore::new(redis.session_cache());
        let token_service = config.create_token_service()?;

        Ok(Self::from_parts(
            account_store,
            refresh_tokens,
            token_service,
            config.cookie_config.clone(),
        ))
    }

    /// Assembles the state from already constructed services.
    pub fn from_parts(
        account_store: AccountStore,
        refresh_tokens: RefreshTokenStore,
        token_service: TokenService,
        cookie_config: CookieConfig,
    ) -> Self {
        let password_hasher = PasswordHasher::new();
        let account_workflow = AccountWorkflow::new(
            password_hasher.clone(),
            token_service.clone(),
            account_store.clone(),
            refresh_tokens.clone(),
        );

        tracing::debug!(target: TRACING_TARGET, "Service state assembled");

        Self {
            account_store,
            refresh_tokens,
            password_hasher,
            token_service,
            cookie_config,
            account_workflow,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(account_store: AccountStore);
impl_di!(refresh_tokens: RefreshTokenStore);

impl_di!(password_hasher: PasswordHasher);
impl_di!(token_service: TokenService);
impl_di!(cookie_config: CookieConfig);
impl_di!(account_workflow: AccountWorkflow);
