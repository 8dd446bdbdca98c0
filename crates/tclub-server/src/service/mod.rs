//! Application state, configuration and domain services.

mod account;
mod config;
mod security;
mod state;
pub mod validation;

pub use crate::service::account::{
    AccountError, AccountResult, AccountWorkflow, CreatedAccount, Registration,
};
pub use crate::service::config::{
    CookieConfig, REFRESH_TOKEN_COOKIE, ServiceConfig, ServiceConfigBuilder,
};
pub use crate::service::security::{
    HashError, PasswordHasher, TokenClaims, TokenConfig, TokenError, TokenResult, TokenService,
    generate_token, validate_token,
};
pub use crate::service::state::ServiceState;
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};
