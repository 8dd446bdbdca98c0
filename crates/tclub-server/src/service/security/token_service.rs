//! Signed, time-limited identity tokens.
//!
//! Tokens are HS256 JWTs carrying the account id and standard `iat`, `nbf`
//! and `exp` claims. Access and refresh tokens use separate secrets and
//! lifetimes so one kind can never be accepted in place of the other.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::utility::tracing_targets::TRACING_TARGET_TOKEN_SERVICE as TRACING_TARGET;
use crate::{Error, Result};

/// Result type for token operations.
pub type TokenResult<T, E = TokenError> = std::result::Result<T, E>;

/// Failures while issuing or verifying tokens.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The requested lifetime is zero, negative or out of range.
    #[error("token lifetime must be a positive number of minutes, got {0}")]
    InvalidTtl(i64),

    /// The claims could not be signed.
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The token failed signature, algorithm or time checks.
    #[error("token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Hex identifier of the account the token was issued to.
    #[serde(rename = "accountId")]
    pub account_id: String,
    /// Issued at.
    #[serde(rename = "iat", with = "jiff::fmt::serde::timestamp::second::required")]
    pub issued_at: Timestamp,
    /// Not valid before.
    #[serde(rename = "nbf", with = "jiff::fmt::serde::timestamp::second::required")]
    pub not_before: Timestamp,
    /// Expiration time.
    #[serde(rename = "exp", with = "jiff::fmt::serde::timestamp::second::required")]
    pub expires_at: Timestamp,
}

impl TokenClaims {
    /// Builds claims valid from `now` for `ttl_minutes`.
    pub fn new(
        account_id: impl Into<String>,
        now: Timestamp,
        ttl_minutes: i64,
    ) -> TokenResult<Self> {
        if ttl_minutes <= 0 {
            return Err(TokenError::InvalidTtl(ttl_minutes));
        }

        let expires_at = ttl_minutes
            .checked_mul(60)
            .map(SignedDuration::from_secs)
            .and_then(|lifetime| now.checked_add(lifetime).ok())
            .ok_or(TokenError::InvalidTtl(ttl_minutes))?;

        Ok(Self {
            account_id: account_id.into(),
            issued_at: now,
            not_before: now,
            expires_at,
        })
    }
}

fn sign(claims: &TokenClaims, key: &EncodingKey) -> TokenResult<String> {
    encode(&Header::new(Algorithm::HS256), claims, key).map_err(TokenError::Signing)
}

fn verify(token: &str, key: &DecodingKey) -> TokenResult<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<TokenClaims>(token, key, &validation).map_err(|e| {
        tracing::debug!(target: TRACING_TARGET, error = %e, "token rejected");
        TokenError::Rejected(e)
    })?;

    Ok(token_data.claims)
}

/// Signs a token for `account_id` that expires after `ttl_minutes`.
pub fn generate_token(account_id: &str, secret: &str, ttl_minutes: i64) -> TokenResult<String> {
    let claims = TokenClaims::new(account_id, Timestamp::now(), ttl_minutes)?;
    sign(&claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verifies a token against `secret` and returns its claims.
///
/// Only the HMAC family is accepted. Expiry and not-before are checked
/// without leeway.
pub fn validate_token(token: &str, secret: &str) -> TokenResult<TokenClaims> {
    verify(token, &DecodingKey::from_secret(secret.as_bytes()))
}

/// Token secrets and lifetimes.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct TokenConfig {
    /// Secret used to sign access tokens
    #[cfg_attr(
        feature = "config",
        arg(long = "access-token-secret", env = "ACCESS_TOKEN_SECRET")
    )]
    pub access_token_secret: String,

    /// Access token lifetime in minutes
    #[cfg_attr(
        feature = "config",
        arg(long = "access-token-ttl", env = "ACCESS_TOKEN_TTL", default_value = "15")
    )]
    pub access_token_ttl: i64,

    /// Secret used to sign refresh tokens
    #[cfg_attr(
        feature = "config",
        arg(long = "refresh-token-secret", env = "REFRESH_TOKEN_SECRET")
    )]
    pub refresh_token_secret: String,

    /// Refresh token lifetime in minutes
    #[cfg_attr(
        feature = "config",
        arg(long = "refresh-token-ttl", env = "REFRESH_TOKEN_TTL", default_value = "10080")
    )]
    pub refresh_token_ttl: i64,
}

impl TokenConfig {
    /// Default access token lifetime in minutes.
    pub const DEFAULT_ACCESS_TTL: i64 = 15;
    /// Default refresh token lifetime in minutes (one week).
    pub const DEFAULT_REFRESH_TTL: i64 = 7 * 24 * 60;
    /// Longest accepted lifetime for either token, in minutes (one year).
    pub const MAX_TTL: i64 = 365 * 24 * 60;

    /// Creates a configuration with default lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_token_secret: access_secret.into(),
            access_token_ttl: Self::DEFAULT_ACCESS_TTL,
            refresh_token_secret: refresh_secret.into(),
            refresh_token_ttl: Self::DEFAULT_REFRESH_TTL,
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.access_token_secret.is_empty() || self.refresh_token_secret.is_empty() {
            return Err(Error::config("token secrets cannot be empty"));
        }

        if self.access_token_secret == self.refresh_token_secret {
            return Err(Error::config(
                "access and refresh tokens must use different secrets",
            ));
        }

        let lifetimes = 1..=Self::MAX_TTL;
        if !lifetimes.contains(&self.access_token_ttl)
            || !lifetimes.contains(&self.refresh_token_ttl)
        {
            return Err(Error::config(format!(
                "token lifetimes must be between 1 and {} minutes",
                Self::MAX_TTL
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_token_secret", &"***")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_secret", &"***")
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_minutes: i64,
}

impl TokenKeys {
    fn from_secret(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    fn issue(&self, account_id: &str) -> TokenResult<String> {
        let claims = TokenClaims::new(account_id, Timestamp::now(), self.ttl_minutes)?;
        sign(&claims, &self.encoding)
    }
}

/// Issues and verifies access and refresh tokens with pre-built keys.
#[derive(Clone)]
pub struct TokenService {
    inner: Arc<TokenServiceInner>,
}

struct TokenServiceInner {
    access: TokenKeys,
    refresh: TokenKeys,
}

impl TokenService {
    /// Creates the service from a validated configuration.
    pub fn from_config(config: &TokenConfig) -> Result<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET,
            access_ttl_minutes = config.access_token_ttl,
            refresh_ttl_minutes = config.refresh_token_ttl,
            "Token keys prepared"
        );

        let inner = TokenServiceInner {
            access: TokenKeys::from_secret(&config.access_token_secret, config.access_token_ttl),
            refresh: TokenKeys::from_secret(
                &config.refresh_token_secret,
                config.refresh_token_ttl,
            ),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Issues a short-lived access token.
    pub fn issue_access_token(&self, account_id: &str) -> TokenResult<String> {
        self.inner.access.issue(account_id)
    }

    /// Issues a long-lived refresh token.
    pub fn issue_refresh_token(&self, account_id: &str) -> TokenResult<String> {
        self.inner.refresh.issue(account_id)
    }

    /// Verifies a token signed with the access secret.
    pub fn verify_access_token(&self, token: &str) -> TokenResult<TokenClaims> {
        verify(token, &self.inner.access.decoding)
    }

    /// Verifies a token signed with the refresh secret.
    pub fn verify_refresh_token(&self, token: &str) -> TokenResult<TokenClaims> {
        verify(token, &self.inner.refresh.decoding)
    }

    /// Returns the refresh token lifetime, used for the cache entry and cookie.
    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.inner.refresh.ttl_minutes.unsigned_abs().saturating_mul(60))
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl_minutes", &self.inner.access.ttl_minutes)
            .field("refresh_ttl_minutes", &self.inner.refresh.ttl_minutes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT_ID: &str = "65f1c0ffee65f1c0ffee65f1";

    fn service() -> TokenService {
        TokenService::from_config(&TokenConfig::new("access-secret", "refresh-secret"))
            .expect("valid token config")
    }

    #[test]
    fn round_trip_keeps_account_id() -> anyhow::Result<()> {
        let token = generate_token(ACCOUNT_ID, "secret", 15)?;
        let claims = validate_token(&token, "secret")?;

        assert_eq!(claims.account_id, ACCOUNT_ID);
        assert_eq!(claims.issued_at, claims.not_before);
        assert_eq!(
            claims.expires_at.as_second() - claims.issued_at.as_second(),
            15 * 60
        );
        assert!(claims.expires_at > Timestamp::now());
        Ok(())
    }

    #[test]
    fn rejects_other_secret() -> anyhow::Result<()> {
        let token = generate_token(ACCOUNT_ID, "secret", 15)?;
        assert!(matches!(
            validate_token(&token, "another-secret"),
            Err(TokenError::Rejected(_))
        ));
        Ok(())
    }

    #[test]
    fn rejects_expired_token() -> anyhow::Result<()> {
        let issued = Timestamp::now() - SignedDuration::from_mins(30);
        let claims = TokenClaims::new(ACCOUNT_ID, issued, 15)?;
        let token = sign(&claims, &EncodingKey::from_secret(b"secret"))?;

        assert!(claims.expires_at < Timestamp::now());
        assert!(validate_token(&token, "secret").is_err());
        Ok(())
    }

    #[test]
    fn rejects_token_not_yet_valid() -> anyhow::Result<()> {
        let issued = Timestamp::now() + SignedDuration::from_mins(10);
        let claims = TokenClaims::new(ACCOUNT_ID, issued, 15)?;
        let token = sign(&claims, &EncodingKey::from_secret(b"secret"))?;

        assert!(validate_token(&token, "secret").is_err());
        Ok(())
    }

    #[test]
    fn rejects_non_positive_ttl() {
        assert!(matches!(
            generate_token(ACCOUNT_ID, "secret", 0),
            Err(TokenError::InvalidTtl(0))
        ));
        assert!(generate_token(ACCOUNT_ID, "secret", -5).is_err());
    }

    #[test]
    fn access_and_refresh_are_not_interchangeable() -> anyhow::Result<()> {
        let tokens = service();
        let access = tokens.issue_access_token(ACCOUNT_ID)?;
        let refresh = tokens.issue_refresh_token(ACCOUNT_ID)?;

        assert_ne!(access, refresh);
        assert_eq!(tokens.verify_access_token(&access)?.account_id, ACCOUNT_ID);
        assert_eq!(tokens.verify_refresh_token(&refresh)?.account_id, ACCOUNT_ID);
        assert!(tokens.verify_access_token(&refresh).is_err());
        assert!(tokens.verify_refresh_token(&access).is_err());
        Ok(())
    }

    #[test]
    fn oversized_ttl_is_rejected_without_panicking() {
        assert!(matches!(
            generate_token(ACCOUNT_ID, "secret", i64::MAX),
            Err(TokenError::InvalidTtl(i64::MAX))
        ));
        assert!(matches!(
            TokenClaims::new(ACCOUNT_ID, Timestamp::now(), i64::MAX / 60),
            Err(TokenError::InvalidTtl(_))
        ));

        let mut config = TokenConfig::new("access", "refresh");
        config.refresh_token_ttl = i64::MAX;
        assert!(config.validate().is_err());
        assert!(TokenService::from_config(&config).is_err());

        config.refresh_token_ttl = TokenConfig::MAX_TTL;
        let tokens = TokenService::from_config(&config).expect("longest lifetime is valid");
        assert_eq!(
            tokens.refresh_token_ttl(),
            Duration::from_secs(TokenConfig::MAX_TTL as u64 * 60)
        );
        assert!(tokens.issue_refresh_token(ACCOUNT_ID).is_ok());
    }

    #[test]
    fn refresh_ttl_in_seconds() {
        assert_eq!(service().refresh_token_ttl(), Duration::from_secs(10080 * 60));
    }

    #[test]
    fn config_validation() {
        assert!(TokenConfig::new("a", "b").validate().is_ok());
        assert!(TokenConfig::new("", "b").validate().is_err());
        assert!(TokenConfig::new("same", "same").validate().is_err());

        let mut config = TokenConfig::new("a", "b");
        config.access_token_ttl = 0;
        assert!(config.validate().is_err());

        assert!(!format!("{:?}", TokenConfig::new("a-secret", "b")).contains("a-secret"));
    }
}
