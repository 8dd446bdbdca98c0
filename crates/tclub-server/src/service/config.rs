//! Service layer configuration.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tclub_mongo::{MongoClient, MongoConfig};
use tclub_redis::{RedisClient, RedisConfig};

use crate::service::security::{TokenConfig, TokenService};
use crate::utility::tracing_targets::TRACING_TARGET_SERVICE as TRACING_TARGET;
use crate::{Error, Result};

/// Name of the cookie carrying the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Refresh cookie attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct CookieConfig {
    /// Domain the refresh token cookie is scoped to
    #[cfg_attr(
        feature = "config",
        arg(long = "server-domain", env = "SERVER_DOMAIN", default_value = "localhost")
    )]
    pub server_domain: String,
}

impl CookieConfig {
    /// Creates cookie settings scoped to `domain`.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            server_domain: domain.into(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.server_domain.trim().is_empty() {
            return Err(Error::config("server_domain cannot be empty"));
        }

        if self.server_domain.contains([';', ' ', ',']) {
            return Err(Error::config("server_domain contains invalid characters"));
        }

        Ok(())
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Account store connection.
    #[cfg_attr(feature = "config", clap(flatten))]
    pub mongo_config: MongoConfig,

    /// Session cache connection.
    #[cfg_attr(feature = "config", clap(flatten))]
    pub redis_config: RedisConfig,

    /// Token secrets and lifetimes.
    #[cfg_attr(feature = "config", clap(flatten))]
    pub token_config: TokenConfig,

    /// Refresh cookie attributes.
    #[cfg_attr(feature = "config", clap(flatten))]
    #[builder(default)]
    pub cookie_config: CookieConfig,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        self.mongo_config.validate()?;
        self.redis_config.validate()?;
        self.token_config.validate()?;
        self.cookie_config.validate()
    }

    /// Connects to MongoDB.
    pub async fn connect_mongo(&self) -> Result<MongoClient> {
        let client = MongoClient::connect(self.mongo_config.clone())
            .await
            .map_err(|e| {
                Error::external("mongodb", "Failed to connect to the account store").with_source(e)
            })?;

        tracing::info!(
            target: TRACING_TARGET,
            database = %self.mongo_config.mongo_database,
            "Account store connected"
        );
        Ok(client)
    }

    /// Connects to Redis.
    pub async fn connect_redis(&self) -> Result<RedisClient> {
        let client = RedisClient::connect(self.redis_config.clone())
            .await
            .map_err(|e| {
                Error::external("redis", "Failed to connect to the session cache").with_source(e)
            })?;

        tracing::info!(
            target: TRACING_TARGET,
            database = self.redis_config.redis_database,
            "Session cache connected"
        );
        Ok(client)
    }

    /// Prepares the token signing keys.
    pub fn create_token_service(&self) -> Result<TokenService> {
        TokenService::from_config(&self.token_config)
    }
}

impl ServiceConfigBuilder {
    fn validate(builder: &ServiceConfigBuilder) -> std::result::Result<(), String> {
        if let Some(tokens) = &builder.token_config {
            tokens.validate().map_err(|e| e.to_string())?;
        }

        if let Some(mongo) = &builder.mongo_config {
            mongo.validate().map_err(|e| e.to_string())?;
        }

        if let Some(redis) = &builder.redis_config {
            redis.validate().map_err(|e| e.to_string())?;
        }

        if let Some(cookie) = &builder.cookie_config {
            cookie.validate().map_err(|e| e.to_string())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn builder() -> ServiceConfigBuilder {
        ServiceConfig::builder()
            .with_mongo_config(MongoConfig::new("mongodb://localhost:27017", "tclub"))
            .with_redis_config(RedisConfig::new("127.0.0.1:6379"))
            .with_token_config(TokenConfig::new("access", "refresh"))
    }

    #[test]
    fn builder_defaults_cookie_domain() -> anyhow::Result<()> {
        let config = builder().build()?;
        assert_eq!(config.cookie_config.server_domain, "localhost");
        assert!(config.validate().is_ok());
        assert_eq!(
            config.create_token_service()?.refresh_token_ttl(),
            Duration::from_secs(604_800)
        );
        Ok(())
    }

    #[test]
    fn builder_rejects_shared_secrets() {
        let result = builder()
            .with_token_config(TokenConfig::new("same", "same"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn cookie_domain_validation() {
        assert!(CookieConfig::new("tclub.example").validate().is_ok());
        assert!(CookieConfig::new("").validate().is_err());
        assert!(CookieConfig::new("a.com; Secure").validate().is_err());
    }
}
