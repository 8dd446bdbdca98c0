//! Cache server connection configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{CacheError, CacheResult};

const MAX_OPERATION_TIMEOUT_SECS: u64 = 60;

/// Redis connection settings.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "cache configurations must be used to create clients"]
pub struct RedisConfig {
    /// Redis server address as `host:port`
    #[cfg_attr(
        feature = "config",
        arg(long = "redis-address", env = "REDIS_ADDRESS", default_value = "127.0.0.1:6379")
    )]
    pub redis_address: String,

    /// Redis password (optional)
    #[cfg_attr(feature = "config", arg(long = "redis-password", env = "REDIS_PASSWORD"))]
    pub redis_password: Option<String>,

    /// Redis logical database index
    #[cfg_attr(
        feature = "config",
        arg(long = "redis-database", env = "REDIS_DATABASE", default_value = "0")
    )]
    pub redis_database: u8,

    /// Upper bound for every cache operation in seconds
    #[cfg_attr(
        feature = "config",
        arg(
            long = "redis-operation-timeout-secs",
            env = "REDIS_OPERATION_TIMEOUT_SECS",
            default_value = "3"
        )
    )]
    pub redis_operation_timeout_secs: u64,
}

impl RedisConfig {
    /// Creates a configuration for the given `host:port` with no password.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            redis_address: address.into(),
            redis_password: None,
            redis_database: 0,
            redis_operation_timeout_secs: 3,
        }
    }

    /// Sets the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.redis_password = Some(password.into());
        self
    }

    /// Sets the logical database index.
    pub fn with_database(mut self, database: u8) -> Self {
        self.redis_database = database;
        self
    }

    /// Returns the per-operation timeout as a Duration.
    #[inline]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.redis_operation_timeout_secs)
    }

    /// Builds the `redis://` connection URL.
    pub fn connection_url(&self) -> CacheResult<Url> {
        let mut url = Url::parse(&format!("redis://{}", self.redis_address))
            .map_err(|e| CacheError::Config(format!("invalid redis address: {e}")))?;

        if url.host_str().is_none_or(str::is_empty) {
            return Err(CacheError::Config("redis address has no host".to_owned()));
        }

        if let Some(password) = self.redis_password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|_| CacheError::Config("redis password cannot be applied".to_owned()))?;
        }

        url.set_path(&self.redis_database.to_string());
        Ok(url)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CacheResult<()> {
        if self.redis_address.is_empty() {
            return Err(CacheError::Config("redis_address cannot be empty".to_owned()));
        }

        if !(1..=MAX_OPERATION_TIMEOUT_SECS).contains(&self.redis_operation_timeout_secs) {
            return Err(CacheError::Config(format!(
                "operation_timeout_secs must be between 1 and {}",
                MAX_OPERATION_TIMEOUT_SECS
            )));
        }

        self.connection_url().map(|_| ())
    }
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("redis_address", &self.redis_address)
            .field(
                "redis_password",
                &self.redis_password.as_ref().map(|_| "***"),
            )
            .field("redis_database", &self.redis_database)
            .field(
                "redis_operation_timeout_secs",
                &self.redis_operation_timeout_secs,
            )
            .finish()
    }
}
