use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use redis::Client;
use redis::aio::ConnectionManager;

use crate::{CacheError, CacheResult, RedisCache, RedisConfig, TRACING_TARGET_CLIENT};

/// Redis client holding a multiplexed, automatically reconnecting connection.
///
/// Cheap to clone; all clones share the same connection manager.
#[derive(Clone)]
pub struct RedisClient {
    inner: Arc<RedisClientInner>,
}

struct RedisClientInner {
    manager: ConnectionManager,
    config: RedisConfig,
}

impl RedisClient {
    /// Connects to the configured server and verifies it answers `PING`.
    #[tracing::instrument(
        skip(config),
        target = TRACING_TARGET_CLIENT,
        fields(address = %config.redis_address, database = config.redis_database)
    )]
    pub async fn connect(config: RedisConfig) -> CacheResult<Self> {
        config.validate()?;
        tracing::info!(target: TRACING_TARGET_CLIENT, "Initializing cache client");

        let url = config.connection_url()?;
        let client = Client::open(url.as_str()).map_err(CacheError::Connection)?;

        let timeout = config.operation_timeout();
        let manager = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout {
                operation: "connect",
                timeout,
            })?
            .map_err(CacheError::Connection)?;

        let this = Self {
            inner: Arc::new(RedisClientInner { manager, config }),
        };

        this.ping().await.inspect_err(|e| {
            tracing::error!(target: TRACING_TARGET_CLIENT, error = %e, "Cache connectivity test failed");
        })?;

        tracing::info!(target: TRACING_TARGET_CLIENT, "Cache client initialized");
        Ok(this)
    }

    /// Sends `PING`, bounded by the operation timeout.
    pub async fn ping(&self) -> CacheResult<()> {
        let mut connection = self.connection();
        let timeout = self.operation_timeout();

        let reply: String = tokio::time::timeout(
            timeout,
            redis::cmd("PING").query_async(&mut connection),
        )
        .await
        .map_err(|_| CacheError::Timeout {
            operation: "ping",
            timeout,
        })??;

        tracing::debug!(target: TRACING_TARGET_CLIENT, %reply, "Cache ping succeeded");
        Ok(())
    }

    /// Returns a session cache sharing this client's connection.
    pub fn session_cache(&self) -> RedisCache {
        RedisCache::new(self.connection(), self.operation_timeout())
    }

    /// Returns a handle to the shared connection manager.
    #[inline]
    pub fn connection(&self) -> ConnectionManager {
        self.inner.manager.clone()
    }

    /// Returns the per-operation timeout.
    #[inline]
    pub fn operation_timeout(&self) -> Duration {
        self.inner.config.operation_timeout()
    }

    /// Returns the configuration used by this client.
    #[inline]
    pub fn config(&self) -> &RedisConfig {
        &self.inner.config
    }
}

impl fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
