use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::SessionCache;
use crate::{CacheError, CacheResult, TRACING_TARGET_CACHE};

/// [`SessionCache`] backed by Redis `SETEX`, `GET` and `DEL`.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    timeout: Duration,
}

impl RedisCache {
    /// Creates a cache over an existing connection manager.
    pub fn new(connection: ConnectionManager, timeout: Duration) -> Self {
        Self {
            connection,
            timeout,
        }
    }

    async fn bounded<F, R>(&self, operation: &'static str, call: F) -> CacheResult<R>
    where
        F: Future<Output = redis::RedisResult<R>>,
    {
        with_timeout(operation, self.timeout, call).await
    }
}

/// Runs a Redis command, failing with [`CacheError::Timeout`] once `timeout` elapses.
pub(crate) async fn with_timeout<F, R>(
    operation: &'static str,
    timeout: Duration,
    call: F,
) -> CacheResult<R>
where
    F: Future<Output = redis::RedisResult<R>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result.map_err(CacheError::from),
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_CACHE,
                operation,
                timeout_ms = timeout.as_millis() as u64,
                "Cache operation timed out"
            );
            Err(CacheError::Timeout { operation, timeout })
        }
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    #[tracing::instrument(skip_all, target = TRACING_TARGET_CACHE, fields(ttl_secs = ttl.as_secs()))]
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        if ttl.as_secs() == 0 {
            return Err(CacheError::Config(
                "cache ttl must be at least one second".to_owned(),
            ));
        }

        let mut connection = self.connection.clone();
        self.bounded("set", async move {
            let _: () = connection.set_ex(key, value, ttl.as_secs()).await?;
            Ok(())
        })
        .await
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_CACHE)]
    async fn get(&self, key: &str) -> CacheResult<String> {
        let mut connection = self.connection.clone();
        let value: Option<String> = self
            .bounded("get", async move { connection.get(key).await })
            .await?;

        value.ok_or(CacheError::KeyNotFound)
    }

    #[tracing::instrument(skip_all, target = TRACING_TARGET_CACHE)]
    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let mut connection = self.connection.clone();
        self.bounded("delete", async move { connection.del(key).await })
            .await
    }
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
