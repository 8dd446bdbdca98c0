//! Session cache capability and its backends.

mod memory_cache;
mod redis_cache;
mod refresh_token;

use std::time::Duration;

use async_trait::async_trait;
pub use memory_cache::MemoryCache;
pub use redis_cache::RedisCache;
pub use refresh_token::RefreshTokenStore;

use crate::CacheResult;

/// Short-lived string key/value storage with per-entry expiry.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value, for `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Returns the value stored under `key`.
    ///
    /// Fails with [`CacheError::KeyNotFound`] when the key is absent or expired.
    ///
    /// [`CacheError::KeyNotFound`]: crate::CacheError::KeyNotFound
    async fn get(&self, key: &str) -> CacheResult<String>;

    /// Removes `key`, returning how many entries were deleted.
    async fn delete(&self, key: &str) -> CacheResult<u64>;
}
