use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::SessionCache;
use crate::{CacheResult, TRACING_TARGET_CACHE};

/// Maps issued refresh tokens to the account that owns them.
///
/// The token string itself is the cache key, so a lookup both proves the
/// token was issued by this service and yields its account.
#[derive(Clone)]
pub struct RefreshTokenStore {
    cache: Arc<dyn SessionCache>,
}

impl RefreshTokenStore {
    /// Creates a store over any session cache backend.
    pub fn new(cache: impl SessionCache + 'static) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Records that `token` belongs to `account_id` for `ttl`.
    #[tracing::instrument(skip(self, token), target = TRACING_TARGET_CACHE)]
    pub async fn store(&self, token: &str, account_id: &str, ttl: Duration) -> CacheResult<()> {
        self.cache.set(token, account_id, ttl).await?;
        tracing::debug!(target: TRACING_TARGET_CACHE, "Refresh token cached");
        Ok(())
    }

    /// Returns the account the token was issued to.
    pub async fn lookup(&self, token: &str) -> CacheResult<String> {
        self.cache.get(token).await
    }

    /// Revokes the token, returning whether it was present.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_CACHE)]
    pub async fn revoke(&self, token: &str) -> CacheResult<bool> {
        let deleted = self.cache.delete(token).await?;
        Ok(deleted > 0)
    }
}

impl fmt::Debug for RefreshTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;

    #[tokio::test]
    async fn store_lookup_revoke() -> anyhow::Result<()> {
        let tokens = RefreshTokenStore::new(MemoryCache::new());
        tokens
            .store("refresh.jwt.value", "65f1c0ffee", Duration::from_secs(3600))
            .await?;

        assert_eq!(tokens.lookup("refresh.jwt.value").await?, "65f1c0ffee");
        assert!(tokens.revoke("refresh.jwt.value").await?);
        assert!(!tokens.revoke("refresh.jwt.value").await?);
        assert!(tokens.lookup("refresh.jwt.value").await.is_err());
        Ok(())
    }
}
