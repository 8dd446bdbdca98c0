use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::SessionCache;
use crate::{CacheError, CacheResult};

/// In-process [`SessionCache`] with lazy expiry.
///
/// Expired entries are treated as absent and dropped on the next write.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.expires_at > now).count()
    }

    /// Returns whether the cache holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        if ttl.as_secs() == 0 {
            return Err(CacheError::Config(
                "cache ttl must be at least one second".to_owned(),
            ));
        }

        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
            .ok_or(CacheError::KeyNotFound)
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let removed = entries
            .remove(key)
            .is_some_and(|entry| entry.expires_at > now);
        Ok(u64::from(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_delete() -> anyhow::Result<()> {
        let cache = MemoryCache::new();
        cache.set("token", "account", Duration::from_secs(60)).await?;
        assert_eq!(cache.get("token").await?, "account");

        assert_eq!(cache.delete("token").await?, 1);
        assert_eq!(cache.delete("token").await?, 0);
        assert!(cache.get("token").await.is_err_and(|e| e.is_not_found()));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() -> anyhow::Result<()> {
        let cache = MemoryCache::new();
        cache.set("token", "account", Duration::from_secs(10)).await?;

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("token").await?, "account");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get("token").await.is_err_and(|e| e.is_not_found()));
        assert!(cache.is_empty().await);
        Ok(())
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let cache = MemoryCache::new();
        let result = cache.set("token", "account", Duration::ZERO).await;
        assert!(matches!(result, Err(CacheError::Config(_))));
    }
}
