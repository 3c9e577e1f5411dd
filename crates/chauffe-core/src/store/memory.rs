use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::error::{CoreError, StoreError};

use super::CacheStore;

/// Default number of keys kept by [`MemoryStore::default`].
pub const DEFAULT_MEMORY_STORE_CAP: usize = 10_000;

struct StoredValue {
    value: String,
    /// `None` when the TTL reaches past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn is_live(&self) -> bool {
        self.expires_at.map_or(true, |deadline| deadline > Instant::now())
    }
}

/// Process-local store: a bounded LRU map whose entries carry a deadline.
///
/// Expired entries are dropped lazily when read. Under memory pressure the
/// least recently used key is evicted regardless of its deadline.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, StoredValue>>,
}

impl MemoryStore {
    pub fn with_capacity(capacity: usize) -> Result<Self, CoreError> {
        let capacity = NonZeroUsize::new(capacity).ok_or_else(|| {
            CoreError::InvalidConfig("memory cache capacity must be at least 1".to_owned())
        })?;
        Ok(Self {
            entries: RwLock::new(LruCache::new(capacity)),
        })
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: RwLock::new(LruCache::new(
                NonZeroUsize::new(DEFAULT_MEMORY_STORE_CAP)
                    .expect("DEFAULT_MEMORY_STORE_CAP is non-zero"),
            )),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            None => return Ok(None),
            Some(stored) if stored.is_live() => {
                return Ok(Some(stored.value.clone()));
            }
            Some(_) => {}
        }
        entries.pop(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let stored = StoredValue {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.write().await.put(key.to_owned(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = MemoryStore::default();
        store.set("k", "v".to_owned(), HOUR).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let store = MemoryStore::default();
        store.set("k", "old".to_owned(), HOUR).await.unwrap();
        store.set("k", "new".to_owned(), HOUR).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("new"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_read_as_absent_and_are_dropped() {
        let store = MemoryStore::default();
        store
            .set("k", "v".to_owned(), Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unrepresentable_ttl_never_expires() {
        let store = MemoryStore::default();
        store
            .set("k", "v".to_owned(), Duration::from_secs(u64::MAX))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryStore::default();
        store.set("k", "v".to_owned(), HOUR).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn capacity_bound_evicts_least_recently_used() {
        let store = MemoryStore::with_capacity(2).unwrap();
        store.set("a", "1".to_owned(), HOUR).await.unwrap();
        store.set("b", "2".to_owned(), HOUR).await.unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        assert!(store.get("a").await.unwrap().is_some());
        store.set("c", "3".to_owned(), HOUR).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = MemoryStore::with_capacity(0)
            .err()
            .expect("zero capacity must be rejected");
        assert!(err.to_string().contains("capacity"));
    }
}
