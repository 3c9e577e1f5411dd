use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::cache::ProfileCache;
use crate::ledger::OrderObserver;
use crate::types::{Order, OrderStatus};

/// Drops a user's cached profile whenever one of their orders is written in
/// the `completed` state.
///
/// This only saves a reader from discovering the change through a
/// fingerprint mismatch; the read path stays correct without it.
pub struct ProfileCacheInvalidator {
    // Weak: the ledger owning this observer is itself held by the cache.
    cache: Weak<ProfileCache>,
}

impl ProfileCacheInvalidator {
    pub fn new(cache: &Arc<ProfileCache>) -> Self {
        Self {
            cache: Arc::downgrade(cache),
        }
    }
}

#[async_trait]
impl OrderObserver for ProfileCacheInvalidator {
    async fn order_saved(&self, order: &Order) {
        if order.status != OrderStatus::Completed {
            return;
        }
        let Some(cache) = self.cache.upgrade() else {
            debug!(order.id = %order.id, "profile cache dropped; skipping invalidation");
            return;
        };

        match cache.invalidate(order.user_id).await {
            Ok(()) => info!(
                user.id = %order.user_id,
                order.id = %order.id,
                "invalidated profile cache due to completed order"
            ),
            Err(e) => warn!(
                user.id = %order.user_id,
                order.id = %order.id,
                error = %e,
                "failed to invalidate profile cache for completed order"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{OrderLedger, UserStateProvider};
    use crate::source::mock::MockSource;
    use crate::store::MemoryStore;
    use crate::types::{CacheSettings, UserId};

    const USER: UserId = UserId(3);

    async fn wired() -> (Arc<ProfileCache>, Arc<OrderLedger>, Arc<MemoryStore>, Arc<MockSource>) {
        let ledger = Arc::new(OrderLedger::new());
        ledger.register_user(USER).await;
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(MockSource::builder().build());
        let cache = Arc::new(
            ProfileCache::new(
                store.clone(),
                source.clone(),
                ledger.clone(),
                CacheSettings::default(),
            )
            .expect("default settings are valid"),
        );
        ledger
            .subscribe(Arc::new(ProfileCacheInvalidator::new(&cache)))
            .await;
        (cache, ledger, store, source)
    }

    #[tokio::test]
    async fn completing_an_order_evicts_the_owner_slot() {
        let (cache, ledger, store, source) = wired().await;
        cache.get_or_fetch(USER).await.unwrap();
        assert!(!store.is_empty().await);

        let order = ledger.place_order(USER, 1, 9_900).await.unwrap();
        ledger.complete_order(order.id).await.unwrap();

        // Evicted by the hook, not by a read-side fingerprint check.
        assert!(store.is_empty().await);
        assert!(cache.get_cached_data(USER).await.unwrap().is_none());

        cache.get_or_fetch(USER).await.unwrap();
        assert_eq!(source.summary_calls(), 2);
    }

    #[tokio::test]
    async fn non_completed_writes_leave_the_slot_alone() {
        let (cache, ledger, store, _) = wired().await;
        ledger.ensure_profile(USER).await.unwrap();
        let order = ledger.place_order(USER, 1, 9_900).await.unwrap();
        cache.get_or_fetch(USER).await.unwrap();

        ledger
            .set_order_status(order.id, OrderStatus::Failed)
            .await
            .unwrap();
        assert!(!store.is_empty().await);
        assert!(cache.get_cached_data(USER).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn other_users_slots_survive() {
        let (cache, ledger, store, _) = wired().await;
        let other = UserId(4);
        ledger.register_user(other).await;
        cache.get_or_fetch(other).await.unwrap();

        let order = ledger.place_order(USER, 1, 9_900).await.unwrap();
        ledger.complete_order(order.id).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(cache.get_cached_data(other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn dropped_cache_is_ignored() {
        let (cache, ledger, _, _) = wired().await;
        drop(cache);
        let order = ledger.place_order(USER, 1, 9_900).await.unwrap();
        assert!(ledger.complete_order(order.id).await.is_ok());
    }
}
