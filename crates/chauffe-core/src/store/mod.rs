//! Key/value stores backing the profile cache.
//!
//! Defines the [`CacheStore`] trait and provides a bounded in-process store
//! ([`MemoryStore`]) plus a Redis adapter ([`RedisStore`]) for deployments
//! where several server processes share one cache.

mod memory;
mod remote;

pub use self::memory::{MemoryStore, DEFAULT_MEMORY_STORE_CAP};
pub use self::remote::RedisStore;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// String-valued key/value store with per-key expiry.
///
/// Single-key operations are expected to be atomic. Nothing spans keys.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short identifier reported in cache stats.
    fn backend(&self) -> &'static str;

    /// Fetch a live value. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value`, replacing anything under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Remove `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
