//! Shared test helpers for `chauffe-core` unit tests.
//!
//! Provides a controllable clock and blockchain summary fixtures so tests
//! across modules build their dummy data the same way.

use std::sync::Mutex;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};

use crate::clock::Clock;
use crate::error::StoreError;
use crate::store::CacheStore;
use crate::types::{BlockchainSummary, ControllerName};

// ==============================================================================
// Manual Clock
// ==============================================================================

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        *self.now.lock().expect("clock lock poisoned") += Duration::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().expect("clock lock poisoned")
    }
}

// ==============================================================================
// Failing Store
// ==============================================================================

/// A store whose backend is always down.
pub struct FailingStore;

impl FailingStore {
    fn down() -> StoreError {
        StoreError::Backend("connection refused".to_owned())
    }
}

#[async_trait]
impl CacheStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(Self::down())
    }

    async fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl: std::time::Duration,
    ) -> Result<(), StoreError> {
        Err(Self::down())
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Err(Self::down())
    }
}

// ==============================================================================
// Summary Fixtures
// ==============================================================================

/// A non-trivial summary with one controller, distinguishable from the
/// zeroed default a failed fetch produces.
pub fn sample_summary(blocks: u64) -> BlockchainSummary {
    BlockchainSummary {
        total_blockchains: 1,
        total_blocks: blocks,
        total_transactions: 2,
        total_chauffecoins: 0,
        controller_names: vec![ControllerName {
            blockchain_id: "bc-1".to_owned(),
            controller_name: "Alice Doe".to_owned(),
            controller_role: "manager".to_owned(),
            created_at: Some("2025-01-01T00:00:00Z".to_owned()),
            blockchain_name: "Garage".to_owned(),
        }],
        dloid_parameters: Vec::new(),
    }
}
