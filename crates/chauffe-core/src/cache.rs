//! Profile data cache.
//!
//! Read-through cache in front of the CloudManager blockchain service. Each
//! user has one slot holding the last fetched [`ProfilePayload`] together
//! with the metadata needed to decide whether it may still be served:
//!
//! - the fingerprint of the user's purchase state when the data was fetched;
//!   a different fingerprint on read means the user bought something since;
//! - the fetch time, checked against the configured maximum age.
//!
//! Payload and metadata live in a single store record, so a reader never
//! pairs the metadata of one write with the payload of another.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, SourceError, StoreError};
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::ledger::UserStateProvider;
use crate::source::BlockchainSource;
use crate::store::CacheStore;
use crate::types::{BlockchainSummary, CacheSettings, CacheStats, ProfilePayload, UserId};

const KEY_NAMESPACE: &str = "profile_data";

// ==============================================================================
// Cache Records
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    pub user_fingerprint: Fingerprint,
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
    pub schema_version: String,
}

/// What the store holds for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    meta: CacheMeta,
    payload: ProfilePayload,
}

/// Outcome of inspecting a user's cache slot.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Empty,
    Valid(ProfilePayload),
    /// Purchase state changed since the payload was cached. Evicted.
    StaleFingerprint,
    /// Payload outlived the configured maximum age. Evicted.
    StaleExpired,
}

// ==============================================================================
// Profile Cache
// ==============================================================================

/// Shared across request handlers via `Arc<ProfileCache>`. Performs no
/// locking of its own: concurrent misses for one user each fetch and write.
pub struct ProfileCache {
    store: Arc<dyn CacheStore>,
    source: Arc<dyn BlockchainSource>,
    users: Arc<dyn UserStateProvider>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
}

impl ProfileCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn BlockchainSource>,
        users: Arc<dyn UserStateProvider>,
        settings: CacheSettings,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self {
            store,
            source,
            users,
            clock: Arc::new(SystemClock),
            settings,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub fn cache_key(&self, user: UserId) -> String {
        format!(
            "{KEY_NAMESPACE}:{}:user_{user}",
            self.settings.schema_version
        )
    }

    pub async fn current_fingerprint(&self, user: UserId) -> Result<Fingerprint, CoreError> {
        let state = self.users.purchase_state(user).await?;
        Ok(fingerprint(state.as_ref()))
    }

    // ========================================================================
    // Read path
    // ========================================================================

    /// Inspect the user's slot, evicting it if it is stale or unreadable.
    pub async fn lookup(&self, user: UserId) -> Result<CacheLookup, CoreError> {
        let key = self.cache_key(user);
        let Some(raw) = self.store.get(&key).await? else {
            info!(user.id = %user, "profile cache miss");
            return Ok(CacheLookup::Empty);
        };

        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(user.id = %user, error = %e, "discarding undecodable profile cache record");
                self.store.delete(&key).await?;
                return Ok(CacheLookup::Empty);
            }
        };
        if record.meta.schema_version != self.settings.schema_version {
            warn!(
                user.id = %user,
                found = %record.meta.schema_version,
                "discarding profile cache record with foreign schema version"
            );
            self.store.delete(&key).await?;
            return Ok(CacheLookup::Empty);
        }

        let current = self.current_fingerprint(user).await?;
        if current.is_no_profile() || current != record.meta.user_fingerprint {
            info!(
                user.id = %user,
                cached = %record.meta.user_fingerprint,
                current = %current,
                "profile cache invalidated - purchase data changed"
            );
            self.store.delete(&key).await?;
            return Ok(CacheLookup::StaleFingerprint);
        }

        let age_secs = (self.clock.now() - record.meta.cached_at).as_seconds_f64();
        if age_secs > self.settings.max_age.as_secs_f64() {
            info!(user.id = %user, cache.age_secs = age_secs, "profile cache expired");
            self.store.delete(&key).await?;
            return Ok(CacheLookup::StaleExpired);
        }

        info!(user.id = %user, cache.age_secs = age_secs, "profile cache hit");
        Ok(CacheLookup::Valid(record.payload))
    }

    /// Cached payload if it is still valid; never fetches.
    pub async fn get_cached_data(&self, user: UserId) -> Result<Option<ProfilePayload>, CoreError> {
        match self.lookup(user).await? {
            CacheLookup::Valid(payload) => Ok(Some(payload)),
            CacheLookup::Empty | CacheLookup::StaleFingerprint | CacheLookup::StaleExpired => {
                Ok(None)
            }
        }
    }

    // ========================================================================
    // Write path
    // ========================================================================

    /// Cache `payload` under the user's current fingerprint, replacing
    /// whatever the slot held.
    pub async fn store_data(&self, user: UserId, payload: &ProfilePayload) -> Result<(), CoreError> {
        let current = self.current_fingerprint(user).await?;
        self.write_record(user, current, payload).await
    }

    async fn write_record(
        &self,
        user: UserId,
        user_fingerprint: Fingerprint,
        payload: &ProfilePayload,
    ) -> Result<(), CoreError> {
        let record = CacheRecord {
            meta: CacheMeta {
                user_fingerprint,
                cached_at: self.clock.now(),
                schema_version: self.settings.schema_version.clone(),
            },
            payload: payload.clone(),
        };
        let encoded = serde_json::to_string(&record).map_err(StoreError::from)?;
        self.store
            .set(&self.cache_key(user), encoded, self.settings.store_ttl)
            .await?;
        info!(user.id = %user, "cached profile data");
        Ok(())
    }

    // ========================================================================
    // Read-through
    // ========================================================================

    /// Serve the cached payload, or fetch, cache and return a fresh one.
    ///
    /// Source failures do not fail this call: they come back embedded in
    /// the payload (and are cached like any other result). Store failures
    /// are logged and degrade to an uncached fetch. Only user-state errors
    /// are returned.
    pub async fn get_or_fetch(&self, user: UserId) -> Result<ProfilePayload, CoreError> {
        match self.lookup(user).await {
            Ok(CacheLookup::Valid(payload)) => return Ok(payload),
            Ok(_) => {}
            Err(CoreError::Store(e)) => {
                warn!(user.id = %user, error = %e, "profile cache read failed; fetching fresh data");
            }
            Err(other) => return Err(other),
        }

        info!(user.id = %user, "fetching fresh profile data");
        let profile = self.users.ensure_profile(user).await?;
        // Captured before the fetch: if an order completes mid-fetch, the
        // record is written under the old fingerprint and the next read
        // discards it.
        let fetched_under = self.current_fingerprint(user).await?;

        let (summary, health) = futures::join!(
            self.source.user_summary(&profile.uuid),
            self.source.health()
        );
        let payload = normalize_fetch(summary, health, self.clock.now());
        if let Some(message) = &payload.blockchain_error {
            warn!(user.id = %user, error = %message, "blockchain summary fetch failed");
        }

        if let Err(e) = self.write_record(user, fetched_under, &payload).await {
            warn!(user.id = %user, error = %e, "failed to cache profile data");
        }
        Ok(payload)
    }

    // ========================================================================
    // Invalidation and stats
    // ========================================================================

    /// Drop the user's slot. Dropping an empty slot is a no-op.
    pub async fn invalidate(&self, user: impl Into<UserId>) -> Result<(), CoreError> {
        let user = user.into();
        self.store.delete(&self.cache_key(user)).await?;
        info!(user.id = %user, "invalidated profile cache");
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cache_backend: self.store.backend().to_owned(),
            cache_version: self.settings.schema_version.clone(),
            cache_timeout: self.settings.store_ttl.as_secs(),
        }
    }
}

/// Shape a fetch outcome into a cacheable payload. A failed summary fetch
/// yields a zeroed summary plus the failure details; a failed health check
/// yields an error health document.
fn normalize_fetch(
    summary: Result<BlockchainSummary, SourceError>,
    health: Result<serde_json::Value, SourceError>,
    fetched_at: OffsetDateTime,
) -> ProfilePayload {
    let cloudmanager_health = health.unwrap_or_else(|e| {
        serde_json::json!({
            "success": false,
            "error": e.to_string(),
            "connection_error": e.is_connection_error(),
            "timeout_error": e.is_timeout(),
        })
    });

    match summary {
        Ok(blockchain_summary) => ProfilePayload {
            blockchain_summary,
            blockchain_error: None,
            cloudmanager_health,
            connection_error: false,
            timeout_error: false,
            fetch_timestamp: fetched_at,
        },
        Err(e) => ProfilePayload {
            blockchain_summary: BlockchainSummary::default(),
            blockchain_error: Some(e.to_string()),
            cloudmanager_health,
            connection_error: e.is_connection_error(),
            timeout_error: e.is_timeout(),
            fetch_timestamp: fetched_at,
        },
    }
}
