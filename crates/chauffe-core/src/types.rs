use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::CoreError;

// ==============================================================================
// Identifiers
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&UserProfile> for UserId {
    fn from(profile: &UserProfile) -> Self {
        profile.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==============================================================================
// Users and Orders
// ==============================================================================

/// Extended per-user record holding the CHAUFFEcoin balance, the license
/// counter and the UUID the blockchain service knows the user by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub uuid: String,
    pub chauffecoins_balance: i64,
    pub total_licenses_purchased: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub quantity: u32,
    pub total_amount_cents: u64,
    pub status: OrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The slice of a user's purchase history that profile data depends on.
/// Any change here means a cached profile payload may be out of date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseState {
    pub total_licenses_purchased: u64,
    pub completed_orders_count: u64,
    pub last_completed_order: Option<OffsetDateTime>,
}

// ==============================================================================
// Blockchain Summary
// ==============================================================================

/// Aggregated view of every blockchain the service manages for one user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockchainSummary {
    pub total_blockchains: u64,
    pub total_blocks: u64,
    pub total_transactions: u64,
    pub total_chauffecoins: u64,
    pub controller_names: Vec<ControllerName>,
    pub dloid_parameters: Vec<DloidParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerName {
    pub blockchain_id: String,
    pub controller_name: String,
    pub controller_role: String,
    pub created_at: Option<String>,
    pub blockchain_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DloidParameter {
    pub blockchain_id: String,
    pub dloid_hex: String,
    pub dloid_params: serde_json::Value,
    pub dloid_info: serde_json::Value,
    pub created_at: Option<String>,
}

// ==============================================================================
// Profile Payload
// ==============================================================================

/// Everything the profile view renders from the blockchain service.
///
/// Fetch failures are embedded here rather than returned as errors: a
/// payload built from a failed fetch carries a zeroed summary, the failure
/// message and the connection/timeout flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub blockchain_summary: BlockchainSummary,
    pub blockchain_error: Option<String>,
    pub cloudmanager_health: serde_json::Value,
    pub connection_error: bool,
    pub timeout_error: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub fetch_timestamp: OffsetDateTime,
}

impl ProfilePayload {
    pub fn is_degraded(&self) -> bool {
        self.blockchain_error.is_some()
    }
}

// ==============================================================================
// Cache Settings and Stats
// ==============================================================================

pub const DEFAULT_CACHE_VERSION: &str = "v1.0.0";
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_secs(3600);

/// Tuning knobs for the profile cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Oldest payload the read path will still serve.
    pub max_age: Duration,
    /// Expiry handed to the store on every write.
    pub store_ttl: Duration,
    /// Keyspace partition; bump when the cached record layout changes.
    pub schema_version: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_CACHE_TIMEOUT,
            store_ttl: DEFAULT_CACHE_TIMEOUT,
            schema_version: DEFAULT_CACHE_VERSION.to_owned(),
        }
    }
}

impl CacheSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_age.is_zero() {
            return Err(CoreError::InvalidConfig(
                "profile cache max age must be at least 1 second".to_owned(),
            ));
        }
        if self.store_ttl.as_secs() == 0 {
            return Err(CoreError::InvalidConfig(
                "profile cache ttl must be at least 1 second".to_owned(),
            ));
        }
        if self.schema_version.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "profile cache version must not be empty".to_owned(),
            ));
        }
        if self.schema_version.contains(':') {
            return Err(CoreError::InvalidConfig(format!(
                "profile cache version `{}` must not contain `:`",
                self.schema_version
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cache_backend: String,
    pub cache_version: String,
    pub cache_timeout: u64,
}
