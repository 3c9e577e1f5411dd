//! Purchase-state fingerprints.
//!
//! A fingerprint is a 16-hex-character prefix of the SHA-256 digest of a
//! user's [`PurchaseState`], serialized as JSON with its keys in sorted
//! order. Cached profile data is tagged with the fingerprint it was fetched
//! under; a different fingerprint on read means the data is stale.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::types::PurchaseState;

/// Sentinel returned for users that have no profile record.
pub const NO_PROFILE: &str = "no_profile";

const FINGERPRINT_HEX_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn no_profile() -> Self {
        Self(NO_PROFILE.to_owned())
    }

    /// A sentinel fingerprint never validates cached data.
    pub fn is_no_profile(&self) -> bool {
        self.0 == NO_PROFILE
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Field order is alphabetical; serde emits struct fields in declaration order.
#[derive(Serialize)]
struct CanonicalState {
    completed_orders_count: u64,
    last_completed_order: Option<String>,
    total_licenses_purchased: u64,
}

/// Fingerprint a user's purchase state, or return the sentinel when the
/// user has no profile.
pub fn fingerprint(state: Option<&PurchaseState>) -> Fingerprint {
    let Some(state) = state else {
        return Fingerprint::no_profile();
    };

    let canonical = CanonicalState {
        completed_orders_count: state.completed_orders_count,
        last_completed_order: state.last_completed_order.map(format_timestamp),
        total_licenses_purchased: state.total_licenses_purchased,
    };
    let encoded =
        serde_json::to_vec(&canonical).expect("canonical purchase state always serializes");

    let digest = Sha256::digest(&encoded);
    let mut hex = hex::encode(digest);
    hex.truncate(FINGERPRINT_HEX_LEN);
    Fingerprint(hex)
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    // RFC 3339 cannot represent years past 9999; nanoseconds are still exact.
    ts.format(&Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp_nanos().to_string())
}
