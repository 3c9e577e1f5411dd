//! CloudManager wire types.
//!
//! Only the fields the summary aggregation reads are modelled; everything
//! else in the service's responses is ignored.

use serde::Deserialize;

// ==============================================================================
// Blockchain Listing
// ==============================================================================

/// Per-blockchain metadata from `GET /api/blockchains`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlockchainMetadata {
    pub user_uuid: Option<String>,
    pub name: Option<String>,
    pub controller_name: Option<String>,
    pub controller_role: Option<String>,
    pub created_at: Option<String>,
    pub genesis_dloid: Option<String>,
    pub dloid_params: Option<serde_json::Value>,
    pub dloid_info: Option<serde_json::Value>,
}

// ==============================================================================
// Blockchain Detail
// ==============================================================================

/// Response of `GET /api/blockchains/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlockchainDetail {
    pub chain_info: ChainInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChainInfo {
    pub length: u64,
    pub pending_transactions: u64,
}

/// A blockchain owned by the user being summarized.
#[derive(Debug, Clone)]
pub struct UserBlockchain {
    pub blockchain_id: String,
    pub metadata: BlockchainMetadata,
    pub details: BlockchainDetail,
}
