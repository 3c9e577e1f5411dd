use std::time::Duration;

use tracing::warn;

use crate::error::SourceError;
use crate::types::{BlockchainSummary, ControllerName, DloidParameter};

use super::super::types::{BlockchainDetail, BlockchainMetadata, UserBlockchain};

const UNKNOWN: &str = "Unknown";

// ==============================================================================
// Transport Errors
// ==============================================================================

/// Map a `reqwest` failure onto the source error taxonomy.
pub(super) fn classify_transport_error(
    err: &reqwest::Error,
    base_url: &str,
    timeout: Duration,
) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            after_secs: timeout.as_secs(),
        }
    } else if err.is_connect() {
        SourceError::Unavailable {
            url: base_url.to_owned(),
        }
    } else {
        SourceError::Transport(err.to_string())
    }
}

// ==============================================================================
// Response Envelopes
// ==============================================================================

/// CloudManager wraps results in `{"success": true, ...}`. Anything else is
/// reported with the service's own `error` message when it sent one.
pub(super) fn require_success(value: serde_json::Value) -> Result<serde_json::Value, SourceError> {
    if value.get("success").and_then(serde_json::Value::as_bool) == Some(true) {
        return Ok(value);
    }
    let message = value
        .get("error")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("response did not report success");
    Err(SourceError::InvalidResponse(message.to_owned()))
}

pub(super) fn parse_blockchain_listing(
    value: serde_json::Value,
) -> Result<Vec<(String, BlockchainMetadata)>, SourceError> {
    let mut value = require_success(value)?;
    let blockchains = match value.get_mut("blockchains").map(serde_json::Value::take) {
        None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
        Some(serde_json::Value::Object(map)) => map,
        Some(other) => {
            return Err(SourceError::InvalidResponse(format!(
                "`blockchains` must be an object, got {other}"
            )))
        }
    };

    let mut listing = Vec::with_capacity(blockchains.len());
    for (blockchain_id, raw) in blockchains {
        match serde_json::from_value::<BlockchainMetadata>(raw) {
            Ok(metadata) => listing.push((blockchain_id, metadata)),
            Err(e) => warn!(
                blockchain.id = %blockchain_id,
                error = %e,
                "skipping blockchain with malformed metadata"
            ),
        }
    }
    Ok(listing)
}

pub(super) fn parse_blockchain_detail(
    value: serde_json::Value,
) -> Result<BlockchainDetail, SourceError> {
    let value = require_success(value)?;
    serde_json::from_value(value)
        .map_err(|e| SourceError::InvalidResponse(format!("invalid blockchain detail: {e}")))
}

// ==============================================================================
// Summary Aggregation
// ==============================================================================

pub(super) fn summarize(blockchains: &[UserBlockchain]) -> BlockchainSummary {
    let mut summary = BlockchainSummary {
        total_blockchains: blockchains.len() as u64,
        ..BlockchainSummary::default()
    };

    for blockchain in blockchains {
        let metadata = &blockchain.metadata;
        let chain_info = &blockchain.details.chain_info;
        summary.total_blocks += chain_info.length;
        summary.total_transactions += chain_info.pending_transactions;

        if let Some(controller_name) = metadata
            .controller_name
            .as_deref()
            .filter(|name| !name.is_empty())
        {
            summary.controller_names.push(ControllerName {
                blockchain_id: blockchain.blockchain_id.clone(),
                controller_name: controller_name.to_owned(),
                controller_role: metadata
                    .controller_role
                    .clone()
                    .unwrap_or_else(|| UNKNOWN.to_owned()),
                created_at: metadata.created_at.clone(),
                blockchain_name: metadata.name.clone().unwrap_or_else(|| UNKNOWN.to_owned()),
            });
        }

        if let Some(dloid_info) = metadata.dloid_info.as_ref().filter(|v| is_present(v)) {
            summary.dloid_parameters.push(DloidParameter {
                blockchain_id: blockchain.blockchain_id.clone(),
                dloid_hex: metadata.genesis_dloid.clone().unwrap_or_default(),
                dloid_params: metadata
                    .dloid_params
                    .clone()
                    .unwrap_or_else(|| serde_json::Value::String(String::new())),
                dloid_info: dloid_info.clone(),
                created_at: metadata.created_at.clone(),
            });
        }
    }

    summary
}

/// Whether a metadata value carries anything: empty objects, arrays and
/// strings count as absent.
fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
        serde_json::Value::Number(n) => n.as_f64() != Some(0.0),
    }
}
