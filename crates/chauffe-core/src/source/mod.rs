//! CloudManager blockchain service abstraction layer.
//!
//! Defines the [`BlockchainSource`] trait and provides an HTTP
//! implementation ([`HttpCloudManagerClient`]) plus a test mock
//! (`mock::MockSource`).

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::HttpCloudManagerClient;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::BlockchainSummary;

/// The CloudManager calls the profile cache needs.
///
/// Implementations own their connection handling and enforce their own
/// request timeouts; callers never cancel an in-flight fetch.
#[async_trait]
pub trait BlockchainSource: Send + Sync {
    /// Aggregate every blockchain registered under `user_uuid`.
    async fn user_summary(&self, user_uuid: &str) -> Result<BlockchainSummary, SourceError>;

    /// Service health and version document, passed through as-is.
    async fn health(&self) -> Result<serde_json::Value, SourceError>;
}
