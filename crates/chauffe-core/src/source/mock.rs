use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::types::BlockchainSummary;

use super::BlockchainSource;

/// A mock CloudManager for testing. Returns canned summaries per user UUID,
/// populated via the builder pattern, and counts summary fetches.
///
/// A UUID without a canned summary gets an empty one. A configured failure
/// applies to every summary fetch until cleared with [`MockSource::recover`].
pub struct MockSource {
    summaries: HashMap<String, BlockchainSummary>,
    failure: Mutex<Option<SourceError>>,
    health: serde_json::Value,
    summary_calls: AtomicUsize,
}

impl MockSource {
    pub fn builder() -> MockSourceBuilder {
        MockSourceBuilder {
            summaries: HashMap::new(),
            failure: None,
            health: serde_json::json!({ "success": true, "status": "healthy" }),
        }
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    fn current_failure(&self) -> Option<SourceError> {
        self.failure
            .lock()
            .expect("mock failure lock poisoned")
            .clone()
    }

    pub fn recover(&self) {
        *self.failure.lock().expect("mock failure lock poisoned") = None;
    }
}

pub struct MockSourceBuilder {
    summaries: HashMap<String, BlockchainSummary>,
    failure: Option<SourceError>,
    health: serde_json::Value,
}

impl MockSourceBuilder {
    pub fn with_summary(mut self, user_uuid: &str, summary: BlockchainSummary) -> Self {
        self.summaries.insert(user_uuid.to_owned(), summary);
        self
    }

    pub fn failing_with(mut self, err: SourceError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn with_health(mut self, health: serde_json::Value) -> Self {
        self.health = health;
        self
    }

    pub fn build(self) -> MockSource {
        MockSource {
            summaries: self.summaries,
            failure: Mutex::new(self.failure),
            health: self.health,
            summary_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlockchainSource for MockSource {
    async fn user_summary(&self, user_uuid: &str) -> Result<BlockchainSummary, SourceError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.current_failure() {
            return Err(err);
        }
        Ok(self.summaries.get(user_uuid).cloned().unwrap_or_default())
    }

    async fn health(&self) -> Result<serde_json::Value, SourceError> {
        if let Some(err) = self.current_failure() {
            return Err(err);
        }
        Ok(self.health.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_uuid_gets_empty_summary() {
        let source = MockSource::builder().build();
        let summary = source.user_summary("nobody").await.unwrap();
        assert_eq!(summary, BlockchainSummary::default());
        assert_eq!(source.summary_calls(), 1);
    }

    #[tokio::test]
    async fn failure_applies_until_recovered() {
        let source = MockSource::builder()
            .failing_with(SourceError::Timeout { after_secs: 10 })
            .with_health(serde_json::json!({ "status": "healthy" }))
            .build();
        assert!(source.user_summary("u").await.unwrap_err().is_timeout());
        assert!(source.health().await.is_err());

        source.recover();
        assert!(source.user_summary("u").await.is_ok());
        assert_eq!(source.health().await.unwrap()["status"], "healthy");
        assert_eq!(source.summary_calls(), 2);
    }
}
