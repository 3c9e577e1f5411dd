use crate::types::{OrderId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("blockchain source failure: {0}")]
    Source(#[from] SourceError),

    #[error("cache store failure: {0}")]
    Store(#[from] StoreError),

    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failures talking to the CloudManager blockchain service.
///
/// The connection and timeout variants are kept apart from the rest so the
/// profile view can tell users exactly why their blockchain data is missing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("CloudManager API unavailable - service may be down")]
    Unavailable { url: String },

    #[error("CloudManager API timeout after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("API returned status {code}")]
    Status { code: u16 },

    #[error("invalid CloudManager response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected error: {0}")]
    Transport(String),
}

impl SourceError {
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cache record codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}
