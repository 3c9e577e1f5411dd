use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use tracing::{debug, error, trace, warn};

use crate::error::{CoreError, SourceError};
use crate::types::BlockchainSummary;

use super::super::types::{BlockchainDetail, BlockchainMetadata, UserBlockchain};
use super::super::BlockchainSource;
use super::connection::parse_base_url;
use super::parsing::{
    classify_transport_error, parse_blockchain_detail, parse_blockchain_listing, summarize,
};

const USER_AGENT: &str = "MyChauffe-WebApp/1.0";

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// CloudManager REST client.
///
/// Constructed once at startup and shared behind an `Arc`; the underlying
/// `reqwest::Client` pools connections across requests.
pub struct HttpCloudManagerClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    limiter: Option<DirectRateLimiter>,
}

impl HttpCloudManagerClient {
    /// Create a client for `base_url` (`http://` or `https://`).
    ///
    /// `timeout` bounds each whole request. If `requests_per_second` is set,
    /// outbound requests are throttled to that rate.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        requests_per_second: Option<u32>,
    ) -> Result<Self, CoreError> {
        if timeout.is_zero() {
            return Err(CoreError::InvalidConfig(
                "CloudManager timeout must be greater than zero".to_owned(),
            ));
        }
        let base_url = parse_base_url(base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .pool_max_idle_per_host(16)
            .tcp_nodelay(true)
            .build()
            .map_err(|e| CoreError::InvalidConfig(format!("build CloudManager client: {e}")))?;

        let limiter = match requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::InvalidConfig("requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            base_url,
            timeout,
            limiter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    async fn get_json(&self, endpoint: &str) -> Result<serde_json::Value, SourceError> {
        self.wait_for_rate_limit().await;
        let url = format!("{}{endpoint}", self.base_url);
        debug!(cm.endpoint = endpoint, "cloudmanager request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;
        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, &e))?;
        debug!(cm.endpoint = endpoint, %status, body_len = body.len(), "cloudmanager response");
        trace!(cm.endpoint = endpoint, body = %body, "cloudmanager response body");

        if status != StatusCode::OK {
            error!(cm.endpoint = endpoint, %status, body = %body, "cloudmanager API error");
            return Err(SourceError::Status {
                code: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            SourceError::InvalidResponse(format!("decode response from {endpoint}: {e}"))
        })
    }

    fn transport_error(&self, endpoint: &str, err: &reqwest::Error) -> SourceError {
        let mapped = classify_transport_error(err, &self.base_url, self.timeout);
        error!(
            cm.endpoint = endpoint,
            cm.url = %self.base_url,
            error = %err,
            "cloudmanager request failed"
        );
        mapped
    }

    // ========================================================================
    // Endpoints
    // ========================================================================

    pub async fn version(&self) -> Result<serde_json::Value, SourceError> {
        self.get_json("/api/version").await
    }

    pub async fn list_blockchains(
        &self,
    ) -> Result<Vec<(String, BlockchainMetadata)>, SourceError> {
        parse_blockchain_listing(self.get_json("/api/blockchains").await?)
    }

    pub async fn blockchain(&self, blockchain_id: &str) -> Result<BlockchainDetail, SourceError> {
        parse_blockchain_detail(
            self.get_json(&format!("/api/blockchains/{blockchain_id}"))
                .await?,
        )
    }

    /// Every blockchain whose metadata names `user_uuid` as its owner, with
    /// details. Detail lookups run concurrently; blockchains whose details
    /// cannot be fetched are left out.
    pub async fn user_blockchains(
        &self,
        user_uuid: &str,
    ) -> Result<Vec<UserBlockchain>, SourceError> {
        let owned: Vec<(String, BlockchainMetadata)> = self
            .list_blockchains()
            .await?
            .into_iter()
            .filter(|(_, metadata)| metadata.user_uuid.as_deref() == Some(user_uuid))
            .collect();

        let details = join_all(owned.iter().map(|(id, _)| self.blockchain(id))).await;

        let mut blockchains = Vec::with_capacity(owned.len());
        for ((blockchain_id, metadata), detail) in owned.into_iter().zip(details) {
            match detail {
                Ok(details) => blockchains.push(UserBlockchain {
                    blockchain_id,
                    metadata,
                    details,
                }),
                Err(e) => warn!(
                    blockchain.id = %blockchain_id,
                    error = %e,
                    "skipping blockchain whose details could not be fetched"
                ),
            }
        }
        Ok(blockchains)
    }
}

#[async_trait]
impl BlockchainSource for HttpCloudManagerClient {
    async fn user_summary(&self, user_uuid: &str) -> Result<BlockchainSummary, SourceError> {
        let blockchains = self.user_blockchains(user_uuid).await?;
        Ok(summarize(&blockchains))
    }

    async fn health(&self) -> Result<serde_json::Value, SourceError> {
        self.get_json("/api/health").await
    }
}
