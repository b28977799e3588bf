//! Matching backend client
//!
//! `MatchApi` is the seam between the engine and the network. The engine
//! only ever talks to a `dyn MatchApi`; `HttpMatchApi` is the reqwest
//! implementation used by the binary and the integration tests.

use crate::error::{CommitError, Error, FetchError, Result};
use async_trait::async_trait;
use cq_common::api::{SwipeRequest, SwipeResponse, RELATED_CONTEXT_QUERY, SWIPE_PATH};
use cq_common::config::ClientConfig;
use cq_common::events::MatchMode;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("cq-swipe/", env!("CARGO_PKG_VERSION"));

/// Backend operations the swipe engine depends on
#[async_trait]
pub trait MatchApi: Send + Sync {
    /// Fetch the ranked candidate list for a mode
    ///
    /// # Returns
    /// * `Ok(records)` - Raw records in backend order (unfiltered)
    /// * `Err(FetchError)` - Network failure, non-2xx status or bad body
    async fn list_candidates(
        &self,
        mode: MatchMode,
        related_context_id: Option<&str>,
    ) -> std::result::Result<Vec<Value>, FetchError>;

    /// Record one swipe decision
    async fn record_swipe(
        &self,
        request: SwipeRequest,
    ) -> std::result::Result<SwipeResponse, CommitError>;
}

/// reqwest-backed `MatchApi`
pub struct HttpMatchApi {
    http_client: reqwest::Client,
    config: ClientConfig,
}

impl HttpMatchApi {
    /// Build a client with the configured timeout and bearer token
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::Config(format!("Invalid token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl MatchApi for HttpMatchApi {
    async fn list_candidates(
        &self,
        mode: MatchMode,
        related_context_id: Option<&str>,
    ) -> std::result::Result<Vec<Value>, FetchError> {
        let url = self.config.endpoint(mode.listing_path());
        let mut request = self.http_client.get(&url);

        // Only the people listing understands a related project
        if let (MatchMode::Person, Some(context)) = (mode, related_context_id) {
            request = request.query(&[(RELATED_CONTEXT_QUERY, context)]);
        }

        debug!(url = %url, mode = %mode, "Fetching candidates");

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }

    async fn record_swipe(
        &self,
        request: SwipeRequest,
    ) -> std::result::Result<SwipeResponse, CommitError> {
        let url = self.config.endpoint(SWIPE_PATH);

        debug!(
            url = %url,
            target_id = %request.target_id,
            direction = ?request.direction,
            "Recording swipe"
        );

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CommitError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommitError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<SwipeResponse>()
            .await
            .map_err(|e| CommitError::Decode(e.to_string()))
    }
}
