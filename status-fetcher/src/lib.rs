//! Status endpoint client for long-running job tracking
//!
//! This crate provides the leaf of the progress-poll workspace: a single
//! asynchronous request to a status endpoint that yields a strictly decoded
//! [`StatusPayload`] or a [`FetchError`]. It performs no retries and no
//! caching; deciding what to do with a failure is the caller's job.

mod error;
mod payload;

pub use error::{FetchError, Result};
pub use payload::StatusPayload;
pub use url::Url;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;

/// Capability to fetch one status payload from an endpoint
#[async_trait]
pub trait StatusFetcher: Send + Sync {
    /// Perform a single request against `endpoint`
    async fn fetch(&self, endpoint: &Url) -> Result<StatusPayload>;
}

#[async_trait]
impl<T: StatusFetcher + ?Sized> StatusFetcher for Arc<T> {
    async fn fetch(&self, endpoint: &Url) -> Result<StatusPayload> {
        (**self).fetch(endpoint).await
    }
}

#[async_trait]
impl<T: StatusFetcher + ?Sized> StatusFetcher for Box<T> {
    async fn fetch(&self, endpoint: &Url) -> Result<StatusPayload> {
        (**self).fetch(endpoint).await
    }
}

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Timeout for establishing the connection
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Timeout for the whole request including the body
    /// Default: 10 seconds
    pub request_timeout: Duration,

    /// User agent sent with each request
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            user_agent: concat!("progress-poll/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetcherConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches status payloads over HTTP GET
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: reqwest::Client,
}

impl HttpStatusFetcher {
    /// Create a fetcher with default timeouts
    pub fn new() -> Result<Self> {
        Self::with_config(FetcherConfig::default())
    }

    /// Create a fetcher with custom timeouts
    pub fn with_config(config: FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one shared with the rest of the host
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    async fn fetch(&self, endpoint: &Url) -> Result<StatusPayload> {
        tracing::debug!("Fetching status from {}", endpoint);

        let response = self
            .client
            .get(endpoint.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        StatusPayload::from_json_str(&body)
    }
}
