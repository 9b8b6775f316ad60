//! Network transport used by [`AptClient`](crate::client::AptClient).
//!
//! The protocol code only needs "send this, give me the body back", so the
//! transport is a small trait the caller owns and injects. [`HttpTransport`]
//! is the reqwest implementation; tests substitute an in-memory fake.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::NodeConfig;
use crate::error::{AptError, AptResult};

/// Request/response exchange with a node.
///
/// Implementations return the raw response body for every HTTP status: the
/// node reports failures in the body, and callers decide by probing it.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> AptResult<String>;

    async fn post(&self, path: &str, body: &Value) -> AptResult<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get(&self, path: &str) -> AptResult<String> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, body: &Value) -> AptResult<String> {
        (**self).post(path, body).await
    }
}

/// Backoff before retry `attempt`: 100ms doubled per attempt, saturating.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_millis(100u64.saturating_mul(2u64.saturating_pow(attempt)))
}

/// reqwest-backed transport for the node REST API
pub struct HttpTransport {
    http: Client,
    node: NodeConfig,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.node.url)
            .field("max_retries", &self.node.max_retries)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport from node config
    pub fn new(node: &NodeConfig) -> AptResult<Self> {
        if node.url.trim().is_empty() {
            return Err(AptError::InvalidArgument("node url is empty"));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(node.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            node: node.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.node.url.trim().trim_end_matches('/')
    }

    /// Send with retries on connection failures. Once any response arrives
    /// its body is returned as-is, whatever the status.
    async fn send_with_retry<F>(&self, url: &str, build: F) -> AptResult<String>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = retry_delay(attempt);
                warn!(
                    "Retrying request to {} (attempt {}/{}), waiting {:?}",
                    url, attempt, self.node.max_retries, delay
                );
                tokio::time::sleep(delay).await;
            }

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await?;
                    if !status.is_success() {
                        debug!("{} returned {}: {}", url, status, body);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_connect() && attempt < self.node.max_retries => {
                    warn!("Connection to {} failed: {}", url, e);
                    attempt += 1;
                }
                Err(e) => {
                    error!("Request to {} failed: {}", url, e);
                    return Err(AptError::Http(e));
                }
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> AptResult<String> {
        let url = self.node.endpoint(path);
        debug!("GET {}", url);
        self.send_with_retry(&url, || self.http.get(&url)).await
    }

    async fn post(&self, path: &str, body: &Value) -> AptResult<String> {
        let url = self.node.endpoint(path);
        debug!("POST {}", url);
        self.send_with_retry(&url, || self.http.post(&url).json(body))
            .await
    }
}
