//! Block Node Client
//!
//! Talks to remote block nodes over their HTTP protocol. Every operation
//! collapses failures into a plain outcome (`bool` / `Option`); the caller
//! decides what a failure means for the file as a whole.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use scatter_core::API_KEY_HEADER;
use std::time::Duration;
use tracing::{debug, warn};

/// Error types for building a node client
#[derive(Debug, thiserror::Error)]
pub enum NodeClientError {
    #[error("HTTP client setup failed: {0}")]
    Build(#[from] reqwest::Error),
}

/// Configuration for the node client
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Shared secret sent on write and delete requests
    pub api_key: String,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Whole-request timeout for block upload and download
    pub transfer_timeout: Duration,

    /// Timeout for `GET /status`
    pub health_timeout: Duration,

    /// Timeout for best-effort deletes
    pub delete_timeout: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            connect_timeout: Duration::from_secs(10),
            transfer_timeout: Duration::from_secs(60),
            health_timeout: Duration::from_secs(10),
            delete_timeout: Duration::from_secs(30),
        }
    }
}

impl TransferConfig {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

/// Block operations against a remote node
#[async_trait]
pub trait BlockTransport: Send + Sync {
    /// Store a block; `true` only on an explicit success response
    async fn store(&self, block: Bytes, node_url: &str, path: &str) -> bool;

    /// Retrieve a block; `None` on not-found, transport error or timeout
    async fn fetch(&self, node_url: &str, path: &str) -> Option<Bytes>;

    /// Liveness probe
    async fn health_check(&self, node_url: &str) -> bool;

    /// Delete a block, ignoring any failure
    async fn delete_best_effort(&self, node_url: &str, path: &str);
}

/// reqwest-backed [`BlockTransport`]
#[derive(Clone)]
pub struct HttpBlockClient {
    http: reqwest::Client,
    config: TransferConfig,
}

impl HttpBlockClient {
    pub fn new(config: TransferConfig) -> Result<Self, NodeClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    fn endpoint(node_url: &str, route: &str) -> String {
        format!("{}/{}", node_url.trim_end_matches('/'), route)
    }
}

#[async_trait]
impl BlockTransport for HttpBlockClient {
    async fn store(&self, block: Bytes, node_url: &str, path: &str) -> bool {
        let size = block.len();
        let part = Part::stream_with_length(block, size as u64).file_name("block");
        let form = Form::new().part("block", part).text("path", path.to_string());

        let result = self
            .http
            .post(Self::endpoint(node_url, "upload_block"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .multipart(form)
            .timeout(self.config.transfer_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!(node = %node_url, path = %path, size, "Block stored");
                true
            }
            Ok(response) => {
                warn!(node = %node_url, path = %path, status = %response.status(), "Node rejected block");
                false
            }
            Err(e) => {
                warn!(node = %node_url, path = %path, error = %e, "Block upload failed");
                false
            }
        }
    }

    async fn fetch(&self, node_url: &str, path: &str) -> Option<Bytes> {
        let result = self
            .http
            .get(Self::endpoint(node_url, "download_block"))
            .query(&[("path", path)])
            .timeout(self.config.transfer_timeout)
            .send()
            .await;

        let response = match result {
            Ok(r) if r.status() == StatusCode::OK => r,
            Ok(r) => {
                warn!(node = %node_url, path = %path, status = %r.status(), "Block not served");
                return None;
            }
            Err(e) => {
                warn!(node = %node_url, path = %path, error = %e, "Block download failed");
                return None;
            }
        };

        match response.bytes().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(node = %node_url, path = %path, error = %e, "Block body read failed");
                None
            }
        }
    }

    async fn health_check(&self, node_url: &str) -> bool {
        match self
            .http
            .get(Self::endpoint(node_url, "status"))
            .timeout(self.config.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(node = %node_url, error = %e, "Health check failed");
                false
            }
        }
    }

    async fn delete_best_effort(&self, node_url: &str, path: &str) {
        let result = self
            .http
            .delete(Self::endpoint(node_url, "delete_block"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .query(&[("path", path)])
            .timeout(self.config.delete_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(node = %node_url, path = %path, "Remote block deleted");
            }
            Ok(response) => {
                debug!(node = %node_url, path = %path, status = %response.status(), "Remote delete ignored");
            }
            Err(e) => {
                debug!(node = %node_url, path = %path, error = %e, "Remote delete ignored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = TransferConfig::with_api_key("k");
        assert_eq!(config.api_key, "k");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.transfer_timeout, Duration::from_secs(60));
        assert_eq!(config.health_timeout, Duration::from_secs(10));
        assert_eq!(config.delete_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(
            HttpBlockClient::endpoint("http://10.0.0.2:5001/", "status"),
            "http://10.0.0.2:5001/status"
        );
        assert_eq!(
            HttpBlockClient::endpoint("http://10.0.0.2:5001", "upload_block"),
            "http://10.0.0.2:5001/upload_block"
        );
    }

    #[tokio::test]
    async fn test_unreachable_node_is_a_plain_failure() {
        let client = HttpBlockClient::new(TransferConfig {
            connect_timeout: Duration::from_millis(200),
            transfer_timeout: Duration::from_millis(500),
            health_timeout: Duration::from_millis(500),
            delete_timeout: Duration::from_millis(500),
            ..TransferConfig::with_api_key("k")
        })
        .unwrap();

        // Port 9 on loopback is closed in test environments
        let node = "http://127.0.0.1:9";
        assert!(!client.store(Bytes::from_static(b"x"), node, "/tmp/x").await);
        assert!(client.fetch(node, "/tmp/x").await.is_none());
        assert!(!client.health_check(node).await);
        client.delete_best_effort(node, "/tmp/x").await;
    }
}
