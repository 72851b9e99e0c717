//! Timeout-bounded HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::error::FeedError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// A response whose body has already been read.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One outbound GET with a hard deadline.
///
/// Implementations must cancel the underlying request when the deadline
/// elapses and report it as [`FeedError::Timeout`]; every other transport
/// failure is [`FeedError::Network`]. Non-2xx responses are returned as-is,
/// deciding what a bad status means is left to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FeedError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, url: &str) -> Result<HttpResponse, FeedError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FeedError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| FeedError::Network {
            url: url.to_string(),
            message: format!("failed to read body: {}", e),
        })?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FeedError> {
        // Dropping the request future on timeout aborts the connection
        match tokio::time::timeout(timeout, self.send(url)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Request to {} timed out after {}ms", url, timeout.as_millis());
                Err(FeedError::Timeout {
                    url: url.to_string(),
                    after: timeout,
                })
            }
        }
    }
}
