//! Outbound transport
//!
//! The client only needs one exchange: POST a body with some headers, get
//! back a status and a body. [`Transport`] captures that so tests and
//! embedders can swap the network out; [`HttpTransport`] is the reqwest
//! implementation used by default.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode};
use smdrpc_core::{Error, Result};
use std::time::Duration;

/// Status and body of one exchange
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends an encoded request and returns the raw reply
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` with `headers`
    ///
    /// # Errors
    ///
    /// `Error::Transport` when no reply was received at all. A reply with a
    /// failure status is still `Ok`; the client inspects the status.
    async fn send(&self, headers: &HeaderMap, body: String) -> Result<TransportResponse>;
}

/// HTTP POST to a fixed URL
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, None)
    }

    /// Transport whose requests give up after `timeout`
    pub fn with_timeout(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, headers: &HeaderMap, body: String) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&self.url)
            .headers(headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(TransportResponse { status, body })
    }
}
