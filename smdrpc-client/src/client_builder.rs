//! Client builder for configuring headers, timeouts and observability
//!
//! # Examples
//!
//! ```rust,no_run
//! use smdrpc_client::ClientBuilder;
//! use smdrpc_core::Version;
//! use std::time::Duration;
//!
//! # fn example() -> smdrpc_core::Result<()> {
//! let client = ClientBuilder::new("http://localhost:8080/")
//!     .timeout(Duration::from_secs(5))
//!     .header("Authorization", "Bearer 7f3a")
//!     .version(Version::V2)
//!     .with_default_observability()
//!     .service_name("billing-client")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use crate::metrics::ClientMetrics;
use crate::transport::HttpTransport;
use crate::Client;
use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use smdrpc_core::{Error, ObservabilityConfig, Result, Version};
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating an HTTP [`Client`]
pub struct ClientBuilder {
    url: String,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    version: Version,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            timeout: None,
            version: Version::V1,
            observability_config: None,
            service_name: None,
        }
    }

    /// Add a header sent with every request; names and values are checked by
    /// [`ClientBuilder::build`]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the default `User-Agent`
    pub fn user_agent(self, agent: impl Into<String>) -> Self {
        self.header(USER_AGENT.as_str(), agent)
    }

    /// Give up on requests after `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Envelope version for outgoing requests, 1.0 by default
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Enable OpenTelemetry observability with custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Enable OpenTelemetry observability with default configuration
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Set service name for observability (used if observability is enabled)
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` for a header that is not valid HTTP,
    /// `Error::Transport` when the HTTP stack cannot be set up, and
    /// `Error::Internal` when observability fails to initialize.
    pub fn build(self) -> Result<Client> {
        let headers = header_map(&self.headers)?;

        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            smdrpc_core::init_observability(config)
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ClientMetrics::new()))
        } else {
            None
        };

        let transport = HttpTransport::with_timeout(self.url.clone(), self.timeout)?;
        let mut client = Client::with_transport(transport);
        *client.headers_mut() = headers;
        client.set_version(self.version);
        client.metrics = metrics;

        tracing::debug!(url = %self.url, version = %self.version, "Client configured");
        Ok(client)
    }
}

fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::InvalidArgument(format!("header name {:?}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::InvalidArgument(format!("header value {:?}: {}", value, e)))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new("http://localhost:8080/");
        assert_eq!(builder.url, "http://localhost:8080/");
        assert!(builder.headers.is_empty());
        assert!(builder.timeout.is_none());
        assert_eq!(builder.version, Version::V1);
        assert!(builder.observability_config.is_none());
        assert!(builder.service_name.is_none());
    }

    #[test]
    fn test_build_applies_settings() {
        let client = ClientBuilder::new("http://localhost:8080/")
            .header("X-Trace", "abc")
            .user_agent("billing/2.1")
            .version(Version::V2)
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();

        assert_eq!(client.headers()["x-trace"], "abc");
        assert_eq!(client.headers()[USER_AGENT], "billing/2.1");
        assert_eq!(client.version(), Version::V2);
        assert_eq!(client.transport().url(), "http://localhost:8080/");
        assert!(client.metrics.is_none());
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = ClientBuilder::new("http://localhost:8080/")
            .header("bad header", "x")
            .build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = ClientBuilder::new("http://localhost:8080/")
            .header("X-Ok", "line\nbreak")
            .build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_builder_observability_config() {
        let config = ObservabilityConfig::new("test-client")
            .with_endpoint("http://localhost:4317")
            .with_log_level("debug");

        let builder = ClientBuilder::new("http://localhost:8080/").with_observability(config);

        let obs_config = builder.observability_config.unwrap();
        assert_eq!(obs_config.service_name, "test-client");
        assert_eq!(obs_config.log_level, "debug");
    }

    #[test]
    fn test_builder_service_name() {
        let builder = ClientBuilder::new("http://localhost:8080/")
            .with_default_observability()
            .service_name("my-service");

        assert!(builder.observability_config.is_some());
        assert_eq!(builder.service_name, Some("my-service".to_string()));
    }
}
