//! Server builder
//!
//! Collects methods, service map settings and observability options, then
//! produces a [`Server`] or, with a bind address, a listening
//! [`HttpServer`]. Registration and settings errors surface from `build`.
//!
//! # Examples
//!
//! ```rust,no_run
//! use smdrpc_server::{from_fn, Method, MethodSignature, Server};
//! use smdrpc_core::smd::Envelope;
//!
//! # async fn example() -> smdrpc_core::Result<()> {
//! let http = Server::builder()
//!     .bind_str("127.0.0.1:8080")?
//!     .envelope(Envelope::JsonRpc2)
//!     .target("/rpc")
//!     .function(Method::new(
//!         MethodSignature::new("ping").returns("string"),
//!         from_fn(|_| async { Ok(serde_json::json!("pong")) }),
//!     ))
//!     .with_default_observability()
//!     .build_http()
//!     .await?;
//! http.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::http::HttpServer;
use crate::method::{Method, ServiceProvider};
use crate::{Server, ServerMetrics};
use smdrpc_core::smd::Envelope;
use smdrpc_core::{Error, ObservabilityConfig, Result};
use std::net::SocketAddr;
use std::sync::Arc;

/// Builder for a [`Server`]
#[derive(Default)]
pub struct ServerBuilder {
    addr: Option<SocketAddr>,
    methods: Vec<Method>,
    envelope: Option<Envelope>,
    target: Option<String>,
    content_type: Option<String>,
    description: Option<String>,
    id: Option<String>,
    dojo_compatible: bool,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address [`ServerBuilder::build_http`] listens on
    pub fn bind(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.addr = Some(addr.into());
        self
    }

    /// Set the bind address from a string (e.g., "127.0.0.1:8080")
    pub fn bind_str(mut self, addr: &str) -> Result<Self> {
        let addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::InvalidArgument(format!("Invalid address: {}", e)))?;
        self.addr = Some(addr);
        Ok(self)
    }

    /// Register a method
    pub fn function(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Register every method of a provider
    pub fn class<P: ServiceProvider>(self, provider: P) -> Self {
        self.object(Arc::new(provider))
    }

    /// Register every method of a shared provider instance
    pub fn object<P: ServiceProvider>(mut self, provider: Arc<P>) -> Self {
        self.methods.extend(provider.methods());
        self
    }

    /// Register a provider's methods as `namespace.name`, or under their bare
    /// names when `namespace` is empty
    pub fn namespaced_object<P: ServiceProvider>(mut self, namespace: &str, provider: Arc<P>) -> Self {
        for method in provider.methods() {
            let name = crate::server::qualified_name(namespace, method.name());
            self.methods.push(method.with_name(name));
        }
        self
    }

    pub fn envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Content type announced in the SMD and on HTTP responses
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Serve the SMD in the Dojo `.1` form
    pub fn dojo_compatible(mut self, flag: bool) -> Self {
        self.dojo_compatible = flag;
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

    /// Build the dispatcher
    ///
    /// # Errors
    ///
    /// Invalid method signatures, an invalid content type, or observability
    /// that fails to initialize.
    pub fn build(self) -> Result<Server> {
        let metrics = if let Some(mut config) = self.observability_config {
            if let Some(name) = self.service_name {
                config.service_name = name;
            }

            smdrpc_core::init_observability(config)
                .map_err(|e| Error::Internal(format!("Failed to initialize observability: {}", e)))?;

            Some(Arc::new(ServerMetrics::new()))
        } else {
            None
        };

        let mut server = Server::new();
        if let Some(envelope) = self.envelope {
            server.set_envelope(envelope);
        }
        if let Some(target) = self.target {
            server.set_target(target);
        }
        if let Some(content_type) = self.content_type {
            server.set_content_type(&content_type)?;
        }
        if let Some(description) = self.description {
            server.set_description(description);
        }
        if let Some(id) = self.id {
            server.set_id(id);
        }
        server.set_dojo_compatible(self.dojo_compatible);
        server.load_functions(self.methods)?;
        server.set_metrics(metrics);

        Ok(server)
    }

    /// Build the dispatcher and bind it to the configured address
    pub async fn build_http(mut self) -> Result<HttpServer> {
        let addr = self
            .addr
            .take()
            .ok_or_else(|| Error::InvalidArgument("No bind address specified".to_string()))?;
        let server = self.build()?;
        HttpServer::bind(addr, server).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn;
    use crate::signature::MethodSignature;
    use serde_json::json;

    fn ping() -> Method {
        Method::new(
            MethodSignature::new("ping").returns("string"),
            from_fn(|_| async { Ok(json!("pong")) }),
        )
    }

    #[test]
    fn test_builder_basic() {
        let server = ServerBuilder::new()
            .function(ping())
            .target("/rpc")
            .envelope(Envelope::JsonRpc2)
            .description("builder test")
            .id("svc")
            .build()
            .unwrap();

        assert!(server.has_method("ping"));
        assert_eq!(server.target(), "/rpc");
        assert_eq!(server.envelope(), Envelope::JsonRpc2);
        assert_eq!(server.description(), "builder test");
        assert_eq!(server.id(), "svc");
        assert!(!server.is_dojo_compatible());
    }

    struct Pinger;

    impl ServiceProvider for Pinger {
        fn methods(self: Arc<Self>) -> Vec<Method> {
            vec![ping()]
        }
    }

    #[test]
    fn test_builder_namespaced_object() {
        let server = ServerBuilder::new()
            .namespaced_object("net", Arc::new(Pinger))
            .namespaced_object("", Arc::new(Pinger))
            .build()
            .unwrap();

        assert!(server.has_method("net.ping"));
        assert!(server.has_method("ping"));
        assert!(!server.has_method(".ping"));
        assert!(server.service_map().service("ping").is_some());
    }

    #[test]
    fn test_builder_invalid_content_type() {
        let result = ServerBuilder::new().content_type("nope").build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_builder_invalid_method_name() {
        let result = ServerBuilder::new()
            .function(ping().with_name("rpc.ping"))
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_builder_no_address() {
        let result = ServerBuilder::new().build_http().await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_builder_build_http() {
        let http = ServerBuilder::new()
            .bind_str("127.0.0.1:0")
            .unwrap()
            .function(ping())
            .build_http()
            .await
            .unwrap();
        assert!(http.local_addr().is_ok());
    }

    #[test]
    fn test_builder_bind_str_invalid() {
        assert!(ServerBuilder::new().bind_str("not-an-address").is_err());
    }
}
