//! The JSON-RPC dispatcher
//!
//! A [`Server`] owns the method table and the [`ServiceMap`] published for
//! discovery. Both are filled during setup through `&mut self` and only read
//! while serving, so a built server is shared behind an `Arc` without locks.
//!
//! Every request produces exactly one [`Response`]. Protocol problems and
//! handler failures become faults on that response; nothing escapes
//! [`Server::handle`].
//!
//! ```rust
//! use smdrpc_server::{from_typed_fn, Method, MethodSignature, ParamSignature, Server};
//! use smdrpc_core::Request;
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> smdrpc_core::Result<()> {
//! let mut server = Server::new();
//! server.add_function(Method::new(
//!     MethodSignature::new("add")
//!         .param(ParamSignature::new("a", "int"))
//!         .param(ParamSignature::new("b", "int"))
//!         .returns("int"),
//!     from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
//! ))?;
//!
//! let response = server
//!     .handle_json(r#"{"method": "add", "params": {"b": 2, "a": 40}, "id": 1}"#)
//!     .await;
//! assert_eq!(response.result(), Some(&json!(42)));
//! # Ok(())
//! # }
//! ```

use crate::binding::{bind_arguments, fill_defaults};
use crate::metrics::ServerMetrics;
use crate::method::{Method, ServiceProvider};
use crate::router::Router;
use futures::FutureExt;
use smdrpc_core::smd::Envelope;
use smdrpc_core::{Fault, Request, Response, Result, ServiceMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Method table plus service description
///
/// Handlers raise an application fault by returning `Err(Fault::new(..).into())`
/// (or `Err(Error::Fault(..))`); its code, message and data reach the caller
/// unchanged. Other errors map to the closest standard fault code.
#[derive(Clone, Default)]
pub struct Server {
    router: Router,
    service_map: Arc<ServiceMap>,
    metrics: Option<Arc<ServerMetrics>>,
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuring a server
    pub fn builder() -> crate::ServerBuilder {
        crate::ServerBuilder::new()
    }

    pub(crate) fn set_metrics(&mut self, metrics: Option<Arc<ServerMetrics>>) {
        self.metrics = metrics;
        self.record_method_count();
    }

    /// Register one method, replacing any method of the same name
    ///
    /// # Errors
    ///
    /// `Error::InvalidArgument` when the signature has an invalid name,
    /// duplicate or empty parameter names, or a `null` parameter type.
    pub fn add_function(&mut self, method: Method) -> Result<&mut Self> {
        let service = method.signature().to_service()?;

        let service_map = Arc::make_mut(&mut self.service_map);
        service_map.remove_service(service.name());
        service_map.add_service(service)?;

        let replaced = self.router.register(method.clone()).is_some();
        tracing::info!(
            method = %method.name(),
            params = method.signature().params().len(),
            replaced = replaced,
            "Method registered"
        );

        self.record_method_count();
        Ok(self)
    }

    /// Register every method of a provider
    pub fn set_class<P: ServiceProvider>(&mut self, provider: P) -> Result<&mut Self> {
        self.set_object(Arc::new(provider))
    }

    /// Register every method of a shared provider instance
    pub fn set_object<P: ServiceProvider>(&mut self, provider: Arc<P>) -> Result<&mut Self> {
        for method in provider.methods() {
            self.add_function(method)?;
        }
        Ok(self)
    }

    /// Like [`Server::set_class`], publishing methods as `namespace.name`
    pub fn set_class_with_namespace<P: ServiceProvider>(
        &mut self,
        provider: P,
        namespace: &str,
    ) -> Result<&mut Self> {
        self.set_object_with_namespace(Arc::new(provider), namespace)
    }

    /// Like [`Server::set_object`], publishing methods as `namespace.name`
    pub fn set_object_with_namespace<P: ServiceProvider>(
        &mut self,
        provider: Arc<P>,
        namespace: &str,
    ) -> Result<&mut Self> {
        for method in provider.methods() {
            let name = qualified_name(namespace, method.name());
            self.add_function(method.with_name(name))?;
        }
        Ok(self)
    }

    /// Register methods taken from another server's [`Server::functions`]
    pub fn load_functions(&mut self, methods: impl IntoIterator<Item = Method>) -> Result<&mut Self> {
        for method in methods {
            self.add_function(method)?;
        }
        Ok(self)
    }

    /// Registered methods ordered by name
    pub fn functions(&self) -> Vec<Method> {
        self.router.methods()
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.router.has_method(name)
    }

    pub fn service_map(&self) -> &ServiceMap {
        &self.service_map
    }

    pub fn transport(&self) -> &str {
        self.service_map.transport()
    }

    pub fn set_transport(&mut self, transport: &str) -> Result<&mut Self> {
        Arc::make_mut(&mut self.service_map).set_transport(transport)?;
        Ok(self)
    }

    pub fn envelope(&self) -> Envelope {
        self.service_map.envelope()
    }

    pub fn set_envelope(&mut self, envelope: Envelope) -> &mut Self {
        Arc::make_mut(&mut self.service_map).set_envelope(envelope);
        self
    }

    pub fn content_type(&self) -> &str {
        self.service_map.content_type()
    }

    pub fn set_content_type(&mut self, content_type: &str) -> Result<&mut Self> {
        Arc::make_mut(&mut self.service_map).set_content_type(content_type)?;
        Ok(self)
    }

    pub fn description(&self) -> &str {
        self.service_map.description()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        Arc::make_mut(&mut self.service_map).set_description(description);
        self
    }

    pub fn target(&self) -> &str {
        self.service_map.target()
    }

    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        Arc::make_mut(&mut self.service_map).set_target(target);
        self
    }

    pub fn id(&self) -> &str {
        self.service_map.id()
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> &mut Self {
        Arc::make_mut(&mut self.service_map).set_id(id);
        self
    }

    pub fn is_dojo_compatible(&self) -> bool {
        self.service_map.is_dojo_compatible()
    }

    pub fn set_dojo_compatible(&mut self, flag: bool) -> &mut Self {
        Arc::make_mut(&mut self.service_map).set_dojo_compatible(flag);
        self
    }

    /// Parse wire text and handle it
    pub async fn handle_json(&self, json: &str) -> Response {
        self.handle(&Request::from_json(json)).await
    }

    /// Handle one request
    ///
    /// The response carries the request's id and version and a reference to
    /// this server's service map.
    #[tracing::instrument(skip(self, request), fields(method = %request.method(), id = ?request.id()))]
    pub async fn handle(&self, request: &Request) -> Response {
        let start = Instant::now();
        let mut response = Response::new();

        if let Err(fault) = self.dispatch(request, &mut response).await {
            tracing::debug!(code = fault.code(), message = %fault.message(), "Request faulted");
            response.set_error(Some(fault));
        }

        response.set_service_map(Some(Arc::clone(&self.service_map)));
        if let Some(id) = request.id() {
            response.set_id(Some(id.clone()));
        }
        response.set_version(request.version().as_str());

        if let Some(metrics) = &self.metrics {
            metrics.record_request(
                self.metric_label(request.method()),
                response.error().map(Fault::code),
                start.elapsed(),
            );
        }

        response
    }

    /// Registered method name, or a fixed label for anything else so that
    /// arbitrary client-supplied names never become metric attributes
    fn metric_label<'a>(&self, method: &'a str) -> &'a str {
        if self.router.has_method(method) {
            method
        } else {
            UNKNOWN_METHOD_LABEL
        }
    }

    async fn dispatch(&self, request: &Request, response: &mut Response) -> std::result::Result<(), Fault> {
        if request.is_parse_error() {
            return Err(Fault::parse_error());
        }
        if request.is_method_error() || request.method().is_empty() {
            return Err(Fault::invalid_request());
        }

        let method = self
            .router
            .get(request.method())
            .ok_or_else(Fault::method_not_found)?;

        let mut params = request.params().clone();
        if let Some(service) = self.service_map.service(method.name()) {
            fill_defaults(&mut params, &service.params());
        }
        let args = bind_arguments(&params, method.signature())?;

        let handler = method.handler();
        let outcome = AssertUnwindSafe(async move { handler.handle(args).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => {
                response.set_result(result);
                Ok(())
            }
            Ok(Err(err)) => {
                let fault = Fault::from(err);
                tracing::warn!(code = fault.code(), error = %fault.message(), "Handler failed");
                Err(fault)
            }
            Err(_) => {
                tracing::error!("Handler panicked");
                Err(Fault::internal_error("Internal error"))
            }
        }
    }

    fn record_method_count(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_methods(self.router.len());
        }
    }
}

const UNKNOWN_METHOD_LABEL: &str = "unknown";

pub(crate) fn qualified_name(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{from_fn, from_sync_fn};
    use crate::signature::{MethodSignature, ParamSignature};
    use serde_json::{json, Value};
    use smdrpc_core::{Error, Id, Version};

    fn echo(name: &str) -> Method {
        Method::new(
            MethodSignature::new(name)
                .param(ParamSignature::new("value", "mixed").optional())
                .returns("mixed"),
            from_fn(|args| async move { Ok(args.into_iter().next().unwrap_or(Value::Null)) }),
        )
    }

    #[test]
    fn test_add_function_publishes_service() {
        let mut server = Server::new();
        server.add_function(echo("echo")).unwrap();

        assert!(server.has_method("echo"));
        let service = server.service_map().service("echo").unwrap();
        assert_eq!(service.params()[0].name(), Some("value"));
    }

    #[test]
    fn test_add_function_rejects_invalid_name() {
        let mut server = Server::new();
        let err = server.add_function(echo("rpc.echo")).err().unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(server.functions().is_empty());
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut server = Server::new();
        server.add_function(echo("echo")).unwrap();
        server
            .add_function(Method::new(
                MethodSignature::new("echo").returns("string"),
                from_sync_fn(|_| Ok(json!("second"))),
            ))
            .unwrap();

        assert_eq!(server.functions().len(), 1);
        assert_eq!(server.service_map().services().len(), 1);
        assert!(server.service_map().service("echo").unwrap().params().is_empty());
    }

    #[test]
    fn test_load_functions_copies_table() {
        let mut first = Server::new();
        first.add_function(echo("a")).unwrap();
        first.add_function(echo("b")).unwrap();

        let mut second = Server::new();
        second.load_functions(first.functions()).unwrap();
        let names: Vec<String> = second.functions().iter().map(|m| m.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(second.service_map().service("b").is_some());
    }

    #[test]
    fn test_service_map_delegation() {
        let mut server = Server::new();
        server
            .set_target("/rpc")
            .set_id("/rpc")
            .set_description("test service")
            .set_envelope(Envelope::JsonRpc2)
            .set_dojo_compatible(true);
        server.set_content_type("application/json-rpc").unwrap();
        server.set_transport("POST").unwrap();

        assert_eq!(server.target(), "/rpc");
        assert_eq!(server.id(), "/rpc");
        assert_eq!(server.description(), "test service");
        assert_eq!(server.envelope(), Envelope::JsonRpc2);
        assert_eq!(server.content_type(), "application/json-rpc");
        assert_eq!(server.transport(), "POST");
        assert!(server.is_dojo_compatible());

        assert!(server.set_transport("GET").is_err());
        assert!(server.set_content_type("not a mime").is_err());
    }

    #[tokio::test]
    async fn test_fault_from_handler_keeps_code_and_data() {
        let mut server = Server::new();
        server
            .add_function(Method::new(
                MethodSignature::new("reserve").returns("mixed"),
                from_fn(|_| async {
                    Err(Fault::new("Out of stock", 4100, Some(json!({"sku": 7}))).into())
                }),
            ))
            .unwrap();

        let response = server.handle_json(r#"{"method": "reserve", "id": 1}"#).await;
        let fault = response.error().unwrap();
        assert_eq!(fault.code(), 4100);
        assert_eq!(fault.message(), "Out of stock");
        assert_eq!(fault.data(), Some(&json!({"sku": 7})));
    }

    #[test]
    fn test_metric_label_only_names_registered_methods() {
        let mut server = Server::new();
        server.add_function(echo("echo")).unwrap();

        assert_eq!(server.metric_label("echo"), "echo");
        assert_eq!(server.metric_label("no.such.method"), "unknown");
        assert_eq!(server.metric_label(""), "unknown");
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("", "bar"), "bar");
        assert_eq!(qualified_name("foo", "bar"), "foo.bar");
    }

    #[tokio::test]
    async fn test_handle_copies_id_and_version() {
        let mut server = Server::new();
        server.add_function(echo("echo")).unwrap();

        let response = server
            .handle_json(r#"{"jsonrpc": "2.0", "method": "echo", "params": ["hi"], "id": "abc"}"#)
            .await;
        assert_eq!(response.result(), Some(&json!("hi")));
        assert_eq!(response.id(), Some(&Id::from("abc")));
        assert_eq!(response.version(), Some(Version::V2));
        assert!(response.service_map().is_some());
    }

    #[tokio::test]
    async fn test_handler_panic_is_internal_error() {
        let mut server = Server::new();
        server
            .add_function(Method::new(
                MethodSignature::new("boom"),
                from_sync_fn(|_| panic!("boom")),
            ))
            .unwrap();

        let response = server.handle_json(r#"{"method": "boom", "id": 1}"#).await;
        assert_eq!(response.error().map(Fault::code), Some(Fault::INTERNAL));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = Server::new();
        let response = server.handle_json("{not json").await;
        let error = response.error().unwrap();
        assert_eq!(error.code(), Fault::PARSE);
        assert_eq!(error.message(), "Parse error");
    }
}
