//! Registered callables
//!
//! A [`Method`] pairs a [`MethodSignature`] with the [`Handler`] that runs
//! it. Whole services register through [`ServiceProvider`], which the
//! `#[rpc_service]` attribute implements for an `impl` block.

use crate::handler::Handler;
use crate::signature::MethodSignature;
use std::fmt;
use std::sync::Arc;

/// A signature and its implementation
#[derive(Clone)]
pub struct Method {
    signature: MethodSignature,
    handler: Arc<dyn Handler>,
}

impl Method {
    pub fn new(signature: MethodSignature, handler: Arc<dyn Handler>) -> Self {
        Self { signature, handler }
    }

    pub fn name(&self) -> &str {
        self.signature.name()
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    /// Same method published under another name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.signature = self.signature.with_name(name);
        self
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// A group of methods exposed together
///
/// Implementations hand out one [`Method`] per public callable. Handlers
/// that need the instance capture the `Arc`, so state lives as long as any
/// registered method does.
///
/// ```rust
/// use smdrpc_server::{from_typed_fn, Method, MethodSignature, ParamSignature, ServiceProvider};
/// use std::sync::Arc;
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl ServiceProvider for Greeter {
///     fn methods(self: Arc<Self>) -> Vec<Method> {
///         let this = Arc::clone(&self);
///         vec![Method::new(
///             MethodSignature::new("greet")
///                 .param(ParamSignature::new("name", "string"))
///                 .returns("string"),
///             from_typed_fn(move |(name,): (String,)| {
///                 let greeting = this.greeting.clone();
///                 async move { Ok(format!("{}, {}", greeting, name)) }
///             }),
///         )]
///     }
/// }
/// ```
pub trait ServiceProvider: Send + Sync + 'static {
    fn methods(self: Arc<Self>) -> Vec<Method>;
}
