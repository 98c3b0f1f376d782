//! Handler abstraction for registered methods
//!
//! By the time a handler runs, the dispatcher has already reconciled the
//! request's positional or named parameters against the method's
//! [`MethodSignature`](crate::MethodSignature). The handler therefore always
//! receives one value per declared parameter, in declaration order, with
//! `null` standing in for optional parameters the caller left out.
//!
//! # Creating handlers
//!
//! - [`from_fn`]: async closure over the raw argument vector
//! - [`from_typed_fn`]: async closure over a deserialized tuple or struct
//! - [`from_sync_fn`]: synchronous closure
//! - `#[rpc_service]` / `#[rpc_function]` from `smdrpc-macros`
//!
//! Returning `Err` makes the dispatcher answer with a fault: an
//! `Error::Fault` is forwarded as is, other errors map onto a standard code.
//!
//! ```rust
//! use smdrpc_server::{from_fn, from_typed_fn};
//! use smdrpc_core::Fault;
//! use serde_json::{json, Value};
//!
//! let echo = from_fn(|args: Vec<Value>| async move { Ok(Value::Array(args)) });
//!
//! let divide = from_typed_fn(|(a, b): (f64, f64)| async move {
//!     if b == 0.0 {
//!         return Err(Fault::new("division by zero", 1001, Some(json!({"a": a}))).into());
//!     }
//!     Ok(a / b)
//! });
//! ```

use futures::future::BoxFuture;
use serde_json::Value;
use smdrpc_core::{Error, Result};
use std::future::Future;
use std::sync::Arc;

/// Future returned by a handler
pub type HandlerResult = BoxFuture<'static, Result<Value>>;

/// An invokable method body
pub trait Handler: Send + Sync {
    /// Run the method with arguments already bound in declaration order
    fn handle(&self, args: Vec<Value>) -> HandlerResult;
}

/// Adapter turning an async closure into a [`Handler`]
pub struct AsyncHandler<F> {
    func: F,
}

impl<F, Fut> Handler for AsyncHandler<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    fn handle(&self, args: Vec<Value>) -> HandlerResult {
        Box::pin((self.func)(args))
    }
}

/// Wrap an async closure taking the raw argument vector
pub fn from_fn<F, Fut>(func: F) -> Arc<dyn Handler>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(AsyncHandler { func })
}

/// Wrap a synchronous closure
pub fn from_sync_fn<F>(func: F) -> Arc<dyn Handler>
where
    F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
{
    from_fn(move |args| {
        let result = func(args);
        async move { result }
    })
}

/// Wrap an async closure whose arguments deserialize into `P`
///
/// The bound arguments form a JSON array, so `P` is typically a tuple with
/// one element per declared parameter (`Option<T>` for optional ones). A
/// failed conversion becomes `Error::InvalidParams`, reported as
/// `-32602 Invalid params`.
pub fn from_typed_fn<P, R, F, Fut>(func: F) -> Arc<dyn Handler>
where
    P: serde::de::DeserializeOwned + Send + 'static,
    R: serde::Serialize + Send + 'static,
    F: Fn(P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |args: Vec<Value>| {
        let func = Arc::clone(&func);
        async move {
            let params: P = serde_json::from_value(Value::Array(args))
                .map_err(|e| Error::InvalidParams(e.to_string()))?;
            let result = func(params).await?;
            serde_json::to_value(result).map_err(|e| Error::Serialization(e.to_string()))
        }
    })
}
