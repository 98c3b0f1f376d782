//! JSON-RPC 1.0/2.0 server with SMD service discovery
//!
//! The crate is built around [`Server`], a dispatcher that owns a method
//! table and the [`ServiceMap`](smdrpc_core::ServiceMap) describing it.
//! Methods are plain Rust closures or functions paired with a
//! [`MethodSignature`]; the signature drives both parameter binding and the
//! published SMD entry.
//!
//! # Core Features
//!
//! - **Parameter binding**: positional or named params, declared defaults,
//!   optional parameters, missing-parameter faults
//! - **Faults**: every protocol or handler failure becomes a JSON-RPC error
//!   response with the standard codes
//! - **Discovery**: SMD 2.0 (or Dojo `.1`) document, served over GET and
//!   cacheable on disk
//! - **HTTP**: hyper-based POST binding with `204` for notifications
//! - **Observability**: `tracing` spans plus OpenTelemetry metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use smdrpc_server::{from_typed_fn, Method, MethodSignature, ParamSignature, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = Server::builder()
//!         .bind_str("127.0.0.1:8080")?
//!         .target("/")
//!         .function(Method::new(
//!             MethodSignature::new("add")
//!                 .param(ParamSignature::new("a", "int"))
//!                 .param(ParamSignature::new("b", "int"))
//!                 .returns("int"),
//!             from_typed_fn(|(a, b): (i64, i64)| async move { Ok(a + b) }),
//!         ))
//!         .build_http()
//!         .await?;
//!
//!     http.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! With `smdrpc-macros`, an `impl` block becomes a [`ServiceProvider`]:
//!
//! ```rust,ignore
//! struct Calculator;
//!
//! #[smdrpc_macros::rpc_service]
//! impl Calculator {
//!     /// Add two integers
//!     pub fn add(&self, a: i64, b: i64) -> i64 {
//!         a + b
//!     }
//! }
//!
//! let mut server = Server::new();
//! server.set_class(Calculator)?;
//! ```

mod binding;
mod builder;
pub mod cache;
mod handler;
pub mod http;
mod method;
mod metrics;
mod router;
mod server;
mod signature;

#[doc(hidden)]
#[path = "macro_support.rs"]
pub mod __private;

pub use binding::{bind_arguments, fill_defaults};
pub use builder::ServerBuilder;
pub use cache::{delete_smd, get_smd, save_smd};
pub use handler::{from_fn, from_sync_fn, from_typed_fn, AsyncHandler, Handler, HandlerResult};
pub use http::{render, request_from_body, HttpServer};
pub use method::{Method, ServiceProvider};
pub use metrics::ServerMetrics;
pub use router::Router;
pub use server::Server;
pub use signature::{MethodSignature, ParamSignature};
