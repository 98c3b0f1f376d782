//! Core JSON-RPC 1.0/2.0 types for smdrpc
//!
//! This crate holds everything both ends of a call share:
//!
//! - **Envelopes**: [`Request`] and [`Response`], tolerant loaders and
//!   serializers for the 1.0 and 2.0 wire formats
//! - **Faults**: [`Fault`], the `{code, message, data}` error object, and the
//!   crate-level [`Error`]
//! - **SMD**: the [`smd`] module, a Service Mapping Description model used for
//!   discovery documents and by the server's parameter matching
//! - **Observability**: OpenTelemetry and `tracing` bootstrap
//!
//! The crate is transport-agnostic. `smdrpc-server` adds the dispatcher and
//! the HTTP binding, `smdrpc-client` the outbound side.
//!
//! # Example
//!
//! ```rust
//! use smdrpc_core::{Fault, Request, Response};
//!
//! let request = Request::from_json(r#"{"method": "ping", "id": 1}"#);
//! assert_eq!(request.method(), "ping");
//!
//! let mut response = Response::new();
//! response.set_id(request.id().cloned());
//! response.fault("Method not found", Fault::INVALID_METHOD, None);
//! assert!(response.to_json().contains("-32601"));
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod request;
pub mod response;
pub mod smd;
pub mod types;

pub use error::{Error, Fault, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use request::Request;
pub use response::Response;
pub use smd::{Envelope, Service, ServiceMap, ServiceParam, TypeSpec};
pub use types::{Id, ParamKey, Params, Version};
