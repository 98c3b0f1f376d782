//! smdrpc - JSON-RPC 1.0/2.0 over HTTP with SMD service discovery
//!
//! This is the convenience crate that re-exports all smdrpc sub-crates.
//! Use it if you want a single dependency for both ends of a call.
//!
//! # Architecture
//!
//! - **smdrpc-core**: envelopes, faults, the SMD model, observability
//! - **smdrpc-server**: dispatcher, parameter binding, HTTP binding
//! - **smdrpc-client**: HTTP POST client
//! - **smdrpc-macros**: `#[rpc_service]` and `#[rpc_function]`
//!
//! # Quick Start - Server
//!
//! ```rust,no_run
//! use smdrpc::macros::rpc_service;
//! use smdrpc::ServerBuilder;
//! use std::sync::Arc;
//!
//! struct Calculator;
//!
//! #[rpc_service]
//! impl Calculator {
//!     /// Add two integers
//!     pub fn add(&self, a: i64, b: i64) -> i64 {
//!         a + b
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let addr: std::net::SocketAddr = "127.0.0.1:8080".parse()?;
//!     let server = ServerBuilder::new()
//!         .bind(addr)
//!         .object(Arc::new(Calculator))
//!         .build_http()
//!         .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Quick Start - Client
//!
//! ```rust,no_run
//! use smdrpc::Client;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:8080/")?;
//!
//!     let sum: i64 = client.request("add", json!({"a": 5, "b": 3})).await?;
//!     println!("Result: {}", sum);
//!
//!     Ok(())
//! }
//! ```

pub use smdrpc_client as client;
pub use smdrpc_core as core;
pub use smdrpc_macros as macros;
pub use smdrpc_server as server;

pub use smdrpc_client::{Client, ClientBuilder};
pub use smdrpc_core::{Error, Fault, Request, Response, Result, ServiceMap};
pub use smdrpc_server::{HttpServer, Server, ServerBuilder};
