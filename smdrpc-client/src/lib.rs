//! JSON-RPC 1.0/2.0 client over HTTP POST
//!
//! [`Client`] numbers, encodes and posts requests, then decodes the replies.
//! Remote faults come back as `Error::Fault`, failure statuses as
//! `Error::Http`. The network sits behind the [`Transport`] trait; the
//! default is [`HttpTransport`], built on reqwest.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use smdrpc_client::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("http://localhost:8080/")?;
//!
//!     let sum = client.call("add", vec![json!(1), json!(2)]).await?;
//!     println!("1 + 2 = {}", sum);
//!
//!     let greeting: String = client.request("greet", json!({"name": "Ada"})).await?;
//!     println!("{}", greeting);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod client_builder;
mod metrics;
mod transport;

pub use client::{Client, DEFAULT_USER_AGENT, JSON_RPC_CONTENT_TYPE};
pub use client_builder::ClientBuilder;
pub use metrics::ClientMetrics;
pub use transport::{HttpTransport, Transport, TransportResponse};
