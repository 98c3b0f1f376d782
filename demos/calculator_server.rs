//! Calculator server example
//!
//! Publishes a namespaced calculator object and a free function, writes the
//! service map next to the binary and serves JSON-RPC over HTTP.
//!
//! Run with: cargo run --example calculator_server
//! Then:     cargo run --example calculator_client

use smdrpc_core::{Fault, ObservabilityConfig};
use smdrpc_macros::{rpc_function, rpc_service};
use smdrpc_server::{save_smd, ServerBuilder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Calculator {
    operations: AtomicU64,
}

#[rpc_service]
impl Calculator {
    /// Add two integers
    pub fn add(&self, a: i64, b: i64) -> i64 {
        self.operations.fetch_add(1, Ordering::Relaxed);
        tracing::info!(a, b, "Adding numbers");
        a + b
    }

    /// Divide `a` by `b`
    pub async fn divide(&self, a: f64, b: f64) -> Result<f64, Fault> {
        self.operations.fetch_add(1, Ordering::Relaxed);
        if b == 0.0 {
            return Err(Fault::new("Division by zero", 4001, None));
        }
        Ok(a / b)
    }

    /// Number of operations performed so far
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }
}

/// Greet someone
#[rpc_function]
fn greet(name: String, #[rpc(default = "Hello")] greeting: String) -> String {
    format!("{}, {}!", greeting, name)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let otel_config = ObservabilityConfig::new("smdrpc-calculator-server")
        .with_endpoint("http://localhost:4317")
        .with_log_level("debug");

    let addr: std::net::SocketAddr = "127.0.0.1:9010".parse()?;
    let http = ServerBuilder::new()
        .bind(addr)
        .namespaced_object("calc", Arc::new(Calculator::default()))
        .function(greet())
        .target("/")
        .id("calculator")
        .description("Calculator example service")
        .with_observability(otel_config)
        .service_name("calculator-server")
        .build_http()
        .await?;

    if save_smd("calculator.smd.json", http.server()) {
        println!("Service map written to calculator.smd.json");
    }

    println!("Calculator server running on http://127.0.0.1:9010/");
    println!("GET / returns the service map");
    println!();
    println!("Try: cargo run --example calculator_client");

    http.run().await?;

    smdrpc_core::shutdown_observability();

    Ok(())
}
