//! Calculator client example
//!
//! Talks to `calculator_server` with positional, named and typed calls.
//!
//! Run with: cargo run --example calculator_client

use serde::Serialize;
use serde_json::json;
use smdrpc_client::ClientBuilder;
use smdrpc_core::{Error, Version};
use std::time::Duration;

#[derive(Serialize)]
struct DivideParams {
    a: f64,
    b: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let client = ClientBuilder::new("http://127.0.0.1:9010/")
        .version(Version::V2)
        .timeout(Duration::from_secs(5))
        .build()?;

    for i in 1..=3 {
        let sum = client.call("calc.add", vec![json!(i * 10), json!(i * 5)]).await?;
        println!("{} + {} = {}", i * 10, i * 5, sum);
    }

    let quotient: f64 = client
        .request("calc.divide", DivideParams { a: 7.0, b: 2.0 })
        .await?;
    println!("7 / 2 = {}", quotient);

    match client.call("calc.divide", vec![json!(1), json!(0)]).await {
        Err(Error::Fault(fault)) => println!("1 / 0 failed: {} ({})", fault.message(), fault.code()),
        other => println!("unexpected outcome: {:?}", other),
    }

    let greeting: String = client.request("greet", json!({"name": "Ada"})).await?;
    println!("{}", greeting);

    client.notify("calc.add", vec![json!(0), json!(0)]).await?;
    let operations: u64 = client.request("calc.operations", ()).await?;
    println!("Server performed {} operations", operations);

    if let Some(request) = client.last_request().await {
        println!("Last request: {}", request);
    }

    Ok(())
}
