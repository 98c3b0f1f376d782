//! Common test utilities for smdrpc-client integration tests
//!
//! A bare HTTP/1.1 responder on a local socket, enough to exercise the
//! client's real transport without a full smdrpc server.

#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// One request as the mock saw it
#[derive(Debug, Clone)]
pub struct Received {
    /// Lower-cased header names with their values
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock HTTP server answering every POST through a handler
pub struct MockHttpServer {
    addr: SocketAddr,
    received: mpsc::Receiver<Received>,
}

impl MockHttpServer {
    /// Start a mock server; `handler` maps a request body to status and body
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(100);
        let handler = std::sync::Arc::new(handler);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Some(received) = read_request(stream, |body| handler(body)).await {
                        let _ = tx.send(received).await;
                    }
                });
            }
        });

        Self { addr, received: rx }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Next request the server answered
    pub async fn next_request(&mut self) -> Received {
        tokio::time::timeout(std::time::Duration::from_secs(5), self.received.recv())
            .await
            .expect("no request within timeout")
            .expect("mock server stopped")
    }
}

async fn read_request<F>(mut stream: TcpStream, respond: F) -> Option<Received>
where
    F: Fn(&str) -> (u16, String),
{
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let headers: Vec<(String, String)> = head
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    let length: usize = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);

    while buf.len() < head_end + length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

    let (status, reply) = respond(&body);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json-rpc\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason(status),
        reply.len(),
        reply
    );
    stream.write_all(response.as_bytes()).await.ok()?;
    stream.shutdown().await.ok()?;

    Some(Received { headers, body })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

/// `{"result": result, "id": id}`
pub fn mock_response(id: i64, result: serde_json::Value) -> String {
    serde_json::json!({"result": result, "id": id}).to_string()
}

/// `{"error": {code, message}, "id": id}`
pub fn mock_error_response(id: i64, code: i32, message: &str) -> String {
    serde_json::json!({"error": {"code": code, "message": message}, "id": id}).to_string()
}
