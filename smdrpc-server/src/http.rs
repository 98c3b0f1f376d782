//! HTTP binding
//!
//! JSON-RPC over HTTP/1.1 POST, with the SMD document served on GET:
//!
//! - `POST`: the body is one request; a successful notification gets
//!   `204 No Content` with an empty body, anything else `200` with the JSON
//!   response and the service map's content type
//! - `GET`: the service description
//! - other methods: `405 Method Not Allowed`
//!
//! ```rust,no_run
//! use smdrpc_server::{HttpServer, Server};
//!
//! # async fn example(server: Server) -> smdrpc_core::Result<()> {
//! let http = HttpServer::bind("127.0.0.1:8080".parse().unwrap(), server).await?;
//! println!("listening on {}", http.local_addr()?);
//! http.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::Server;
use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use smdrpc_core::smd::{ServiceMap, DEFAULT_CONTENT_TYPE};
use smdrpc_core::{Error, Request, Response, Result};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Build a request from a raw POST body
///
/// An empty body gives an empty request, which the dispatcher answers with
/// `Invalid Request`.
pub fn request_from_body(body: &str) -> Request {
    let mut request = Request::new();
    if !body.is_empty() {
        request.load_json(body);
    }
    request
}

/// Turn a dispatcher response into an HTTP response
pub fn render(response: &Response) -> http::Response<Full<Bytes>> {
    if !response.is_error() && response.id().is_none() {
        let mut reply = http::Response::new(Full::new(Bytes::new()));
        *reply.status_mut() = StatusCode::NO_CONTENT;
        return reply;
    }

    let content_type = response
        .service_map()
        .map(ServiceMap::content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    json_reply(StatusCode::OK, response.to_json(), content_type)
}

fn json_reply(status: StatusCode, body: String, content_type: &str) -> http::Response<Full<Bytes>> {
    let mut reply = http::Response::new(Full::new(Bytes::from(body)));
    *reply.status_mut() = status;
    let value = HeaderValue::from_str(content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    reply.headers_mut().insert(CONTENT_TYPE, value);
    reply
}

fn status_reply(status: StatusCode) -> http::Response<Full<Bytes>> {
    let mut reply = http::Response::new(Full::new(Bytes::from(
        status.canonical_reason().unwrap_or_default(),
    )));
    *reply.status_mut() = status;
    reply
}

/// A [`Server`] listening on a TCP socket
pub struct HttpServer {
    listener: TcpListener,
    server: Arc<Server>,
}

impl HttpServer {
    /// Bind the listener; serving starts with [`HttpServer::run`]
    pub async fn bind(addr: SocketAddr, server: Server) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            server: Arc::new(server),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Accept connections until the listener fails
    #[tracing::instrument(skip(self), name = "server.run")]
    pub async fn run(self) -> Result<()> {
        tracing::info!(addr = ?self.listener.local_addr().ok(), "Starting smdrpc HTTP server");

        loop {
            let (stream, addr) = self
                .listener
                .accept()
                .await
                .map_err(|e| Error::Io(e.to_string()))?;
            tracing::debug!(addr = %addr, "New connection accepted");

            let server = Arc::clone(&self.server);
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| handle_request(req, Arc::clone(&server)));

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::error!(addr = %addr, error = %e, "Connection error");
                }
            });
        }
    }
}

async fn handle_request(
    req: hyper::Request<Incoming>,
    server: Arc<Server>,
) -> std::result::Result<http::Response<Full<Bytes>>, Infallible> {
    let reply = match *req.method() {
        Method::POST => {
            let body = match req.into_body().collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read request body");
                    return Ok(status_reply(StatusCode::BAD_REQUEST));
                }
            };
            let request = match std::str::from_utf8(&body) {
                Ok(text) => request_from_body(text),
                Err(e) => {
                    tracing::warn!(error = %e, "Request body is not UTF-8");
                    Request::parse_failed()
                }
            };
            let response = server.handle(&request).await;
            render(&response)
        }
        Method::GET => {
            let smd = server.service_map();
            json_reply(StatusCode::OK, smd.to_json(), smd.content_type())
        }
        _ => {
            let mut reply = status_reply(StatusCode::METHOD_NOT_ALLOWED);
            reply
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, POST"));
            reply
        }
    };
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smdrpc_core::{Fault, Id};

    async fn body_text(reply: http::Response<Full<Bytes>>) -> String {
        let bytes = reply.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_empty_body_is_empty_request() {
        let request = request_from_body("");
        assert!(request.method().is_empty());
        assert!(!request.is_parse_error());
    }

    #[test]
    fn test_body_parse_error_flagged() {
        assert!(request_from_body("{oops").is_parse_error());
    }

    #[tokio::test]
    async fn test_notification_renders_no_content() {
        let mut response = Response::new();
        response.set_result(json!("ignored"));
        let reply = render(&response);
        assert_eq!(reply.status(), StatusCode::NO_CONTENT);
        assert!(body_text(reply).await.is_empty());
    }

    #[tokio::test]
    async fn test_notification_fault_still_rendered() {
        let mut response = Response::new();
        response.fault("Method not found", Fault::INVALID_METHOD, None);
        let reply = render(&response);
        assert_eq!(reply.status(), StatusCode::OK);
        assert!(body_text(reply).await.contains("-32601"));
    }

    #[tokio::test]
    async fn test_content_type_from_service_map() {
        let mut smd = ServiceMap::new();
        smd.set_content_type("application/json-rpc").unwrap();

        let mut response = Response::new();
        response
            .set_id(Some(Id::from(1i64)))
            .set_result(json!(true))
            .set_service_map(Some(Arc::new(smd)));

        let reply = render(&response);
        assert_eq!(reply.headers()[CONTENT_TYPE], "application/json-rpc");
        let body: serde_json::Value = serde_json::from_str(&body_text(reply).await).unwrap();
        assert_eq!(body, json!({"id": 1, "result": true}));
    }

    #[test]
    fn test_default_content_type() {
        let mut response = Response::new();
        response.set_id(Some(Id::from("x")));
        let reply = render(&response);
        assert_eq!(reply.headers()[CONTENT_TYPE], DEFAULT_CONTENT_TYPE);
    }
}
