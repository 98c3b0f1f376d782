//! JSON-RPC client over HTTP POST
//!
//! Each call is one POST: the client numbers the request, encodes it, sends
//! it through its [`Transport`] and decodes the reply. The most recent
//! request and response are kept for inspection.
//!
//! # Headers
//!
//! `Content-Type` and `Accept` default to `application/json-rpc` and
//! `User-Agent` to `smdrpc-client/<version>`. Each default applies only when
//! the caller has not set that header already.
//!
//! # Thread Safety
//!
//! Calls take `&self`, so one client can be shared across tasks behind an
//! `Arc`. Ids stay unique across concurrent calls; "last request" and "last
//! response" then describe whichever call finished that step last.

use crate::metrics::ClientMetrics;
use crate::transport::{HttpTransport, Transport};
use http::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use smdrpc_core::{Error, Id, Params, Request, Response, Result, Version};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Media type sent in `Content-Type` and `Accept`
pub const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";

/// Default `User-Agent`
pub const DEFAULT_USER_AGENT: &str = concat!("smdrpc-client/", env!("CARGO_PKG_VERSION"));

/// JSON-RPC client
pub struct Client<T = HttpTransport> {
    transport: T,
    headers: HeaderMap,
    version: Version,
    last_id: AtomicI64,
    last_request: Mutex<Option<Request>>,
    last_response: Mutex<Option<Response>>,
    pub(crate) metrics: Option<Arc<ClientMetrics>>,
}

impl Client<HttpTransport> {
    /// Client posting to `url`
    ///
    /// For timeouts, custom headers or observability use
    /// [`ClientBuilder`](crate::ClientBuilder).
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(url)?))
    }
}

impl<T: Transport> Client<T> {
    /// Client sending through `transport`
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            headers: HeaderMap::new(),
            version: Version::V1,
            last_id: AtomicI64::new(0),
            last_request: Mutex::new(None),
            last_response: Mutex::new(None),
            metrics: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Headers sent with every request
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Envelope version used by [`Client::call`] and [`Client::notify`]
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) -> &mut Self {
        self.version = version;
        self
    }

    /// Request most recently handed to [`Client::do_request`]
    pub async fn last_request(&self) -> Option<Request> {
        self.last_request.lock().await.clone()
    }

    /// Response most recently decoded by [`Client::do_request`]
    pub async fn last_response(&self) -> Option<Response> {
        self.last_response.lock().await.clone()
    }

    /// Build a request with the next id; ids start at 1
    pub fn create_request(&self, method: &str, params: impl Into<Params>) -> Request {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let mut request = Request::new();
        request
            .set_version(self.version.as_str())
            .set_method(method)
            .set_params(params)
            .set_id(Some(Id::from(id)));
        request
    }

    /// Send a prepared request and decode the reply
    ///
    /// A reply carrying a fault is still `Ok`; see [`Client::call`] for the
    /// variant that turns it into an error.
    ///
    /// # Errors
    ///
    /// - `Error::Transport` when no reply arrived
    /// - `Error::Http` for a non-success status, with the status reason
    /// - `Error::InvalidResponse` when the body is not a response object
    pub async fn do_request(&self, request: &Request) -> Result<Response> {
        let body = self.send(request).await?;
        let response = Response::from_json(&body)?;
        *self.last_response.lock().await = Some(response.clone());
        Ok(response)
    }

    /// Call `method` and return its result
    ///
    /// # Errors
    ///
    /// Everything [`Client::do_request`] returns, plus `Error::Fault` with the
    /// remote fault when the response carries one.
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn call(&self, method: &str, params: impl Into<Params>) -> Result<Value> {
        let start = Instant::now();
        let request = self.create_request(method, params);

        let outcome = self
            .do_request(&request)
            .await
            .and_then(|mut response| match response.error().cloned() {
                Some(fault) => Err(Error::Fault(fault)),
                None => Ok(response.take_result().unwrap_or(Value::Null)),
            });

        let duration = start.elapsed().as_secs_f64();
        match &outcome {
            Ok(_) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, "success", duration);
                }
                tracing::debug!(duration_secs = duration, "Request completed successfully");
            }
            Err(error) => {
                if let Some(ref m) = self.metrics {
                    m.record_request(method, "error", duration);
                    m.record_error(ClientMetrics::error_kind(error));
                }
                tracing::error!(error = %error, "Request failed");
            }
        }
        outcome
    }

    /// Call with serializable params and decode the result
    ///
    /// `params` must serialize to an array, an object, `null` or `()`.
    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let result = self.call(method, to_params(params)?).await?;
        serde_json::from_value(result).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Send a request without id
    ///
    /// The server answers notifications with an empty body. A non-empty body
    /// is decoded anyway so a fault reported for the notification is not
    /// lost.
    #[tracing::instrument(skip(self, params), fields(method = %method))]
    pub async fn notify(&self, method: &str, params: impl Into<Params>) -> Result<()> {
        let mut request = Request::new();
        request
            .set_version(self.version.as_str())
            .set_method(method)
            .set_params(params);

        let body = self.send(&request).await?;
        if body.trim().is_empty() {
            return Ok(());
        }

        let response = Response::from_json(&body)?;
        let fault = response.error().cloned();
        *self.last_response.lock().await = Some(response);
        match fault {
            Some(fault) => Err(Error::Fault(fault)),
            None => Ok(()),
        }
    }

    /// Record and POST `request`, returning the body of a successful reply
    async fn send(&self, request: &Request) -> Result<String> {
        *self.last_request.lock().await = Some(request.clone());

        let headers = self.outgoing_headers();
        let reply = self.transport.send(&headers, request.to_json()).await?;

        if !reply.status.is_success() {
            let reason = reply
                .status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string();
            tracing::warn!(status = reply.status.as_u16(), reason = %reason, "Server replied with failure status");
            return Err(Error::Http {
                status: reply.status.as_u16(),
                reason,
            });
        }
        Ok(reply.body)
    }

    fn outgoing_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        headers
            .entry(CONTENT_TYPE)
            .or_insert(HeaderValue::from_static(JSON_RPC_CONTENT_TYPE));
        headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static(JSON_RPC_CONTENT_TYPE));
        headers
            .entry(USER_AGENT)
            .or_insert(HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers
    }
}

fn to_params<P: Serialize>(params: P) -> Result<Params> {
    let value = serde_json::to_value(params).map_err(|e| Error::Serialization(e.to_string()))?;
    if value.is_null() {
        return Ok(Params::new());
    }
    Params::from_value(&value).ok_or_else(|| {
        Error::InvalidArgument("params must serialize to an array or an object".to_string())
    })
}
