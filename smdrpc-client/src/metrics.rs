//! Client metrics
//!
//! Recorded when the client is built with observability enabled:
//!
//! - `smdrpc.client.requests.total`: calls sent, by method and outcome
//! - `smdrpc.client.request.duration`: round trip time in seconds
//! - `smdrpc.client.errors.total`: failed calls by error kind
//!
//! # Examples
//!
//! ```rust,no_run
//! use smdrpc_client::ClientMetrics;
//!
//! let metrics = ClientMetrics::new();
//! metrics.record_request("math.add", "success", 0.012);
//! ```

use opentelemetry::{
    global,
    metrics::{Counter, Histogram, Meter},
    KeyValue,
};
use smdrpc_core::Error;

const METER_NAME: &str = "smdrpc.client";

pub struct ClientMetrics {
    pub requests_total: Counter<u64>,
    /// Request duration in seconds
    pub request_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
}

impl ClientMetrics {
    /// Instruments on the global meter provider
    pub fn new() -> Self {
        Self::new_with_meter(&global::meter(METER_NAME))
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("smdrpc.client.requests.total")
                .with_description("Total number of requests sent")
                .build(),
            request_duration: meter
                .f64_histogram("smdrpc.client.request.duration")
                .with_description("Request duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("smdrpc.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
        }
    }

    /// Record a request
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Label used for `error_type`
    pub fn error_kind(error: &Error) -> &'static str {
        match error {
            Error::Fault(_) => "fault",
            Error::Http { .. } => "http",
            Error::Transport(_) => "transport",
            Error::InvalidResponse(_) => "invalid_response",
            Error::Serialization(_) => "serialization",
            _ => "other",
        }
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
