//! Server metrics
//!
//! Recorded when the server is built with observability enabled:
//!
//! - `smdrpc.server.requests.total`: handled requests by method and outcome
//! - `smdrpc.server.request.duration`: handling time in seconds
//! - `smdrpc.server.faults.total`: fault responses by code
//! - `smdrpc.server.methods.registered`: size of the method table

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};
use std::time::Duration;

const METER_NAME: &str = "smdrpc.server";

pub struct ServerMetrics {
    pub requests_total: Counter<u64>,
    pub request_duration: Histogram<f64>,
    pub faults_total: Counter<u64>,
    pub methods_registered: Gauge<u64>,
}

impl ServerMetrics {
    /// Instruments on the global meter provider
    pub fn new() -> Self {
        Self::new_with_meter(&global::meter(METER_NAME))
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            requests_total: meter
                .u64_counter("smdrpc.server.requests.total")
                .with_description("Total number of requests handled")
                .build(),
            request_duration: meter
                .f64_histogram("smdrpc.server.request.duration")
                .with_description("Request handling duration in seconds")
                .build(),
            faults_total: meter
                .u64_counter("smdrpc.server.faults.total")
                .with_description("Total number of fault responses")
                .build(),
            methods_registered: meter
                .u64_gauge("smdrpc.server.methods.registered")
                .with_description("Number of registered methods")
                .build(),
        }
    }

    /// Record one handled request; `fault_code` is `None` on success.
    /// `method` should be a registered name; the dispatcher passes
    /// `"unknown"` for anything else.
    pub fn record_request(&self, method: &str, fault_code: Option<i32>, elapsed: Duration) {
        let status = if fault_code.is_some() { "fault" } else { "success" };
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(elapsed.as_secs_f64(), attributes);

        if let Some(code) = fault_code {
            self.faults_total
                .add(1, &[KeyValue::new("code", i64::from(code))]);
        }
    }

    pub fn record_methods(&self, count: usize) {
        self.methods_registered.record(count as u64, &[]);
    }
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
