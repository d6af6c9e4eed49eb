//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by endpoint, method, status
//! - `api_request_duration_seconds` (histogram): latency distribution
//! - `api_rejections_total` (counter): dispatch rejections by error kind
//! - `api_rate_limited_total` (counter): calls refused by the rate quota
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Unknown paths are labelled `unknown` to bound label cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Label used for requests that did not resolve to an endpoint.
pub const UNKNOWN_ENDPOINT: &str = "unknown";

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request.
pub fn record_request(endpoint: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "api_requests_total",
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "api_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request rejected before reaching its handler.
pub fn record_rejection(kind: &'static str) {
    metrics::counter!("api_rejections_total", "kind" => kind).increment(1);
}

/// Record a call refused by the rate quota.
pub fn record_rate_limited() {
    metrics::counter!("api_rate_limited_total").increment(1);
}
