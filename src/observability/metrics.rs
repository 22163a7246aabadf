//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by route, method, status
//! - `edge_request_duration_seconds` (histogram): latency by route
//! - `edge_token_refresh_total` (counter): token exchanges by outcome
//! - `edge_upstream_errors_total` (counter): failed forwards by route, kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "edge_requests_total",
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("edge_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_token_refresh(outcome: &'static str) {
    metrics::counter!("edge_token_refresh_total", "outcome" => outcome).increment(1);
}

pub fn record_upstream_error(route: &str, kind: &'static str) {
    metrics::counter!(
        "edge_upstream_errors_total",
        "route" => route.to_string(),
        "kind" => kind
    )
    .increment(1);
}
