//! Metrics collection and exposition.
//!
//! # Metrics
//! - `product_api_requests_total` (counter): requests by method, status
//! - `product_api_request_duration_seconds` (histogram): end-to-end latency
//! - `product_api_admission_decisions_total` (counter): gate outcomes
//! - `product_api_datastore_queries_total` (counter): statements by kind, outcome
//! - `product_api_datastore_query_duration_seconds` (histogram): statement latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "product_api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("product_api_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// `outcome` is `allowed`, a deny reason, or `dry_run_<reason>`.
pub fn record_admission(outcome: &str) {
    counter!("product_api_admission_decisions_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_query(statement: &'static str, ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!(
        "product_api_datastore_queries_total",
        "statement" => statement,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("product_api_datastore_query_duration_seconds", "statement" => statement)
        .record(start.elapsed().as_secs_f64());
}
