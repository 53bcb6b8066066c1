//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tx_broadcasts_total` (counter): broadcasts by kind (initial, rebroadcast) and status
//! - `tx_confirmation_outcomes_total` (counter): race outcomes by outcome and source
//! - `tx_confirmation_latency_seconds` (histogram): submission to confirmation
//! - `rpc_requests_total` (counter): JSON-RPC calls by method and status
//! - `tx_simulations_total` (counter): diagnostic simulations by status

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_broadcast(kind: &'static str, ok: bool) {
    let status = if ok { "ok" } else { "error" };
    counter!("tx_broadcasts_total", "kind" => kind, "status" => status).increment(1);
}

pub fn record_confirmation_outcome(outcome: &'static str, source: &'static str) {
    counter!("tx_confirmation_outcomes_total", "outcome" => outcome, "source" => source)
        .increment(1);
}

pub fn record_confirmation_latency(latency: Duration) {
    histogram!("tx_confirmation_latency_seconds").record(latency.as_secs_f64());
}

pub fn record_rpc_request(method: &str, status: &'static str) {
    counter!("rpc_requests_total", "method" => method.to_string(), "status" => status)
        .increment(1);
}

pub fn record_simulation(status: &'static str) {
    counter!("tx_simulations_total", "status" => status).increment(1);
}
