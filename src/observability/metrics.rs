//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_requests_total` (counter): requests by transport and execution mode
//! - `server_request_duration_seconds` (histogram): time from normalization to send
//! - `server_events_published_total` (counter): bus publishes by event name
//! - `server_listener_failures_total` (counter): listeners that errored or panicked
//! - `server_tasks_enqueued_total` (counter): task offloads by outcome
//! - `server_worker_restarts_total` (counter): worker recycles by reason

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(transport: &'static str, mode: &'static str, start: Instant) {
    metrics::counter!("server_requests_total", "transport" => transport, "mode" => mode)
        .increment(1);
    metrics::histogram!("server_request_duration_seconds", "transport" => transport)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_event(event: &str) {
    metrics::counter!("server_events_published_total", "event" => event.to_string())
        .increment(1);
}

pub fn record_listener_failure(event: &str) {
    metrics::counter!("server_listener_failures_total", "event" => event.to_string())
        .increment(1);
}

pub fn record_task_enqueued(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    metrics::counter!("server_tasks_enqueued_total", "outcome" => outcome).increment(1);
}

pub fn record_worker_restart(reason: &'static str) {
    metrics::counter!("server_worker_restarts_total", "reason" => reason).increment(1);
}
