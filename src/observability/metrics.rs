//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_requests_total` (counter): requests by method, status, outcome;
//!   methods outside the known verb set are labelled `OTHER`
//! - `dispatch_request_duration_seconds` (histogram): end-to-end dispatch latency
//!
//! # Design Decisions
//! - Outcome label is one of succeeded / faulted / exhausted / aborted
//! - Exporter is optional; recording without one costs nothing

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::routing::verb::Verb;

pub const REQUESTS_TOTAL: &str = "dispatch_requests_total";
pub const REQUEST_DURATION: &str = "dispatch_request_duration_seconds";

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Label for a request verb; extension methods share one label.
pub fn method_label(verb: Option<Verb>) -> &'static str {
    verb.map_or("OTHER", |v| v.as_str())
}

/// Record one finished request.
pub fn record_request(verb: Option<Verb>, status: u16, outcome: &'static str, start_time: Instant) {
    let method = method_label(verb);
    counter!(
        REQUESTS_TOTAL,
        "method" => method,
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(REQUEST_DURATION, "method" => method)
        .record(start_time.elapsed().as_secs_f64());
}
