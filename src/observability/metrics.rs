//! Metrics collection and exposition.
//!
//! # Metrics
//! - `di_providers_constructed_total` (counter): constructions by provider
//! - `di_cleanup_failures_total` (counter): failed releases by provider
//! - `http_requests_total` (counter): requests by route
//!
//! # Design Decisions
//! - Recording is always safe; without an installed recorder it is a no-op
//! - Exporter is opt-in through `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_construction(provider: &str) {
    counter!("di_providers_constructed_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_cleanup_failure(provider: &str) {
    counter!("di_cleanup_failures_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_request(route: &'static str) {
    counter!("http_requests_total", "route" => route).increment(1);
}
