//! Metrics collection and exposition.
//!
//! # Metrics
//! - `policy_cors_preflight_total` (counter): preflights answered
//! - `policy_cors_rejected_total` (counter): cross-origin requests refused, by `reason`
//! - `policy_negotiated_total` (counter): responses by negotiated `media_type`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_preflight() {
    metrics::counter!("policy_cors_preflight_total").increment(1);
}

pub fn record_cors_rejected(reason: &'static str) {
    metrics::counter!("policy_cors_rejected_total", "reason" => reason).increment(1);
}

pub fn record_negotiated(media_type: &'static str) {
    metrics::counter!("policy_negotiated_total", "media_type" => media_type).increment(1);
}
