//! Metrics endpoint handler for Prometheus scraping.
//!
//! Every request runs a full scrape on the blocking pool and encodes the
//! registry in the Prometheus text format.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Buffer capacity for metrics encoding.
const BUFFER_CAP: usize = 64 * 1024;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    ScrapeFailed,
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> axum::response::Response {
        let body = match self {
            MetricsError::ScrapeFailed => "Failed to run collectors",
            MetricsError::EncodingFailed => "Failed to encode metrics",
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, MetricsError> {
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();
    state.health_stats.record_metrics_endpoint_call();

    // Sources do blocking file I/O.
    let scraper = state.scraper.clone();
    let report = tokio::task::spawn_blocking(move || scraper.scrape())
        .await
        .map_err(|e| {
            error!("Scrape task failed: {}", e);
            MetricsError::ScrapeFailed
        })?;

    let scrape_seconds = start.elapsed().as_secs_f64();
    state.health_stats.record_scrape(&report, scrape_seconds);
    if let Some(telemetry) = &state.telemetry {
        telemetry.observe_scrape(scrape_seconds, report.total_samples());
    }

    let serialize_start = Instant::now();
    let families = state.registry.gather();
    let mut buffer = Vec::with_capacity(BUFFER_CAP);

    if let Err(e) = TextEncoder::new().encode(&families, &mut buffer) {
        error!("Failed to encode Prometheus metrics: {}", e);
        return Err(MetricsError::EncodingFailed);
    }

    state
        .health_stats
        .record_serialization_duration_ms(serialize_start.elapsed().as_secs_f64() * 1000.0);
    state
        .health_stats
        .record_metrics_response_size_kb(buffer.len() as f64 / 1024.0);

    debug!(
        "Metrics request completed: {} samples, {} bytes, {:.3}ms",
        report.total_samples(),
        buffer.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    String::from_utf8(buffer).map_err(|_| MetricsError::EncodingFailed)
}
