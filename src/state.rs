//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use herakles_disk_exporter::health_stats::HealthStats;
use herakles_disk_exporter::{CollectorInfo, Scraper};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::metrics::ExporterMetrics;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub registry: Registry,
    pub scraper: Arc<Scraper>,
    /// `None` when telemetry is disabled.
    pub telemetry: Option<ExporterMetrics>,
    pub collectors: Vec<CollectorInfo>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}
