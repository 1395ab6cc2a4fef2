//! HTTP endpoint handlers for the exporter.
//!
//! - `/`: Landing page
//! - `/metrics`: Prometheus metrics endpoint
//! - `/health`: Health check endpoint
//! - `/config`: Effective configuration as YAML

pub mod config;
pub mod health;
pub mod metrics;
pub mod root;

pub use config::config_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use root::root_handler;

/// Footer text for human-readable HTTP endpoints.
pub const FOOTER_TEXT: &str = "Project: https://github.com/cansp-dev/herakles-disk-exporter | Support: exporter@herakles.now";
