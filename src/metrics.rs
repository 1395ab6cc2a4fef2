//! Internal exporter telemetry.
//!
//! Gauges describing the exporter itself, registered next to the collector
//! metrics unless telemetry is disabled.

use prometheus::{Gauge, GaugeVec, Opts, Registry};

use crate::BUILD_GIT_SHA;

/// Telemetry gauges updated on every `/metrics` request.
#[derive(Clone)]
pub struct ExporterMetrics {
    pub scrape_duration_seconds: Gauge,
    pub samples_total: Gauge,
}

impl ExporterMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let scrape_duration_seconds = Gauge::new(
            "herakles_exporter_scrape_duration_seconds",
            "Time spent running all collectors for the last /metrics request",
        )?;
        let samples_total = Gauge::new(
            "herakles_exporter_samples_total",
            "Number of samples emitted by collectors in the last scrape",
        )?;
        // Constant 1, labelled with version and git_sha.
        let build_info = GaugeVec::new(
            Opts::new(
                "herakles_exporter_build_info",
                "Build information of herakles-disk-exporter",
            ),
            &["version", "git_sha"],
        )?;

        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(samples_total.clone()))?;
        registry.register(Box::new(build_info.clone()))?;

        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION"), BUILD_GIT_SHA])
            .set(1.0);

        Ok(Self {
            scrape_duration_seconds,
            samples_total,
        })
    }

    pub fn observe_scrape(&self, duration_seconds: f64, samples: usize) {
        self.scrape_duration_seconds.set(duration_seconds);
        self.samples_total.set(samples as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_telemetry_once() {
        let registry = Registry::new();
        let metrics = ExporterMetrics::new(&registry).unwrap();
        metrics.observe_scrape(0.5, 15);

        assert_eq!(metrics.samples_total.get(), 15.0);
        assert_eq!(metrics.scrape_duration_seconds.get(), 0.5);
        assert!(ExporterMetrics::new(&registry).is_err());
    }
}
