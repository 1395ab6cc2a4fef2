//! Herakles Disk Exporter Library
//!
//! This library provides the collector framework behind the exporter binary:
//! a small `Collector` abstraction, an explicit collector registry, the
//! per-disk I/O statistics collector and the scrape coordinator that turns
//! collected samples into Prometheus metric families.
//!
//! # Features
//!
//! - **Pluggable statistics sources**: the disk collector reads snapshots through
//!   the [`DiskStatsSource`] trait (procfs, synthetic test data, or a fake in tests)
//! - **Explicit registration**: collectors are registered in a [`CollectorRegistry`]
//!   by the process driver at startup, each with a default-enabled flag
//! - **Fail-fast collection**: a failed snapshot is reported once per scrape and
//!   never produces partial or zero-valued series
//!
//! # Usage
//!
//! ```rust
//! use herakles_disk_exporter::collector::{Collector, Sample};
//! use herakles_disk_exporter::collectors::diskstats::{
//!     DiskSnapshot, DiskStat, DiskStatsSource, DiskstatsCollector, SourceError,
//! };
//!
//! struct StaticSource;
//!
//! impl DiskStatsSource for StaticSource {
//!     fn name(&self) -> &'static str {
//!         "static"
//!     }
//!
//!     fn snapshot(&self) -> Result<DiskSnapshot, SourceError> {
//!         let mut disks = DiskSnapshot::default();
//!         disks.insert(
//!             "hdisk0".to_string(),
//!             DiskStat { rblks: 100, wblks: 50, time: 10.0, rserv: 4.0, wserv: 6.0 },
//!         );
//!         Ok(disks)
//!     }
//! }
//!
//! let collector = DiskstatsCollector::new(Box::new(StaticSource));
//! let mut samples: Vec<Sample> = Vec::new();
//! collector.update(&mut samples).unwrap();
//!
//! assert_eq!(samples.len(), 5);
//! assert_eq!(samples[0].value, 51200.0);
//! ```

pub mod collector;
pub mod collectors;
pub mod health_stats;
pub mod registry;
pub mod scrape;

// Re-export main types for convenience
pub use collector::{
    Collector, CollectorError, MetricSink, Sample, SourceError, TypedDesc, ValueType,
};
pub use collectors::diskstats::{DiskSnapshot, DiskStat, DiskStatsSource, DiskstatsCollector};
pub use collectors::{register_builtin_collectors, CollectorContext};
pub use registry::{CollectorInfo, CollectorRegistry, RegistryError};
pub use scrape::{ScrapeReport, Scraper};
