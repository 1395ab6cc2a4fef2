//! Disk I/O statistics collector.
//!
//! This module reads a per-disk snapshot from a [`DiskStatsSource`] and
//! republishes every record as five counter samples labelled by device:
//! bytes read, bytes written, total I/O time, read time and write time.

pub mod procfs;
pub mod testdata;

use ahash::AHashMap as HashMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::collector::{Collector, CollectorError, MetricSink, TypedDesc, ValueType};

pub use crate::collector::SourceError;

pub use procfs::ProcDiskstatsSource;
pub use testdata::TestDataSource;

/// Name under which this collector is registered.
pub const COLLECTOR_NAME: &str = "diskstats";

/// Size of one statistics block in bytes.
pub const BLOCK_SIZE_BYTES: u64 = 512;

const NAMESPACE: &str = "node";
const SUBSYSTEM: &str = "disk";
const DEVICE_LABEL: &str = "device";

/// I/O counters for a single disk.
///
/// Service times are expected in seconds; converting platform units is the
/// source's job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStat {
    /// Blocks read.
    pub rblks: u64,
    /// Blocks written.
    pub wblks: u64,
    /// Cumulative I/O service time.
    pub time: f64,
    /// Cumulative read service time.
    pub rserv: f64,
    /// Cumulative write service time.
    pub wserv: f64,
}

impl DiskStat {
    pub fn read_bytes(&self) -> u64 {
        self.rblks.saturating_mul(BLOCK_SIZE_BYTES)
    }

    pub fn written_bytes(&self) -> u64 {
        self.wblks.saturating_mul(BLOCK_SIZE_BYTES)
    }
}

/// All per-disk records from one collection cycle, keyed by disk name.
pub type DiskSnapshot = HashMap<String, DiskStat>;

/// Platform facility returning the current per-disk snapshot.
pub trait DiskStatsSource: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn snapshot(&self) -> Result<DiskSnapshot, SourceError>;
}

/// Where the collector reads its snapshots from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Procfs,
    Testdata,
}

/// Resolved settings for building a [`DiskstatsCollector`].
#[derive(Debug, Clone)]
pub struct DiskstatsSettings {
    pub source: SourceKind,
    pub procfs_path: PathBuf,
    pub test_data_file: Option<PathBuf>,
    pub device_include: Option<String>,
    pub device_exclude: Option<String>,
}

impl Default for DiskstatsSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::Procfs,
            procfs_path: PathBuf::from(procfs::DEFAULT_DISKSTATS_PATH),
            test_data_file: None,
            device_include: None,
            device_exclude: None,
        }
    }
}

impl DiskstatsSettings {
    /// Opens the source selected by `source`.
    pub fn build_source(&self) -> Result<Box<dyn DiskStatsSource>, CollectorError> {
        match self.source {
            SourceKind::Procfs => Ok(Box::new(ProcDiskstatsSource::new(&self.procfs_path))),
            SourceKind::Testdata => {
                let path = self.test_data_file.as_ref().ok_or_else(|| {
                    CollectorError::Config(
                        "testdata source selected but no test_data_file is set".to_string(),
                    )
                })?;
                Ok(Box::new(TestDataSource::new(path)))
            }
        }
    }
}

/// Include/exclude filter on device names.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl DeviceFilter {
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Result<Self, CollectorError> {
        if include.is_some() && exclude.is_some() {
            return Err(CollectorError::Config(
                "device_include and device_exclude are mutually exclusive".to_string(),
            ));
        }

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                CollectorError::Config(format!("invalid device pattern '{}': {}", pattern, e))
            })
        };

        Ok(Self {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    pub fn ignored(&self, device: &str) -> bool {
        if let Some(include) = &self.include {
            return !include.is_match(device);
        }
        if let Some(exclude) = &self.exclude {
            return exclude.is_match(device);
        }
        false
    }
}

/// Collector exposing per-disk I/O counters.
pub struct DiskstatsCollector {
    rbytes: Arc<TypedDesc>,
    wbytes: Arc<TypedDesc>,
    time: Arc<TypedDesc>,
    rtime: Arc<TypedDesc>,
    wtime: Arc<TypedDesc>,
    source: Box<dyn DiskStatsSource>,
    device_filter: DeviceFilter,
}

impl DiskstatsCollector {
    pub fn new(source: Box<dyn DiskStatsSource>) -> Self {
        let desc = |name: &str, help: &str| {
            TypedDesc::new(
                NAMESPACE,
                SUBSYSTEM,
                name,
                help,
                ValueType::Counter,
                &[DEVICE_LABEL],
            )
        };

        Self {
            rbytes: desc(
                "read_bytes_total",
                "The total number of bytes read successfully.",
            ),
            wbytes: desc(
                "written_bytes_total",
                "The total number of bytes written successfully.",
            ),
            time: desc("io_time_seconds_total", "Total seconds spent doing I/Os."),
            rtime: desc(
                "read_time_seconds_total",
                "The total number of seconds spent by all reads.",
            ),
            wtime: desc(
                "write_time_seconds_total",
                "This is the total number of seconds spent by all writes.",
            ),
            source,
            device_filter: DeviceFilter::default(),
        }
    }

    pub fn with_device_filter(mut self, device_filter: DeviceFilter) -> Self {
        self.device_filter = device_filter;
        self
    }

    /// Builds the collector with the source and filter named in `settings`.
    pub fn from_settings(settings: &DiskstatsSettings) -> Result<Self, CollectorError> {
        let source = settings.build_source()?;

        let device_filter = DeviceFilter::new(
            settings.device_include.as_deref(),
            settings.device_exclude.as_deref(),
        )?;

        debug!(
            "diskstats collector using '{}' source (include={:?}, exclude={:?})",
            source.name(),
            settings.device_include,
            settings.device_exclude
        );

        Ok(Self::new(source).with_device_filter(device_filter))
    }
}

impl Collector for DiskstatsCollector {
    fn describe(&self) -> Vec<Arc<TypedDesc>> {
        vec![
            Arc::clone(&self.rbytes),
            Arc::clone(&self.wbytes),
            Arc::clone(&self.time),
            Arc::clone(&self.rtime),
            Arc::clone(&self.wtime),
        ]
    }

    fn update(&self, sink: &mut dyn MetricSink) -> Result<(), CollectorError> {
        let diskstats = self.source.snapshot()?;

        for (diskname, data) in &diskstats {
            if self.device_filter.ignored(diskname) {
                trace!("Ignoring device: {}", diskname);
                continue;
            }

            let device = [diskname.as_str()];
            sink.emit(self.rbytes.new_sample(data.read_bytes() as f64, &device));
            sink.emit(self.wbytes.new_sample(data.written_bytes() as f64, &device));
            sink.emit(self.time.new_sample(data.time, &device));
            sink.emit(self.rtime.new_sample(data.rserv, &device));
            sink.emit(self.wtime.new_sample(data.wserv, &device));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::Sample;
    use std::collections::HashSet;
    use std::sync::mpsc;

    /// Source returning a fixed snapshot, or failing on demand.
    struct FakeSource {
        disks: Option<Vec<(&'static str, DiskStat)>>,
    }

    impl FakeSource {
        fn with(disks: Vec<(&'static str, DiskStat)>) -> Box<Self> {
            Box::new(Self { disks: Some(disks) })
        }

        fn failing() -> Box<Self> {
            Box::new(Self { disks: None })
        }
    }

    impl DiskStatsSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn snapshot(&self) -> Result<DiskSnapshot, SourceError> {
            match &self.disks {
                Some(disks) => Ok(disks
                    .iter()
                    .map(|(name, stat)| (name.to_string(), *stat))
                    .collect()),
                None => Err(SourceError::Parse {
                    path: PathBuf::from("fake"),
                    reason: "simulated failure".to_string(),
                }),
            }
        }
    }

    fn stat(rblks: u64, wblks: u64, time: f64, rserv: f64, wserv: f64) -> DiskStat {
        DiskStat {
            rblks,
            wblks,
            time,
            rserv,
            wserv,
        }
    }

    fn collect(collector: &DiskstatsCollector) -> Vec<Sample> {
        let mut samples = Vec::new();
        collector.update(&mut samples).expect("update failed");
        samples
    }

    #[test]
    fn test_single_disk_emits_five_samples_in_order() {
        let collector =
            DiskstatsCollector::new(FakeSource::with(vec![("hdisk0", stat(100, 50, 10.0, 4.0, 6.0))]));

        let samples = collect(&collector);
        let got: Vec<(&str, f64)> = samples
            .iter()
            .map(|s| (s.desc.fq_name.as_str(), s.value))
            .collect();

        assert_eq!(
            got,
            vec![
                ("node_disk_read_bytes_total", 51200.0),
                ("node_disk_written_bytes_total", 25600.0),
                ("node_disk_io_time_seconds_total", 10.0),
                ("node_disk_read_time_seconds_total", 4.0),
                ("node_disk_write_time_seconds_total", 6.0),
            ]
        );
        for sample in &samples {
            assert_eq!(sample.label_values, vec!["hdisk0".to_string()]);
            assert_eq!(sample.desc.value_type, ValueType::Counter);
        }
    }

    #[test]
    fn test_empty_snapshot_emits_nothing() {
        let collector = DiskstatsCollector::new(FakeSource::with(vec![]));
        assert!(collect(&collector).is_empty());
    }

    #[test]
    fn test_many_disks_emit_five_per_disk_without_duplicates() {
        let disks = vec![
            ("hdisk0", stat(1, 2, 3.0, 4.0, 5.0)),
            ("hdisk1", stat(10, 20, 30.0, 40.0, 50.0)),
            ("hdisk2", stat(0, 0, 0.0, 0.0, 0.0)),
        ];
        let collector = DiskstatsCollector::new(FakeSource::with(disks));
        let samples = collect(&collector);

        assert_eq!(samples.len(), 15);

        let unique: HashSet<(String, String)> = samples
            .iter()
            .map(|s| (s.desc.fq_name.clone(), s.label_values[0].clone()))
            .collect();
        assert_eq!(unique.len(), 15);

        // Each disk's five samples are contiguous and in field order.
        for chunk in samples.chunks(5) {
            let device = &chunk[0].label_values[0];
            assert!(chunk.iter().all(|s| &s.label_values[0] == device));
            assert_eq!(chunk[0].desc.fq_name, "node_disk_read_bytes_total");
            assert_eq!(chunk[4].desc.fq_name, "node_disk_write_time_seconds_total");
        }
    }

    #[test]
    fn test_labels_do_not_leak_between_disks() {
        let collector = DiskstatsCollector::new(FakeSource::with(vec![
            ("hdisk0", stat(1, 1, 1.0, 1.0, 1.0)),
            ("hdisk1", stat(2, 2, 2.0, 2.0, 2.0)),
        ]));

        for sample in collect(&collector) {
            let expected = match sample.label("device") {
                Some("hdisk0") => 1.0,
                Some("hdisk1") => 2.0,
                other => panic!("unexpected device label {:?}", other),
            };
            let scale = if sample.desc.fq_name.ends_with("_bytes_total") {
                BLOCK_SIZE_BYTES as f64
            } else {
                1.0
            };
            assert_eq!(sample.value, expected * scale);
        }
    }

    #[test]
    fn test_source_failure_emits_nothing() {
        let collector = DiskstatsCollector::new(FakeSource::failing());
        let mut samples = Vec::new();

        let result = collector.update(&mut samples);

        assert!(matches!(result, Err(CollectorError::Source(_))));
        assert!(samples.is_empty());
    }

    #[test]
    fn test_identical_snapshots_are_idempotent() {
        let disks = vec![
            ("hdisk0", stat(7, 8, 9.0, 1.5, 2.5)),
            ("hdisk1", stat(70, 80, 90.0, 15.0, 25.0)),
        ];
        let collector = DiskstatsCollector::new(FakeSource::with(disks));

        let sort = |mut v: Vec<Sample>| {
            v.sort_by(|a, b| {
                (&a.label_values, &a.desc.fq_name).cmp(&(&b.label_values, &b.desc.fq_name))
            });
            v
        };

        assert_eq!(sort(collect(&collector)), sort(collect(&collector)));
    }

    #[test]
    fn test_large_block_counts_saturate() {
        let disk = stat(u64::MAX, 0, 0.0, 0.0, 0.0);
        assert_eq!(disk.read_bytes(), u64::MAX);
        assert_eq!(disk.written_bytes(), 0);
    }

    #[test]
    fn test_channel_sink_receives_all_samples() {
        let collector =
            DiskstatsCollector::new(FakeSource::with(vec![("hdisk0", stat(1, 1, 1.0, 1.0, 1.0))]));
        let (mut tx, rx) = mpsc::channel();

        collector.update(&mut tx).expect("update failed");
        drop(tx);

        assert_eq!(rx.iter().count(), 5);
    }

    #[test]
    fn test_device_exclude_filter() {
        let filter = DeviceFilter::new(None, Some("^cd[0-9]+$")).expect("valid filter");
        let collector = DiskstatsCollector::new(FakeSource::with(vec![
            ("hdisk0", stat(1, 1, 1.0, 1.0, 1.0)),
            ("cd0", stat(1, 1, 1.0, 1.0, 1.0)),
        ]))
        .with_device_filter(filter);

        let samples = collect(&collector);
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.label("device") == Some("hdisk0")));
    }

    #[test]
    fn test_device_include_filter() {
        let filter = DeviceFilter::new(Some("^hdisk1$"), None).expect("valid filter");
        assert!(filter.ignored("hdisk0"));
        assert!(!filter.ignored("hdisk1"));
    }

    #[test]
    fn test_device_filter_rejects_both_patterns() {
        let result = DeviceFilter::new(Some("a"), Some("b"));
        assert!(matches!(result, Err(CollectorError::Config(_))));
    }

    #[test]
    fn test_device_filter_rejects_invalid_regex() {
        let result = DeviceFilter::new(None, Some("("));
        assert!(matches!(result, Err(CollectorError::Config(_))));
    }

    #[test]
    fn test_testdata_settings_require_file() {
        let settings = DiskstatsSettings {
            source: SourceKind::Testdata,
            ..DiskstatsSettings::default()
        };
        assert!(matches!(
            DiskstatsCollector::from_settings(&settings),
            Err(CollectorError::Config(_))
        ));
    }

    #[test]
    fn test_build_source_follows_source_kind() {
        let procfs = DiskstatsSettings::default().build_source().unwrap();
        assert_eq!(procfs.name(), "procfs");

        let settings = DiskstatsSettings {
            source: SourceKind::Testdata,
            test_data_file: Some(PathBuf::from("/tmp/disks.json")),
            ..DiskstatsSettings::default()
        };
        assert_eq!(settings.build_source().unwrap().name(), "testdata");
    }

    #[test]
    fn test_describe_lists_five_counters() {
        let collector = DiskstatsCollector::new(FakeSource::with(vec![]));
        let descs = collector.describe();
        assert_eq!(descs.len(), 5);
        assert!(descs
            .iter()
            .all(|d| d.value_type == ValueType::Counter && d.variable_labels == ["device"]));
    }
}
