//! Collector abstractions shared by every metrics collector.
//!
//! A collector reads one slice of system state per scrape and hands the
//! resulting samples, one at a time, to a [`MetricSink`]. Metric identities
//! are described by [`TypedDesc`], which pairs a Prometheus metric name with
//! its value semantics.

use prometheus::Opts;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Value semantics of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Monotonically non-decreasing, reset only on restart.
    Counter,
    Gauge,
}

/// Description of one metric identity: name, help text, value semantics and
/// the names of its variable labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypedDesc {
    pub fq_name: String,
    pub help: String,
    pub value_type: ValueType,
    pub variable_labels: Vec<String>,
}

impl TypedDesc {
    /// Builds a description with a fully-qualified `namespace_subsystem_name`.
    pub fn new(
        namespace: &str,
        subsystem: &str,
        name: &str,
        help: &str,
        value_type: ValueType,
        variable_labels: &[&str],
    ) -> Arc<Self> {
        let fq_name = Opts::new(name, help)
            .namespace(namespace)
            .subsystem(subsystem)
            .fq_name();

        Arc::new(Self {
            fq_name,
            help: help.to_string(),
            value_type,
            variable_labels: variable_labels.iter().map(|l| l.to_string()).collect(),
        })
    }

    /// Creates a sample for this metric identity.
    ///
    /// `label_values` must line up with `variable_labels`.
    pub fn new_sample(self: &Arc<Self>, value: f64, label_values: &[&str]) -> Sample {
        debug_assert_eq!(label_values.len(), self.variable_labels.len());
        Sample {
            desc: Arc::clone(self),
            value,
            label_values: label_values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// One measured quantity at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub desc: Arc<TypedDesc>,
    pub value: f64,
    pub label_values: Vec<String>,
}

impl Sample {
    /// Returns the value of the label called `name`, if the metric has one.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.desc
            .variable_labels
            .iter()
            .position(|l| l == name)
            .and_then(|idx| self.label_values.get(idx))
            .map(String::as_str)
    }
}

/// Destination for samples produced by a collector.
pub trait MetricSink {
    fn emit(&mut self, sample: Sample);
}

impl MetricSink for Vec<Sample> {
    fn emit(&mut self, sample: Sample) {
        self.push(sample);
    }
}

impl MetricSink for Sender<Sample> {
    fn emit(&mut self, sample: Sample) {
        // A dropped receiver means nobody is consuming this scrape anymore.
        let _ = self.send(sample);
    }
}

/// Errors raised by a statistics source while reading its input.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
}

/// Errors a collector can report for one collection cycle.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("statistics source failed: {0}")]
    Source(#[from] SourceError),

    #[error("invalid collector configuration: {0}")]
    Config(String),
}

/// A metrics collector plugged into the registry.
///
/// `update` is invoked once per scrape and must emit every sample
/// synchronously before returning. Implementations must not emit anything
/// when they return an error for the cycle.
pub trait Collector: Send + Sync {
    /// All metric identities this collector may emit.
    fn describe(&self) -> Vec<Arc<TypedDesc>>;

    /// Reads current state and emits samples into `sink`.
    fn update(&self, sink: &mut dyn MetricSink) -> Result<(), CollectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn desc() -> Arc<TypedDesc> {
        TypedDesc::new(
            "node",
            "disk",
            "read_bytes_total",
            "The total number of bytes read successfully.",
            ValueType::Counter,
            &["device"],
        )
    }

    #[test]
    fn test_fq_name_joins_namespace_and_subsystem() {
        assert_eq!(desc().fq_name, "node_disk_read_bytes_total");
    }

    #[test]
    fn test_sample_label_lookup() {
        let sample = desc().new_sample(1.0, &["hdisk0"]);
        assert_eq!(sample.label("device"), Some("hdisk0"));
        assert_eq!(sample.label("mountpoint"), None);
    }

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (mut tx, rx) = mpsc::channel();
        let d = desc();
        tx.emit(d.new_sample(1.0, &["a"]));
        tx.emit(d.new_sample(2.0, &["b"]));
        drop(tx);

        let received: Vec<f64> = rx.iter().map(|s| s.value).collect();
        assert_eq!(received, vec![1.0, 2.0]);
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (mut tx, rx) = mpsc::channel::<Sample>();
        drop(rx);
        tx.emit(desc().new_sample(1.0, &["a"]));
    }

    #[test]
    fn test_source_error_converts_into_collector_error() {
        let err: CollectorError = SourceError::Parse {
            path: PathBuf::from("/proc/diskstats"),
            reason: "bad column".to_string(),
        }
        .into();

        assert!(matches!(err, CollectorError::Source(SourceError::Parse { .. })));
        assert_eq!(
            err.to_string(),
            "statistics source failed: failed to parse /proc/diskstats: bad column"
        );
    }
}
