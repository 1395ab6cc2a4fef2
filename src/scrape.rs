//! Scrape coordination.
//!
//! The [`Scraper`] runs every enabled collector once per scrape. Each pass
//! fills a fresh set of Prometheus metric vectors and, once every collector
//! has run, publishes them as a whole. The registry only ever gathers the
//! families of the last completed pass, so a concurrent `/metrics` request
//! never sees a half-written cycle.

use ahash::AHashMap as HashMap;
use prometheus::core::{Collector as PromCollector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{CounterVec, GaugeVec, Opts, Registry};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, warn};

use crate::collector::{Sample, TypedDesc, ValueType};
use crate::registry::NamedCollector;

const SCRAPE_NAMESPACE: &str = "node";
const SCRAPE_SUBSYSTEM: &str = "scrape";

/// Prometheus vector backing one metric identity.
#[derive(Clone)]
enum MetricVec {
    Counter(CounterVec),
    Gauge(GaugeVec),
}

impl MetricVec {
    fn new(desc: &TypedDesc) -> Result<Self, prometheus::Error> {
        let opts = Opts::new(desc.fq_name.as_str(), desc.help.as_str());
        let labels: Vec<&str> = desc.variable_labels.iter().map(String::as_str).collect();

        Ok(match desc.value_type {
            ValueType::Counter => MetricVec::Counter(CounterVec::new(opts, &labels)?),
            ValueType::Gauge => MetricVec::Gauge(GaugeVec::new(opts, &labels)?),
        })
    }

    fn desc(&self) -> Vec<&Desc> {
        match self {
            MetricVec::Counter(v) => v.desc(),
            MetricVec::Gauge(v) => v.desc(),
        }
    }

    fn collect(&self) -> Vec<MetricFamily> {
        match self {
            MetricVec::Counter(v) => v.collect(),
            MetricVec::Gauge(v) => v.collect(),
        }
    }

    fn apply(&self, sample: &Sample) -> Result<(), prometheus::Error> {
        let values: Vec<&str> = sample.label_values.iter().map(String::as_str).collect();

        match self {
            MetricVec::Counter(v) => {
                if !sample.value.is_finite() || sample.value < 0.0 {
                    warn!(
                        "Dropping invalid counter value {} for {}",
                        sample.value, sample.desc.fq_name
                    );
                    return Ok(());
                }
                // Counters carry absolute cumulative values; the last sample
                // for a label set wins.
                let counter = v.get_metric_with_label_values(&values)?;
                counter.reset();
                counter.inc_by(sample.value);
            }
            MetricVec::Gauge(v) => {
                v.get_metric_with_label_values(&values)?.set(sample.value);
            }
        }
        Ok(())
    }
}

fn scrape_gauge(name: &str, help: &str) -> Result<GaugeVec, prometheus::Error> {
    GaugeVec::new(
        Opts::new(name, help)
            .namespace(SCRAPE_NAMESPACE)
            .subsystem(SCRAPE_SUBSYSTEM),
        &["collector"],
    )
}

fn collector_duration_gauge() -> Result<GaugeVec, prometheus::Error> {
    scrape_gauge("collector_duration_seconds", "Duration of a collector scrape.")
}

fn collector_success_gauge() -> Result<GaugeVec, prometheus::Error> {
    scrape_gauge("collector_success", "Whether a collector succeeded.")
}

/// Registry-facing view of the last completed scrape.
///
/// `desc` reports every identity the scraper can expose; `collect` returns
/// the families published by the most recent pass, or nothing before the
/// first one.
#[derive(Clone)]
struct Published {
    templates: Vec<MetricVec>,
    families: Arc<Mutex<Vec<MetricFamily>>>,
}

impl Published {
    fn replace(&self, families: Vec<MetricFamily>) {
        *self.families.lock().unwrap_or_else(|e| e.into_inner()) = families;
    }
}

impl PromCollector for Published {
    fn desc(&self) -> Vec<&Desc> {
        self.templates.iter().flat_map(MetricVec::desc).collect()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.families
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Metric vectors filled during one scrape pass.
struct Cycle {
    vecs: HashMap<String, MetricVec>,
    collector_duration: GaugeVec,
    collector_success: GaugeVec,
}

impl Cycle {
    fn into_families(self) -> Vec<MetricFamily> {
        let mut families = self.collector_duration.collect();
        families.extend(self.collector_success.collect());
        for vec in self.vecs.values() {
            families.extend(vec.collect());
        }
        families
    }
}

struct ScrapeTarget {
    name: String,
    collector: Box<dyn crate::collector::Collector>,
}

/// Result of running one collector in one scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorOutcome {
    pub name: String,
    pub success: bool,
    pub duration_seconds: f64,
    pub samples: usize,
    pub error: Option<String>,
}

/// Per-collector outcomes of one scrape, in collector order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeReport {
    pub outcomes: Vec<CollectorOutcome>,
}

impl ScrapeReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    pub fn total_samples(&self) -> usize {
        self.outcomes.iter().map(|o| o.samples).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CollectorOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

/// Runs collectors and publishes their samples into a Prometheus registry.
pub struct Scraper {
    targets: Vec<ScrapeTarget>,
    descs: Vec<Arc<TypedDesc>>,
    published: Published,
    lock: Mutex<()>,
}

impl Scraper {
    /// Collects the metric identities of every collector and registers them,
    /// along with the per-collector scrape gauges, in `registry`.
    pub fn new(collectors: Vec<NamedCollector>, registry: &Registry) -> Result<Self, prometheus::Error> {
        let mut templates = vec![
            MetricVec::Gauge(collector_duration_gauge()?),
            MetricVec::Gauge(collector_success_gauge()?),
        ];
        let mut descs: Vec<Arc<TypedDesc>> = Vec::new();
        let mut targets = Vec::with_capacity(collectors.len());

        for NamedCollector { name, collector } in collectors {
            let described = collector.describe();
            for desc in &described {
                if !descs.iter().any(|d| d.fq_name == desc.fq_name) {
                    templates.push(MetricVec::new(desc)?);
                    descs.push(Arc::clone(desc));
                }
            }
            debug!("Collector '{}' describes {} metrics", name, described.len());

            targets.push(ScrapeTarget { name, collector });
        }

        let published = Published {
            templates,
            families: Arc::new(Mutex::new(Vec::new())),
        };
        registry.register(Box::new(published.clone()))?;

        Ok(Self {
            targets,
            descs,
            published,
            lock: Mutex::new(()),
        })
    }

    pub fn collector_names(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name.as_str()).collect()
    }

    fn new_cycle(&self) -> Result<Cycle, prometheus::Error> {
        let mut vecs = HashMap::with_capacity(self.descs.len());
        for desc in &self.descs {
            vecs.insert(desc.fq_name.clone(), MetricVec::new(desc)?);
        }
        Ok(Cycle {
            vecs,
            collector_duration: collector_duration_gauge()?,
            collector_success: collector_success_gauge()?,
        })
    }

    /// Runs all collectors once and publishes the resulting metrics.
    ///
    /// A collector that fails exposes none of its series for this scrape and
    /// is reported with `success = false`.
    pub fn scrape(&self) -> ScrapeReport {
        // A poisoned lock only means a previous scrape panicked; every pass
        // starts from fresh vectors anyway.
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut report = ScrapeReport::default();

        // Same options as the templates validated in `new`.
        let cycle = match self.new_cycle() {
            Ok(cycle) => cycle,
            Err(e) => {
                error!("Failed to create metric vectors for scrape: {}", e);
                return report;
            }
        };

        for target in &self.targets {
            let start = Instant::now();
            let mut samples: Vec<Sample> = Vec::new();
            let result = target.collector.update(&mut samples);

            let outcome = match result {
                Ok(()) => {
                    let mut published = 0usize;
                    for sample in &samples {
                        match cycle.vecs.get(&sample.desc.fq_name) {
                            Some(vec) => match vec.apply(sample) {
                                Ok(()) => published += 1,
                                Err(e) => warn!(
                                    "Collector '{}' emitted unusable sample for {}: {}",
                                    target.name, sample.desc.fq_name, e
                                ),
                            },
                            None => warn!(
                                "Collector '{}' emitted undescribed metric {}",
                                target.name, sample.desc.fq_name
                            ),
                        }
                    }
                    CollectorOutcome {
                        name: target.name.clone(),
                        success: true,
                        duration_seconds: start.elapsed().as_secs_f64(),
                        samples: published,
                        error: None,
                    }
                }
                Err(e) => {
                    error!("Collector '{}' failed: {}", target.name, e);
                    CollectorOutcome {
                        name: target.name.clone(),
                        success: false,
                        duration_seconds: start.elapsed().as_secs_f64(),
                        samples: 0,
                        error: Some(e.to_string()),
                    }
                }
            };

            cycle
                .collector_duration
                .with_label_values(&[target.name.as_str()])
                .set(outcome.duration_seconds);
            cycle
                .collector_success
                .with_label_values(&[target.name.as_str()])
                .set(if outcome.success { 1.0 } else { 0.0 });

            debug!(
                "Collector '{}' finished in {:.3}ms: {} samples",
                outcome.name,
                outcome.duration_seconds * 1000.0,
                outcome.samples
            );
            report.outcomes.push(outcome);
        }

        self.published.replace(cycle.into_families());
        report
    }
}
