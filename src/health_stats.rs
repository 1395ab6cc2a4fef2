//! Exporter self-monitoring.
//!
//! Tracks scrape outcomes and HTTP activity so `/health` can report whether
//! the last scrape succeeded together with a plain-text table of internal
//! statistics.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use crate::scrape::ScrapeReport;

const TIMESTAMP_RETENTION: Duration = Duration::from_secs(600);

/// Running statistics for a single value.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            *self = Self {
                count: 1,
                sum: value,
                min: value,
                max: value,
                last: value,
            };
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Thread-safe [`RunningStat`].
#[derive(Debug, Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    pub fn snapshot(&self) -> RunningStat {
        self.inner.lock().map(|s| *s).unwrap_or_default()
    }
}

/// Request timestamps of the last ten minutes.
#[derive(Debug)]
pub struct RequestTimestamps {
    inner: Mutex<VecDeque<Instant>>,
}

impl Default for RequestTimestamps {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(256)),
        }
    }
}

impl RequestTimestamps {
    pub fn record(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            let now = Instant::now();
            guard.push_back(now);
            while guard
                .front()
                .is_some_and(|&t| now.duration_since(t) > TIMESTAMP_RETENTION)
            {
                guard.pop_front();
            }
        }
    }

    pub fn count_last_minute(&self) -> u64 {
        self.inner
            .lock()
            .map(|guard| {
                guard
                    .iter()
                    .filter(|t| t.elapsed() <= Duration::from_secs(60))
                    .count() as u64
            })
            .unwrap_or(0)
    }
}

/// Internal statistics of the running exporter.
#[derive(Debug)]
pub struct HealthStats {
    // Scrapes
    pub total_scrapes: AtomicU64,
    pub failed_scrapes: AtomicU64,
    pub collector_failures: AtomicU64,
    pub scrape_duration_seconds: Stat,
    pub samples_per_scrape: Stat,
    last_scrape_ok: AtomicBool,
    last_error: RwLock<Option<String>>,
    last_scrape_time: RwLock<Option<DateTime<Local>>>,

    // HTTP server
    pub http_request_timestamps: RequestTimestamps,
    pub metrics_endpoint_calls: AtomicU64,
    pub serialization_duration_ms: Stat,
    pub metrics_response_size_kb: Stat,

    pub start_time: Instant,
}

impl Default for HealthStats {
    fn default() -> Self {
        Self {
            total_scrapes: AtomicU64::new(0),
            failed_scrapes: AtomicU64::new(0),
            collector_failures: AtomicU64::new(0),
            scrape_duration_seconds: Stat::default(),
            samples_per_scrape: Stat::default(),
            // No scrape yet counts as healthy so /health is usable right after start.
            last_scrape_ok: AtomicBool::new(true),
            last_error: RwLock::new(None),
            last_scrape_time: RwLock::new(None),
            http_request_timestamps: RequestTimestamps::default(),
            metrics_endpoint_calls: AtomicU64::new(0),
            serialization_duration_ms: Stat::default(),
            metrics_response_size_kb: Stat::default(),
            start_time: Instant::now(),
        }
    }
}

impl HealthStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one full scrape.
    pub fn record_scrape(&self, report: &ScrapeReport, duration_seconds: f64) {
        self.total_scrapes.fetch_add(1, Ordering::Relaxed);
        self.scrape_duration_seconds.add_sample(duration_seconds);
        self.samples_per_scrape
            .add_sample(report.total_samples() as f64);

        let failures: Vec<String> = report
            .failures()
            .map(|o| format!("{}: {}", o.name, o.error.as_deref().unwrap_or("unknown error")))
            .collect();

        if failures.is_empty() {
            self.last_scrape_ok.store(true, Ordering::Relaxed);
            if let Ok(mut guard) = self.last_error.write() {
                *guard = None;
            }
        } else {
            self.failed_scrapes.fetch_add(1, Ordering::Relaxed);
            self.collector_failures
                .fetch_add(failures.len() as u64, Ordering::Relaxed);
            self.last_scrape_ok.store(false, Ordering::Relaxed);
            if let Ok(mut guard) = self.last_error.write() {
                *guard = Some(failures.join("; "));
            }
        }

        if let Ok(mut guard) = self.last_scrape_time.write() {
            *guard = Some(Local::now());
        }
    }

    pub fn record_http_request(&self) {
        self.http_request_timestamps.record();
    }

    pub fn record_metrics_endpoint_call(&self) {
        self.metrics_endpoint_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_serialization_duration_ms(&self, duration_ms: f64) {
        self.serialization_duration_ms.add_sample(duration_ms);
    }

    pub fn record_metrics_response_size_kb(&self, size_kb: f64) {
        self.metrics_response_size_kb.add_sample(size_kb);
    }

    pub fn is_healthy(&self) -> bool {
        self.last_scrape_ok.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|g| g.clone())
    }

    pub fn scrape_success_rate(&self) -> f64 {
        let total = self.total_scrapes.load(Ordering::Relaxed);
        let failed = self.failed_scrapes.load(Ordering::Relaxed);
        if total == 0 {
            100.0
        } else {
            (total.saturating_sub(failed) as f64 / total as f64) * 100.0
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn last_scrape_time_str(&self) -> String {
        self.last_scrape_time
            .read()
            .ok()
            .and_then(|g| *g)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn render_table(&self) -> String {
        let mut out = String::new();

        writeln!(out, "HEALTH ENDPOINT - EXPORTER INTERNAL STATS").ok();
        writeln!(out, "==========================================").ok();
        writeln!(out).ok();
        writeln!(
            out,
            "status: {}",
            if self.is_healthy() { "OK" } else { "DEGRADED" }
        )
        .ok();
        if let Some(err) = self.last_error() {
            writeln!(out, "last error: {}", err).ok();
        }
        writeln!(out).ok();

        row(&mut out, "", ["current", "average", "max", "min"]);

        section(&mut out, "SCRAPES");
        stat_row(&mut out, "scrape_duration (s)", &self.scrape_duration_seconds, 3);
        stat_row(&mut out, "samples_per_scrape", &self.samples_per_scrape, 0);
        counter_row(
            &mut out,
            "scrape_success_rate (%)",
            format!("{:.1}", self.scrape_success_rate()),
        );
        counter_row(
            &mut out,
            "collector_failures",
            self.collector_failures.load(Ordering::Relaxed).to_string(),
        );

        section(&mut out, "HTTP SERVER");
        counter_row(
            &mut out,
            "http_requests_last_minute",
            self.http_request_timestamps.count_last_minute().to_string(),
        );
        counter_row(
            &mut out,
            "metrics_endpoint_calls",
            self.metrics_endpoint_calls.load(Ordering::Relaxed).to_string(),
        );
        stat_row(
            &mut out,
            "serialization_duration (ms)",
            &self.serialization_duration_ms,
            1,
        );
        stat_row(
            &mut out,
            "metrics_response_size (KB)",
            &self.metrics_response_size_kb,
            1,
        );

        writeln!(out).ok();
        writeln!(
            out,
            "number of done scrapes: {} | last scrape: {} | uptime: {:.1}h",
            self.total_scrapes.load(Ordering::Relaxed),
            self.last_scrape_time_str(),
            self.start_time.elapsed().as_secs_f64() / 3600.0
        )
        .ok();

        out
    }
}

const LEFT_COL: usize = 28;
const COL_W: usize = 12;

fn section(out: &mut String, title: &str) {
    writeln!(out).ok();
    writeln!(out, "{}", title).ok();
    writeln!(out, "{}", "-".repeat(title.len())).ok();
}

fn row(out: &mut String, label: &str, cells: [&str; 4]) {
    writeln!(
        out,
        "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
        label,
        cells[0],
        cells[1],
        cells[2],
        cells[3],
        left = LEFT_COL,
        col = COL_W
    )
    .ok();
}

fn stat_row(out: &mut String, label: &str, stat: &Stat, precision: usize) {
    let s = stat.snapshot();
    let cur = format!("{:.*}", precision, s.last);
    let avg = format!("{:.*}", precision.max(1), s.avg());
    let max = format!("{:.*}", precision, s.max);
    let min = format!("{:.*}", precision, s.min);
    row(out, label, [&cur, &avg, &max, &min]);
}

fn counter_row(out: &mut String, label: &str, value: String) {
    row(out, label, [&value, "N/A", "N/A", "N/A"]);
}
