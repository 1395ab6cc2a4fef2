//! End-to-end tests of the diskstats collector through the public library API:
//! registry, collector context, test data source and the scraper.

use herakles_disk_exporter::collectors::diskstats::{DiskstatsSettings, SourceKind};
use herakles_disk_exporter::{
    register_builtin_collectors, CollectorContext, CollectorRegistry, RegistryError, Scraper,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const HDISK0: &str = r#"{
    "version": "1.0",
    "generated_at": "2024-01-01T00:00:00Z",
    "disks": {
        "hdisk0": {"rblks": 100, "wblks": 50, "time": 10.0, "rserv": 4.0, "wserv": 6.0}
    }
}"#;

fn testdata_context(path: &Path) -> CollectorContext {
    CollectorContext {
        diskstats: DiskstatsSettings {
            source: SourceKind::Testdata,
            test_data_file: Some(path.to_path_buf()),
            ..DiskstatsSettings::default()
        },
    }
}

fn scraper_for(ctx: &CollectorContext) -> (Scraper, Registry) {
    let mut collectors = CollectorRegistry::new();
    register_builtin_collectors(&mut collectors).expect("register");
    let registry = Registry::new();
    let scraper = Scraper::new(collectors.build(ctx).expect("build"), &registry).expect("scraper");
    (scraper, registry)
}

fn exposition(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buffer)
        .expect("encode");
    String::from_utf8(buffer).expect("utf8")
}

#[test]
fn test_builtin_registration_is_explicit_and_unique() {
    let mut registry = CollectorRegistry::new();
    assert!(registry.entries().is_empty());

    register_builtin_collectors(&mut registry).unwrap();
    let entries = registry.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "diskstats");
    assert!(entries[0].default_enabled);

    assert!(matches!(
        register_builtin_collectors(&mut registry),
        Err(RegistryError::Duplicate(_))
    ));
}

#[test]
fn test_hdisk0_exposition() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("testdata.json");
    fs::write(&path, HDISK0).unwrap();

    let (scraper, registry) = scraper_for(&testdata_context(&path));
    let report = scraper.scrape();

    assert!(report.all_succeeded());
    assert_eq!(report.total_samples(), 5);

    let text = exposition(&registry);
    for line in [
        r#"node_disk_read_bytes_total{device="hdisk0"} 51200"#,
        r#"node_disk_written_bytes_total{device="hdisk0"} 25600"#,
        r#"node_disk_io_time_seconds_total{device="hdisk0"} 10"#,
        r#"node_disk_read_time_seconds_total{device="hdisk0"} 4"#,
        r#"node_disk_write_time_seconds_total{device="hdisk0"} 6"#,
        r#"node_scrape_collector_success{collector="diskstats"} 1"#,
    ] {
        assert!(text.contains(line), "missing '{}' in:\n{}", line, text);
    }
    assert!(text.contains("# TYPE node_disk_read_bytes_total counter"));
}

#[test]
fn test_empty_snapshot_succeeds_without_disk_series() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    fs::write(&path, r#"{"version":"1.0","generated_at":"now","disks":{}}"#).unwrap();

    let (scraper, registry) = scraper_for(&testdata_context(&path));
    let report = scraper.scrape();

    assert!(report.all_succeeded());
    assert_eq!(report.total_samples(), 0);
    let text = exposition(&registry);
    assert!(!text.contains("device=\""));
    assert!(text.contains(r#"node_scrape_collector_success{collector="diskstats"} 1"#));
}

#[test]
fn test_source_failure_drops_series_until_recovery() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("testdata.json");
    fs::write(&path, HDISK0).unwrap();

    let (scraper, registry) = scraper_for(&testdata_context(&path));
    assert!(scraper.scrape().all_succeeded());

    fs::remove_file(&path).unwrap();
    let report = scraper.scrape();
    assert!(!report.all_succeeded());
    assert_eq!(report.total_samples(), 0);
    let text = exposition(&registry);
    assert!(!text.contains("device=\""));
    assert!(text.contains(r#"node_scrape_collector_success{collector="diskstats"} 0"#));

    fs::write(&path, HDISK0).unwrap();
    assert!(scraper.scrape().all_succeeded());
    assert!(exposition(&registry).contains(r#"node_disk_read_bytes_total{device="hdisk0"} 51200"#));
}

#[test]
fn test_disabled_collector_exposes_nothing() {
    let mut collectors = CollectorRegistry::new();
    register_builtin_collectors(&mut collectors).unwrap();
    collectors.set_enabled("diskstats", false).unwrap();

    let built = collectors.build(&CollectorContext::default()).unwrap();
    assert!(built.is_empty());

    let registry = Registry::new();
    let scraper = Scraper::new(built, &registry).unwrap();
    assert!(scraper.scrape().outcomes.is_empty());
    assert!(!exposition(&registry).contains("device=\""));
}

#[test]
fn test_testdata_source_without_file_fails_to_build() {
    let ctx = CollectorContext {
        diskstats: DiskstatsSettings {
            source: SourceKind::Testdata,
            ..DiskstatsSettings::default()
        },
    };
    let mut collectors = CollectorRegistry::new();
    register_builtin_collectors(&mut collectors).unwrap();

    assert!(matches!(
        collectors.build(&ctx),
        Err(RegistryError::Build { name, .. }) if name == "diskstats"
    ));
}

#[test]
fn test_concurrent_scrapes_expose_every_disk() {
    let disks: Vec<String> = (0..50)
        .map(|i| {
            format!(
                r#""hdisk{}": {{"rblks": {}, "wblks": 8, "time": 1.5, "rserv": 1.0, "wserv": 0.5}}"#,
                i,
                i + 1
            )
        })
        .collect();
    let data = format!(
        r#"{{"version": "1.0", "generated_at": "2024-01-01T00:00:00Z", "disks": {{{}}}}}"#,
        disks.join(",")
    );
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("testdata.json");
    fs::write(&path, data).unwrap();

    let (scraper, registry) = scraper_for(&testdata_context(&path));
    let scraper = Arc::new(scraper);
    assert_eq!(scraper.scrape().total_samples(), 250);

    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let scraper = Arc::clone(&scraper);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::SeqCst) {
                assert!(scraper.scrape().all_succeeded());
            }
        })
    };

    let mut partial = 0;
    for _ in 0..500 {
        let series = exposition(&registry)
            .lines()
            .filter(|line| line.starts_with("node_disk_"))
            .count();
        if series != 250 {
            partial += 1;
        }
    }
    stop.store(true, Ordering::SeqCst);
    worker.join().expect("scrape thread");

    assert_eq!(partial, 0);
}
