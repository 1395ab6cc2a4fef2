//! Generate testdata command implementation.
//!
//! Writes a synthetic disk snapshot that the `testdata` source can serve.

use chrono::Utc;
use herakles_disk_exporter::collectors::diskstats::testdata::{TestData, TEST_DATA_VERSION};
use herakles_disk_exporter::DiskStat;
use rand::Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

// Ranges for generated counters
const MAX_BLOCKS: u64 = 200_000_000; // ~100 GB in 512-byte blocks
const MAX_IO_SECONDS: f64 = 100_000.0;

/// Generates synthetic test data JSON file for testing purposes.
pub fn command_generate_testdata(output: PathBuf, disks: usize) -> Result<(), Box<dyn std::error::Error>> {
    debug!(
        "Generating test data: disks={}, output={}",
        disks,
        output.display()
    );

    let test_data = generate_test_data(&mut rand::thread_rng(), disks);

    let json_content = serde_json::to_string_pretty(&test_data)?;
    fs::write(&output, &json_content)?;

    println!(
        "✅ Generated test data: {} disks in {}",
        test_data.disks.len(),
        output.display()
    );

    Ok(())
}

/// Builds a snapshot of `disks` disks named `hdisk0..`.
pub fn generate_test_data(rng: &mut impl Rng, disks: usize) -> TestData {
    let disks: BTreeMap<String, DiskStat> = (0..disks)
        .map(|i| (format!("hdisk{}", i), generate_random_disk(rng)))
        .collect();

    TestData {
        version: TEST_DATA_VERSION.to_string(),
        generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        disks,
    }
}

/// Random counters where read and write time never exceed total I/O time.
fn generate_random_disk(rng: &mut impl Rng) -> DiskStat {
    let time: f64 = rng.gen_range(0.0..MAX_IO_SECONDS);
    let read_share: f64 = rng.gen_range(0.0..1.0);
    let rserv = time * read_share;

    DiskStat {
        rblks: rng.gen_range(0..MAX_BLOCKS),
        wblks: rng.gen_range(0..MAX_BLOCKS),
        time,
        rserv,
        wserv: time - rserv,
    }
}
