//! Synthetic test data source.
//!
//! Serves disk snapshots from a JSON file instead of the live system. The file
//! is re-read on every snapshot so it can be edited while the exporter runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{DiskSnapshot, DiskStat, DiskStatsSource, SourceError};

/// Current test data file format version.
pub const TEST_DATA_VERSION: &str = "1.0";

/// Root structure for test data JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestData {
    pub version: String,
    pub generated_at: String,
    pub disks: BTreeMap<String, DiskStat>,
}

impl TestData {
    pub fn into_snapshot(self) -> DiskSnapshot {
        self.disks.into_iter().collect()
    }
}

/// Load test data from JSON file.
pub fn load_test_data_from_file(path: &Path) -> Result<TestData, SourceError> {
    debug!("Loading test data from: {}", path.display());

    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|e| SourceError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Snapshot source backed by a test data JSON file.
#[derive(Debug, Clone)]
pub struct TestDataSource {
    path: PathBuf,
}

impl TestDataSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DiskStatsSource for TestDataSource {
    fn name(&self) -> &'static str {
        "testdata"
    }

    fn snapshot(&self) -> Result<DiskSnapshot, SourceError> {
        let test_data = load_test_data_from_file(&self.path)?;
        debug!(
            "Test data version {} generated at {}: {} disks",
            test_data.version,
            test_data.generated_at,
            test_data.disks.len()
        );
        Ok(test_data.into_snapshot())
    }
}
