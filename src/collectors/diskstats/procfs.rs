//! Linux `/proc/diskstats` statistics source.
//!
//! Reads the kernel's per-device I/O counters and maps them onto the
//! [`DiskStat`] record: sectors become blocks (the kernel sector is 512 bytes)
//! and millisecond tick counters become seconds.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

use super::{DiskSnapshot, DiskStat, DiskStatsSource, SourceError};

pub const DEFAULT_DISKSTATS_PATH: &str = "/proc/diskstats";

/// Minimum number of columns in a `/proc/diskstats` line we understand.
const MIN_COLUMNS: usize = 14;

const MS_PER_SECOND: f64 = 1000.0;

/// Snapshot source backed by `/proc/diskstats`.
#[derive(Debug, Clone)]
pub struct ProcDiskstatsSource {
    path: PathBuf,
}

impl ProcDiskstatsSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ProcDiskstatsSource {
    fn default() -> Self {
        Self::new(DEFAULT_DISKSTATS_PATH)
    }
}

impl DiskStatsSource for ProcDiskstatsSource {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn snapshot(&self) -> Result<DiskSnapshot, SourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        parse_diskstats(&content, &self.path)
    }
}

/// Parses the contents of a `/proc/diskstats` file.
///
/// Format: major minor name read_ios read_merges read_sectors read_ticks
/// write_ios write_merges write_sectors write_ticks ios_in_progress io_ticks
/// time_in_queue [discard and flush columns on newer kernels]
pub fn parse_diskstats(content: &str, path: &Path) -> Result<DiskSnapshot, SourceError> {
    let mut stats = DiskSnapshot::default();

    for (idx, line) in content.lines().enumerate() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < MIN_COLUMNS {
            trace!("Skipping short diskstats line {}: {:?}", idx + 1, line);
            continue;
        }

        let column = |i: usize| -> Result<u64, SourceError> {
            parts[i].parse::<u64>().map_err(|e| SourceError::Parse {
                path: path.to_path_buf(),
                reason: format!(
                    "line {}: column {} ({:?}) is not a counter: {}",
                    idx + 1,
                    i + 1,
                    parts[i],
                    e
                ),
            })
        };

        let disk_stat = DiskStat {
            rblks: column(5)?,
            wblks: column(9)?,
            time: column(12)? as f64 / MS_PER_SECOND,
            rserv: column(6)? as f64 / MS_PER_SECOND,
            wserv: column(10)? as f64 / MS_PER_SECOND,
        };

        stats.insert(parts[2].to_string(), disk_stat);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
   8       0 sda 4810 1299 391278 2734 3219 2447 110192 3822 0 5420 6556 0 0 0 0
   8       1 sda1 4725 1299 387198 2713 3219 2447 110192 3822 0 5396 6535 0 0 0 0
 259       0 nvme0n1 100 0 2048 50 20 0 512 1500 2 1250 1550
";

    #[test]
    fn test_parse_maps_columns_and_units() {
        let stats = parse_diskstats(SAMPLE, Path::new("test")).expect("parse failed");

        let sda = stats.get("sda").expect("sda missing");
        assert_eq!(sda.rblks, 391278);
        assert_eq!(sda.wblks, 110192);
        assert_eq!(sda.time, 5.42);
        assert_eq!(sda.rserv, 2.734);
        assert_eq!(sda.wserv, 3.822);
        assert_eq!(sda.read_bytes(), 391278 * 512);
    }

    #[test]
    fn test_parse_accepts_old_fourteen_column_format() {
        let stats = parse_diskstats(SAMPLE, Path::new("test")).expect("parse failed");

        let nvme = stats.get("nvme0n1").expect("nvme0n1 missing");
        assert_eq!(nvme.rblks, 2048);
        assert_eq!(nvme.wblks, 512);
        assert_eq!(nvme.time, 1.25);
        assert_eq!(nvme.rserv, 0.05);
        assert_eq!(nvme.wserv, 1.5);
        assert_eq!(stats.len(), 3);
    }

    #[test]
    fn test_parse_skips_short_lines() {
        let stats = parse_diskstats("   8 0 sda 1 2 3\n\n", Path::new("test")).expect("parse failed");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage_counter() {
        let content = "8 0 sda 1 2 x 4 5 6 7 8 9 10 11\n";
        let err = parse_diskstats(content, Path::new("test")).unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
        assert!(err.to_string().contains("column 6"), "got: {}", err);
    }

    #[test]
    fn test_snapshot_reads_file() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(SAMPLE.as_bytes()).expect("write");
        file.flush().expect("flush");

        let source = ProcDiskstatsSource::new(file.path());
        let stats = source.snapshot().expect("snapshot failed");
        assert!(stats.contains_key("sda1"));
    }

    #[test]
    fn test_snapshot_missing_file_is_io_error() {
        let source = ProcDiskstatsSource::new("/nonexistent/diskstats");
        assert!(matches!(source.snapshot(), Err(SourceError::Io { .. })));
    }
}
