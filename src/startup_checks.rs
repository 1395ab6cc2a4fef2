//! Startup requirement validation for herakles-disk-exporter.
//!
//! Verifies that the configured statistics source can be read before the
//! server starts, so a broken deployment shows up in the log right away
//! rather than on the first scrape.

use herakles_disk_exporter::collectors::diskstats::{SourceError, COLLECTOR_NAME};
use std::io::ErrorKind;
use tracing::{error, info, warn};

use crate::config::{build_registry, Config};

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Statistics source '{source_name}' unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("Invalid source settings: {0}")]
    InvalidSettings(String),
}

/// Takes one snapshot from the configured source and returns the number of
/// disks it reported.
pub fn check_source(config: &Config) -> Result<usize, ValidationError> {
    let settings = config.collector_context().diskstats;

    let source = settings
        .build_source()
        .map_err(|e| ValidationError::InvalidSettings(e.to_string()))?;

    match source.snapshot() {
        Ok(snapshot) => {
            info!(
                "✅ Statistics source '{}' readable: {} disks",
                source.name(),
                snapshot.len()
            );
            if snapshot.is_empty() {
                warn!("⚠️  Source '{}' reports no disks", source.name());
            }
            Ok(snapshot.len())
        }
        Err(SourceError::Io { path, source: e }) if e.kind() == ErrorKind::PermissionDenied => {
            error!("❌ Cannot read {} - insufficient permissions", path.display());
            Err(ValidationError::InsufficientPermissions(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
        Err(e) => {
            error!("❌ Statistics source '{}' failed: {}", source.name(), e);
            Err(ValidationError::SourceUnavailable {
                source_name: source.name().to_string(),
                reason: e.to_string(),
            })
        }
    }
}

/// Validate all runtime requirements
pub fn validate_requirements(config: &Config) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    let diskstats_enabled = build_registry(config)
        .ok()
        .and_then(|r| r.is_enabled(COLLECTOR_NAME))
        .unwrap_or(false);

    if diskstats_enabled {
        check_source(config)?;
    } else {
        info!("diskstats collector disabled, skipping source check");
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}
