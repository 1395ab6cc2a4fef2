//! Built-in collectors.
//!
//! Every collector shipped with the exporter is registered here by
//! [`register_builtin_collectors`], which the process driver calls once at
//! startup before enabling or disabling collectors from configuration.

pub mod diskstats;

use crate::collector::{Collector, CollectorError};
use crate::registry::{CollectorRegistry, RegistryError};
use diskstats::{DiskstatsCollector, DiskstatsSettings};

/// Settings handed to collector factories.
#[derive(Debug, Clone, Default)]
pub struct CollectorContext {
    pub diskstats: DiskstatsSettings,
}

/// Registers all built-in collectors with their default-enabled flags.
pub fn register_builtin_collectors(registry: &mut CollectorRegistry) -> Result<(), RegistryError> {
    registry.register(diskstats::COLLECTOR_NAME, true, new_diskstats_collector)?;
    Ok(())
}

fn new_diskstats_collector(ctx: &CollectorContext) -> Result<Box<dyn Collector>, CollectorError> {
    Ok(Box::new(DiskstatsCollector::from_settings(&ctx.diskstats)?))
}
