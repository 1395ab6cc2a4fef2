//! Collector registry.
//!
//! Collectors advertise themselves here under a unique name together with a
//! default-enabled flag and a factory. Configuration then toggles individual
//! collectors, and [`CollectorRegistry::build`] instantiates the enabled ones.

use tracing::{debug, info};

use crate::collector::{Collector, CollectorError};
use crate::collectors::CollectorContext;

/// Constructor for a registered collector.
pub type CollectorFactory = fn(&CollectorContext) -> Result<Box<dyn Collector>, CollectorError>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("collector '{0}' is already registered")]
    Duplicate(String),

    #[error("unknown collector '{0}'")]
    Unknown(String),

    #[error("failed to build collector '{name}': {source}")]
    Build {
        name: String,
        #[source]
        source: CollectorError,
    },
}

struct Entry {
    name: String,
    default_enabled: bool,
    enabled: bool,
    factory: CollectorFactory,
}

/// Public view of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorInfo {
    pub name: String,
    pub default_enabled: bool,
    pub enabled: bool,
}

/// A collector instance together with its registered name.
pub struct NamedCollector {
    pub name: String,
    pub collector: Box<dyn Collector>,
}

/// Registry of available collectors, kept in registration order.
#[derive(Default)]
pub struct CollectorRegistry {
    entries: Vec<Entry>,
}

impl CollectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        default_enabled: bool,
        factory: CollectorFactory,
    ) -> Result<(), RegistryError> {
        if self.entries.iter().any(|e| e.name == name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        debug!(
            "Registered collector '{}' (default {})",
            name,
            if default_enabled { "enabled" } else { "disabled" }
        );
        self.entries.push(Entry {
            name: name.to_string(),
            default_enabled,
            enabled: default_enabled,
            factory,
        });
        Ok(())
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Turns every collector off; explicit enables applied afterwards win.
    pub fn disable_defaults(&mut self) {
        for entry in &mut self.entries {
            entry.enabled = false;
        }
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.enabled)
    }

    pub fn entries(&self) -> Vec<CollectorInfo> {
        self.entries
            .iter()
            .map(|e| CollectorInfo {
                name: e.name.clone(),
                default_enabled: e.default_enabled,
                enabled: e.enabled,
            })
            .collect()
    }

    /// Instantiates every enabled collector.
    pub fn build(&self, ctx: &CollectorContext) -> Result<Vec<NamedCollector>, RegistryError> {
        let mut collectors = Vec::new();

        for entry in self.entries.iter().filter(|e| e.enabled) {
            let collector = (entry.factory)(ctx).map_err(|source| RegistryError::Build {
                name: entry.name.clone(),
                source,
            })?;
            info!("Enabled collector: {}", entry.name);
            collectors.push(NamedCollector {
                name: entry.name.clone(),
                collector,
            });
        }

        Ok(collectors)
    }
}
