//! Collectors command implementation.

use crate::config::{build_registry, Config};

/// Lists registered collectors with their default and effective state.
pub fn command_collectors(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let registry = build_registry(config)?;

    println!("📦 Registered collectors");
    println!("========================\n");
    println!("{:20} | {:^9} | {:^9}", "name", "default", "enabled");
    println!("{}", "-".repeat(44));

    for info in registry.entries() {
        println!(
            "{:20} | {:^9} | {:^9}",
            info.name,
            if info.default_enabled { "yes" } else { "no" },
            if info.enabled { "✅" } else { "❌" }
        );
    }

    Ok(())
}
