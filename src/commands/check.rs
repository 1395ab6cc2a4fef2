//! Check command implementation.
//!
//! Validates system requirements and configuration.

use crate::config::{validate_effective_config, Config};
use crate::startup_checks::check_source;

/// Validates system requirements and configuration.
pub fn command_check(source: bool, all: bool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Disk Exporter - System Check");
    println!("========================================");

    let mut all_ok = true;

    if source || all {
        println!("\n💽 Checking statistics source...");
        let settings = config.collector_context().diskstats;
        println!("   source: {:?}", settings.source);
        match check_source(config) {
            Ok(0) => println!("   ⚠️  Source readable but reports no disks"),
            Ok(disks) => println!("   ✅ Source readable: {} disks", disks),
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
