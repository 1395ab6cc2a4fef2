//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-disk-exporter.yaml"));
    let is_yaml = matches!(format, ConfigFormat::Yaml);

    let mut content = render_config(&Config::default(), format)?;
    if commented && is_yaml {
        content = format!("{}\n{}", CONFIG_COMMENTS, content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

const CONFIG_COMMENTS: &str = r#"# Herakles Disk Exporter Configuration
# ====================================
#
# Server
# ------
# bind: "0.0.0.0"                  # Bind IP (0.0.0.0 = all interfaces)
# port: 9216                       # HTTP port
#
# Feature Flags
# -------------
# enable_health: true              # Enable /health endpoint
# enable_telemetry: true           # Enable herakles_exporter_* metrics
# enable_default_collectors: true  # Start from each collector's default
# enable_collectors: ["diskstats"] # Explicitly enable collectors
# disable_collectors: []           # Explicitly disable collectors
#
# Logging
# -------
# log_level: "info"                # off, error, warn, info, debug, trace
#
# Statistics Source
# -----------------
# test_data_file: null             # JSON test data (implies source: testdata)
# diskstats:
#   source: procfs                 # procfs | testdata
#   procfs_path: /proc/diskstats
#   device_include: null           # Regex; mutually exclusive with device_exclude
#   device_exclude: null           # Regex, e.g. "^(z?ram|loop|fd|(h|s|v|xv)d[a-z])\\d+$"
#
# TLS/SSL
# -------
# enable_tls: false
# tls_cert_path: null              # PEM certificate
# tls_key_path: null               # PEM private key
"#;
