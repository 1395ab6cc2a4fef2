//! Configuration management for herakles-disk-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use herakles_disk_exporter::collectors::diskstats::{
    procfs::DEFAULT_DISKSTATS_PATH, DeviceFilter, DiskstatsSettings, SourceKind,
};
use herakles_disk_exporter::{register_builtin_collectors, CollectorContext, CollectorRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::info;

use clap::ValueEnum;

use crate::cli::{Args, ConfigFormat, LogLevel};

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9216;

const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/herakles/disk-exporter.yaml",
    "/etc/herakles/disk-exporter.yml",
    "/etc/herakles/disk-exporter.json",
    "./herakles-disk-exporter.yaml",
    "./herakles-disk-exporter.yml",
    "./herakles-disk-exporter.json",
];

/// Settings of the `diskstats` collector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskstatsConfig {
    /// "procfs" | "testdata"
    pub source: Option<SourceKind>,
    #[serde(alias = "procfs-path")]
    pub procfs_path: Option<PathBuf>,
    #[serde(alias = "device-include")]
    pub device_include: Option<String>,
    #[serde(alias = "device-exclude")]
    pub device_exclude: Option<String>,
}

/// Effective exporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,
    #[serde(alias = "enable-default-collectors")]
    pub enable_default_collectors: Option<bool>,

    // Collector toggles, applied after the defaults
    #[serde(alias = "enable-collectors")]
    pub enable_collectors: Option<Vec<String>>,
    #[serde(alias = "disable-collectors")]
    pub disable_collectors: Option<Vec<String>>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    /// Path to JSON test data file (uses synthetic data instead of /proc/diskstats)
    #[serde(alias = "test-data-file")]
    pub test_data_file: Option<PathBuf>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    #[serde(default)]
    pub diskstats: DiskstatsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            enable_default_collectors: Some(true),
            enable_collectors: None,
            disable_collectors: None,
            log_level: Some("info".into()),
            test_data_file: None,
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            diskstats: DiskstatsConfig {
                source: Some(SourceKind::Procfs),
                procfs_path: Some(PathBuf::from(DEFAULT_DISKSTATS_PATH)),
                device_include: None,
                device_exclude: None,
            },
        }
    }
}

impl Config {
    /// Effective statistics source; a test data file implies `testdata`
    /// unless a source was chosen explicitly.
    pub fn diskstats_source(&self) -> SourceKind {
        match (self.diskstats.source, &self.test_data_file) {
            (Some(kind), _) => kind,
            (None, Some(_)) => SourceKind::Testdata,
            (None, None) => SourceKind::Procfs,
        }
    }

    /// Effective log level; `info` when none is configured.
    pub fn log_level(&self) -> Result<LogLevel, String> {
        match self.log_level.as_deref() {
            None => Ok(LogLevel::Info),
            Some(level) => LogLevel::from_str(level, true)
                .map_err(|_| format!("Invalid log_level '{}'", level)),
        }
    }

    /// Socket address the HTTP server listens on.
    pub fn listen_addr(&self) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        let bind = self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        let ip: IpAddr = bind
            .parse()
            .map_err(|e| format!("Invalid bind address '{}': {}", bind, e))?;
        Ok(SocketAddr::new(ip, self.port.unwrap_or(DEFAULT_PORT)))
    }

    /// Settings handed to collector factories.
    pub fn collector_context(&self) -> CollectorContext {
        CollectorContext {
            diskstats: DiskstatsSettings {
                source: self.diskstats_source(),
                procfs_path: self
                    .diskstats
                    .procfs_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_DISKSTATS_PATH)),
                test_data_file: self.test_data_file.clone(),
                device_include: self.diskstats.device_include.clone(),
                device_exclude: self.diskstats.device_exclude.clone(),
            },
        }
    }

    /// Applies default/enable/disable toggles to the registry in that order.
    pub fn apply_collector_toggles(
        &self,
        registry: &mut CollectorRegistry,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if !self.enable_default_collectors.unwrap_or(true) {
            registry.disable_defaults();
        }
        for name in self.enable_collectors.iter().flatten() {
            registry.set_enabled(name, true)?;
        }
        for name in self.disable_collectors.iter().flatten() {
            registry.set_enabled(name, false)?;
        }
        Ok(())
    }
}

/// Registers the built-in collectors and applies the configured toggles.
pub fn build_registry(cfg: &Config) -> Result<CollectorRegistry, Box<dyn std::error::Error>> {
    let mut registry = CollectorRegistry::new();
    register_builtin_collectors(&mut registry)?;
    cfg.apply_collector_toggles(&mut registry)?;
    Ok(registry)
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    cfg.listen_addr()?;
    cfg.log_level()?;

    // Device filters
    DeviceFilter::new(
        cfg.diskstats.device_include.as_deref(),
        cfg.diskstats.device_exclude.as_deref(),
    )?;

    // Source selection
    if cfg.diskstats_source() == SourceKind::Testdata {
        match &cfg.test_data_file {
            None => {
                return Err("diskstats.source is 'testdata' but test_data_file is not set".into());
            }
            Some(path) if !path.exists() => {
                return Err(format!("Test data file not found: {}", path.display()).into());
            }
            Some(_) => {}
        }
    }

    // Collector names
    build_registry(cfg)?;

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        match (cfg.tls_cert_path.as_deref(), cfg.tls_key_path.as_deref()) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", what, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }
    if args.disable_default_collectors {
        config.enable_default_collectors = Some(false);
    }

    // Collector toggles from the CLI extend the file's lists
    if !args.collectors.is_empty() {
        config
            .enable_collectors
            .get_or_insert_with(Vec::new)
            .extend(args.collectors.iter().cloned());
    }
    if !args.no_collectors.is_empty() {
        config
            .disable_collectors
            .get_or_insert_with(Vec::new)
            .extend(args.no_collectors.iter().cloned());
    }

    // Test data file implies the testdata source
    if let Some(test_file) = &args.test_data_file {
        config.test_data_file = Some(test_file.clone());
        config.diskstats.source = Some(SourceKind::Testdata);
    }

    // A filter given on the CLI replaces whichever filter the file set
    if let Some(include) = &args.diskstats_device_include {
        config.diskstats.device_include = Some(include.clone());
        config.diskstats.device_exclude = None;
    }
    if let Some(exclude) = &args.diskstats_device_exclude {
        config.diskstats.device_exclude = Some(exclude.clone());
        config.diskstats.device_include = None;
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads a config file, or the first default location that exists.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}
