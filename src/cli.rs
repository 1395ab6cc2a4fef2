//! CLI arguments and subcommands for herakles-disk-exporter.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-disk-exporter",
    about = "Prometheus exporter for per-disk I/O statistics",
    long_about = "Prometheus exporter for per-disk I/O statistics.\n\n\
                  Exposes bytes read and written, cumulative I/O time and read/write \
                  service time for every disk, labelled by device name. Collectors are \
                  registered in an explicit registry and can be toggled individually.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version,
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-disk-exporter | Support: exporter@herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides log_level from the config file; default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Enable a collector (repeatable)
    #[arg(long = "collector", value_name = "NAME")]
    pub collectors: Vec<String>,

    /// Disable a collector (repeatable)
    #[arg(long = "no-collector", value_name = "NAME")]
    pub no_collectors: Vec<String>,

    /// Disable all collectors that are enabled by default
    #[arg(long)]
    pub disable_default_collectors: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable internal herakles_exporter_* metrics
    #[arg(long)]
    pub disable_telemetry: bool,

    /// Path to JSON test data file (uses synthetic data instead of /proc/diskstats)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Only collect devices matching this regex
    #[arg(long, conflicts_with = "diskstats_device_exclude")]
    pub diskstats_device_include: Option<String>,

    /// Skip devices matching this regex
    #[arg(long)]
    pub diskstats_device_exclude: Option<String>,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and system requirements
    Check {
        /// Check the configured statistics source
        #[arg(long)]
        source: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Test metrics collection
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Print every emitted sample
        #[arg(long)]
        verbose: bool,
    },

    /// List registered collectors and whether they are enabled
    Collectors,

    /// Generate synthetic test data JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of disks to generate
        #[arg(long, default_value_t = 4)]
        disks: usize,
    },
}
