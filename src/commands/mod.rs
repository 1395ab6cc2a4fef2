//! CLI command implementations for herakles-disk-exporter.
//!
//! - `check`: System validation
//! - `config`: Configuration file generation
//! - `test`: One-shot metrics collection
//! - `collectors`: Collector listing
//! - `generate-testdata`: Test data generation

pub mod check;
pub mod collectors;
pub mod config;
pub mod generate;

pub use check::command_check;
pub use collectors::command_collectors;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use test::command_test;
