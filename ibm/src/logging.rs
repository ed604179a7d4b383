//! Log setup
//!
//! Terraform owns stdout for the plugin handshake, so logs go to stderr.
//! `TF_LOG` picks the level the same way Terraform itself reads it.

use tracing_subscriber::filter::LevelFilter;

pub fn level_from(value: Option<&str>) -> LevelFilter {
    match value.map(|v| v.trim().to_ascii_uppercase()) {
        Some(v) if v == "TRACE" || v == "JSON" => LevelFilter::TRACE,
        Some(v) if v == "DEBUG" => LevelFilter::DEBUG,
        Some(v) if v == "WARN" => LevelFilter::WARN,
        Some(v) if v == "ERROR" => LevelFilter::ERROR,
        Some(v) if v == "OFF" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Installs the global subscriber; later calls are no-ops
pub fn init() {
    let level = level_from(std::env::var("TF_LOG").ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
