//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - Panic hook that routes panics through the logger
//! - Startup configuration report

use anyhow::Result;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;

use crate::core::config::Config;

/// Initialize logger for both console and file output
///
/// The log file is opened in append mode so restarts keep history.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file_path, e))?;

    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .build();

    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(
            LevelFilter::Info,
            log_config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, log_config, log_file),
    ];

    CombinedLogger::init(loggers).map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs panics instead of letting them vanish on a detached task
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));
}

/// Logs which optional features are enabled. Secrets are never printed.
pub fn log_startup_configuration(config: &Config) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("MLBB top-up bot configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for line in config.redacted_summary().lines() {
        log::info!("  {}", line);
    }

    if config.uses_placeholder_secret() {
        log::warn!("⚠️  WEBHOOK_SECRET is the default placeholder; anyone who knows it can record top-ups");
    }
    if config.admin_chat.is_none() {
        log::info!("ADMIN_CHAT_ID not set; top-up notifications disabled");
    }
}
