//! imageview - image viewer core driven from the command line
//!
//! Main entry point.

mod app;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = app::Args::parse();

    // Initialize logging and panic hook first
    let _log_guard = view_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = view_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("imageview starting...");

    // Load configuration
    let config = match view_core::AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load configuration, using defaults: {}", e);
            view_core::AppConfig::default()
        }
    };

    app::run(&args, config)
}
