//! imageview Logging Module
//!
//! Provides structured logging, log retention and crash reports.

mod panic_hook;
mod logging;

pub use panic_hook::init_panic_hook;
pub use logging::{init_logging, cleanup_old_logs, cleanup_logs_in, LogGuard};

use std::path::PathBuf;
use directories::ProjectDirs;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("org", "imageview", "imageview")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize logging and the panic hook.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process exits.
pub fn init() -> anyhow::Result<LogGuard> {
    let guard = init_logging()?;
    init_panic_hook();
    Ok(guard)
}
