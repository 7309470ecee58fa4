//! Structured logging setup with tracing

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Keeps the non-blocking file writer alive
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Initialize the logging system
pub fn init_logging() -> anyhow::Result<LogGuard> {
    let log_dir = super::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "imageview.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(debug_assertions)]
    {
        // Development: pretty console output + file
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        // Release: compact console + JSON file
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    tracing::info!("Logging initialized in {:?}", log_dir);
    Ok(LogGuard { _file: guard })
}

/// Clean up log files older than specified days
pub fn cleanup_old_logs(days: u32) -> anyhow::Result<usize> {
    cleanup_logs_in(&super::log_dir(), days)
}

/// Delete `*.log*` files in `log_dir` last modified more than `days` ago
pub fn cleanup_logs_in(log_dir: &Path, days: u32) -> anyhow::Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let threshold = SystemTime::now() - Duration::from_secs(days as u64 * 24 * 60 * 60);
    let mut deleted = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();

        // Rolling appender names files "imageview.log.YYYY-MM-DD"
        let is_log = path
            .file_name()
            .map(|n| n.to_string_lossy().contains(".log"))
            .unwrap_or(false);
        if !is_log {
            continue;
        }

        let modified = entry.metadata().and_then(|m| m.modified());
        if let Ok(modified) = modified {
            if modified < threshold && std::fs::remove_file(&path).is_ok() {
                deleted += 1;
                tracing::debug!("Deleted old log: {:?}", path);
            }
        }
    }

    tracing::info!("Cleaned up {} old log files", deleted);
    Ok(deleted)
}
