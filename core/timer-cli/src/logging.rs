//! Tracing setup.
//!
//! The long-running `run` command logs to `<root>/logs/timerthing.log`;
//! one-shot commands log to stderr so warnings show up next to their output.
//! `TIMERTHING_DEBUG_LOG=1` forces debug level, otherwise `RUST_LOG` applies.

use std::env;

use timer_core::StorageConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "timerthing.log";

fn filter(default_level: &str) -> EnvFilter {
    let debug_enabled = env::var("TIMERTHING_DEBUG_LOG")
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    }
}

/// Logs to a daily-rolled file. The guard must live until exit so buffered
/// lines get flushed.
pub fn init_file(storage: &StorageConfig) -> Option<WorkerGuard> {
    let logs_dir = storage.logs_dir();
    if let Err(err) = storage.ensure_dirs() {
        init_stderr("info");
        tracing::warn!(
            error = %err,
            path = %logs_dir.display(),
            "Log directory unavailable, using stderr"
        );
        return None;
    }
    let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter("info"))
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Some(guard)
}

pub fn init_stderr(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .init();
}
