// SPDX-License-Identifier: Apache-2.0

//! Logging and observability helpers.

pub mod sensitive;

pub use sensitive::Sensitive;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "vitalake.log";
const LOG_RETENTION_DAYS: u64 = 14;
const DEFAULT_FILTER: &str = "vitalake=info,vitalake_lib=info";

/// Installs the JSON file subscriber and the panic hook. Safe to call more
/// than once; later calls leave the first subscriber in place.
pub fn init_tracing(log_dir: &Path) {
    let _ = fs::create_dir_all(log_dir);

    if let Err(e) = cleanup_old_logs(log_dir, LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("PANIC: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("PANIC: {}", s)
        } else {
            "PANIC: unknown cause".to_string()
        };

        tracing::error!(target: "panic", location = %location, message = %msg, "Application panicked");

        previous_hook(panic_info);
    }));

    tracing::info!("Tracing initialized. Logs directory: {:?}", log_dir);
}

/// `~/.vitalake/logs`, or `%APPDATA%\VitaLake\logs` on Windows
pub fn default_log_directory() -> PathBuf {
    if cfg!(windows) {
        let appdata = std::env::var_os("APPDATA")
            .unwrap_or_else(|| std::env::var_os("USERPROFILE").unwrap_or_default());
        let mut path = PathBuf::from(appdata);
        path.push("VitaLake");
        path.push("logs");
        path
    } else {
        let mut path = dirs::home_dir().unwrap_or_default();
        path.push(".vitalake");
        path.push("logs");
        path
    }
}

/// Removes `*.log*` files older than `retention_days`. Returns how many
/// were removed.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<usize> {
    let now = SystemTime::now();
    let retention = Duration::from_secs(retention_days * 24 * 60 * 60);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with(LOG_FILE_PREFIX))
            .unwrap_or(false);
        if !is_log {
            continue;
        }

        let age = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok());

        if matches!(age, Some(age) if age > retention) {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("Failed to remove old log file {:?}: {}", path, e),
            }
        }
    }
    Ok(removed)
}
