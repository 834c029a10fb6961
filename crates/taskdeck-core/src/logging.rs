//! File-backed tracing setup.
//!
//! The TUI owns stdout/stderr while running, so logs always go to a file.
//! Filter precedence: `TASKDECK_LOG` env > config `[log] level`.

use std::fs;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Env var holding a tracing filter directive.
pub const LOG_ENV: &str = "TASKDECK_LOG";

/// Installs the global subscriber writing to the configured log file.
///
/// The returned guard flushes buffered lines on drop and must be kept alive
/// for the lifetime of the process.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let path = config.log_file();
    let dir = path
        .parent()
        .map_or_else(|| std::path::PathBuf::from("."), std::path::Path::to_path_buf);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "taskdeck.log".into(), std::ffi::OsStr::to_os_string);

    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(guard)
}
