//! Logging setup for the Ralph dashboard.
//!
//! The dashboard owns the terminal while it runs, so everything goes to a
//! JSON lines file under `~/.ralph/logs/` and nothing is written to stderr.
//!
//! ```no_run
//! use ralph_core::logging;
//!
//! let _guard = logging::init_logging(None, false).expect("logging init");
//! tracing::info!(job = "alpha", "job selected");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{RalphError, Result};

/// File name used by the rolling appender.
pub const LOG_FILE_NAME: &str = "ralph.log";

/// Keeps the non-blocking writer alive. Drop it on shutdown to flush.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize file logging.
///
/// * `log_dir` - custom log directory, defaults to `~/.ralph/logs/`
/// * `verbose` - `debug` level instead of `info` (ignored when `RUST_LOG` is set)
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| RalphError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ralph={default_level}")));

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_current_span(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| RalphError::internal(format!("failed to install subscriber: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Minimal logging for tests, routed through the test writer.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Base directory for dashboard state: `~/.ralph/`
pub fn ralph_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".ralph"))
        .ok_or_else(|| RalphError::internal("could not determine home directory"))
}

/// Default log directory: `~/.ralph/logs/`
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(ralph_home()?.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_log_dir() {
        // SAFETY: serialized with every other test that touches HOME
        unsafe { std::env::set_var("HOME", "/tmp/ralph-test-home") };
        let dir = default_log_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/ralph-test-home/.ralph/logs"));
    }

    #[test]
    fn test_init_test_logging() {
        init_test_logging();
        init_test_logging();
    }
}
