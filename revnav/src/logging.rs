//! Tracing setup.
//!
//! The TUI owns the terminal, so log lines never go to stdout or stderr. With a
//! configured directory they are appended to `revnav.log` through a non-blocking
//! writer; without one no subscriber is installed and all events are dropped.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Environment variable holding `EnvFilter` directives. Takes precedence over config.
pub const LOG_ENV: &str = "REVNAV_LOG";

const LOG_FILE_NAME: &str = "revnav.log";

/// Installs the global subscriber described by `config`.
///
/// Returns the writer guard, which must be held until exit so buffered lines are
/// flushed. Returns `None` when file logging is not configured.
///
/// # Errors
///
/// Returns `Err` if the log directory cannot be created.
pub fn init(config: &LogConfig) -> std::io::Result<Option<WorkerGuard>> {
    let Some(dir) = &config.directory else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(&config.filter))
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .init();

    Ok(Some(guard))
}

/// `REVNAV_LOG` when set and valid, else `fallback`, else `info`.
fn build_env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
