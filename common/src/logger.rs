use crate::config::AppConfig;
use std::fs;
use std::io;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot create log directory '{dir}': {source}")]
    LogDir { dir: String, source: io::Error },
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter from `LOG_LEVEL` semantics, falling back to `info` on a bad directive.
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber: a daily-rolling file layer plus, when enabled,
/// a colored stdout layer.
///
/// Keep the returned guard alive for the whole process or buffered lines are lost.
pub fn init_logging(config: &AppConfig) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(&config.log_dir).map_err(|source| LoggingError::LogDir {
        dir: config.log_dir.clone(),
        source,
    })?;

    let file_appender = rolling::daily(&config.log_dir, &config.log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let stdout_layer = config.log_to_stdout.then(|| {
        fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
            .with_target(true)
    });

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(guard)
}
