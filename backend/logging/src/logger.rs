//! Structured Logger
//!
//! Console output for operators plus an optional daily NDJSON file, so that
//! `detection_events` records can be collected from disk.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Prefix of the rotated log files (`roachwatch.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "roachwatch.log";

/// Where file logs go, or `None` when `log_dir` is blank (console only).
pub fn log_file_dir(log_dir: &str) -> Option<&Path> {
    let trimmed = log_dir.trim();
    (!trimmed.is_empty()).then(|| Path::new(trimmed))
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level`. A blank `log_dir` disables the file layer.
/// A second call (e.g. from tests) keeps the first subscriber.
pub fn init_logger(log_dir: &str, level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = log_file_dir(log_dir).map(|dir| {
        fmt::layer()
            .json()
            .with_writer(RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX))
            .with_ansi(false)
    });

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_ansi(true);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
