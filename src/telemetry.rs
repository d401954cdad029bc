//! Logging setup and error reporting.
//!
//! Two sinks are installed: a readable stderr layer for the user and a JSON
//! log file for later inspection. Errors go through [`report`] so both sinks
//! receive exactly the same message text.

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::Coded;

/// Splits the configured log file path into its directory and file name.
///
/// `configured` is the value of `LOG_FILE_PATH` if set; otherwise `default`
/// is used.
pub fn resolve_log_path(configured: Option<String>, default: &str) -> (PathBuf, OsString) {
    let raw = configured
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| default.to_string());
    let path = Path::new(&raw);

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from(default));

    (dir, name)
}

/// Builds a level filter from `directives`, falling back to `default` when
/// they are empty or unparsable.
pub fn level_filter(directives: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .parse_lossy(directives)
}

/// Installs the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be held
/// until the program exits.
pub fn init(default_log_path: &str) -> Result<WorkerGuard> {
    let (log_dir, log_file_name) =
        resolve_log_path(std::env::var("LOG_FILE_PATH").ok(), default_log_path);

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(log_file_name.to_string_lossy().into_owned())
        .build(&log_dir)
        .with_context(|| format!("cannot open log file in {}", log_dir.display()))?;
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .with_filter(level_filter(
            &std::env::var("RUST_LOG").unwrap_or_default(),
            LevelFilter::INFO,
        ));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(non_blocking_file)
        .with_filter(level_filter(
            &std::env::var("RUST_LOG_JSON").unwrap_or_default(),
            LevelFilter::DEBUG,
        ));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()
        .context("logging was already initialised")?;

    Ok(file_guard)
}

/// Emits `err` as a single error event carrying its numbered code.
pub fn report(err: &dyn Coded) {
    error!(code = err.code(), "{err}");
}
