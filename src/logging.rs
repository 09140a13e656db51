//! Tracing subscriber setup used by the worker binary.

use std::{env, sync::OnceLock};

use tracing_appender::{
    non_blocking,
    non_blocking::NonBlocking,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{
    EnvFilter,
    fmt::{fmt, time::ChronoLocal, writer::MakeWriterExt},
};

/// Guard to ensure buffered logs are flushed on shutdown.
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

/// Install the global subscriber. `RUST_LOG` drives filtering,
/// `LOG_FORMAT=json` switches to JSON lines and `LOG_DIR` adds a daily
/// rolling file next to stdout.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_level(true);

    let file = env::var("LOG_DIR").ok().and_then(init_file_writer);
    let stdout = std::io::stdout.with_max_level(tracing::Level::INFO);

    match (file, json) {
        (Some(file), true) => builder
            .json()
            .with_current_span(true)
            .with_writer(stdout.and(file))
            .init(),
        (Some(file), false) => builder.with_ansi(true).with_writer(stdout.and(file)).init(),
        (None, true) => builder.json().with_current_span(true).init(),
        (None, false) => builder.with_ansi(true).init(),
    }

    tracing::info!("logger initialized");
}

fn init_file_writer(dir: String) -> Option<NonBlocking> {
    let max_files = env::var("LOG_MAX_FILES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok());

    let mut file_builder = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("riftstats.log");

    if let Some(n) = max_files {
        file_builder = file_builder.max_log_files(n);
    }

    // The subscriber is not installed yet.
    let file_appender = match file_builder.build(&dir) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("could not open log directory {dir}: {e}");
            return None;
        }
    };

    let (file_writer, guard) = non_blocking(file_appender);
    if LOG_GUARD.set(guard).is_err() {
        eprintln!("logger already initialized");
        return None;
    }

    Some(file_writer)
}
