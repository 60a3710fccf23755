//! Logging setup using `tracing-subscriber`.
//!
//! The library only emits events. This module installs the subscriber that
//! prints them to stderr, leaving stdout for summaries.
//!
//! # Log Levels
//!
//! - `error`: stages that could not run, rows that could not be checked
//! - `warn`: dropped malformed rows
//! - `info`: run start and finish
//! - `debug`: per-stage counts

use std::io;

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter.
    pub level: Level,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Create a `LogConfig` from CLI flags.
    ///
    /// - `--quiet`: error level
    /// - 0 (no `-v`): info level
    /// - 1 (`-v`): debug level
    /// - 2+ (`-vv`): trace level
    #[must_use]
    pub fn from_flags(verbosity: u8, quiet: bool) -> Self {
        let level = match (quiet, verbosity) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::INFO,
            (false, 1) => Level::DEBUG,
            (false, _) => Level::TRACE,
        };
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) {
    let layer = fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(config.with_ansi)
        .with_target(false)
        .without_time();

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .init();
}

/// Build an `EnvFilter` from the given level. `RUST_LOG` takes precedence.
fn build_env_filter(level: Level) -> EnvFilter {
    let level_str = level.as_str().to_lowercase();

    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Other crates stay at warn.
        EnvFilter::new(format!(
            "warn,cleanse={level},cleanse_cli={level}",
            level = level_str
        ))
    })
}
