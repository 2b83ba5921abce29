// Copyright (c) The Diem Core Contributors
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Logger setup for the network bootstrapper.
//!
//! Components never log through a global; they receive a [`Logger`] and derive child
//! loggers from it with `logger.new(o!(..))`.
//!
//! ## Usage
//!
//! ```rust, no_run
//! use netboot_logger::{build_logger, LoggerConfig};
//! use slog::info;
//!
//! let logger = build_logger(&LoggerConfig::default());
//! info!(logger, "Starting..."; "nodes" => 3);
//! ```

use once_cell::sync::Lazy;
use slog::{o, Discard, Drain, FilterLevel, Level, Logger, Never};
use slog_async::Async;
use slog_envlogger::{EnvLogger, LogBuilder};
use slog_term::{FullFormat, PlainDecorator, TermDecorator};
use std::{str::FromStr, sync::Mutex};

pub use slog;

/// Default channel size of the asynchronous drain.
pub const DEFAULT_CHAN_SIZE: usize = 256;

#[derive(Clone, Debug, PartialEq)]
pub struct LoggerConfig {
    /// Log on a background thread instead of the calling one.
    pub is_async: bool,
    pub chan_size: usize,
    pub level: Level,
    /// Colour output through the terminal decorator instead of plain text.
    pub terminal: bool,
}

impl Default for LoggerConfig {
    fn default() -> LoggerConfig {
        LoggerConfig {
            is_async: false,
            chan_size: DEFAULT_CHAN_SIZE,
            level: Level::Info,
            terminal: true,
        }
    }
}

/// Parses a level name such as `info` or `WARN`. `warn` and `warning` are both accepted.
pub fn parse_level(level: &str) -> Result<Level, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warn" | "warning" => Ok(Level::Warning),
        other => Level::from_str(other).map_err(|_| format!("unknown log level {:?}", level)),
    }
}

/// Builds the root logger writing to stderr. `RUST_LOG` directives, when set, refine the
/// configured level per module.
pub fn build_logger(config: &LoggerConfig) -> Logger {
    let filter_level = level_filter(config.level);
    if config.terminal {
        let drain = FullFormat::new(TermDecorator::new().stderr().build())
            .build()
            .fuse();
        root_logger(config, create_env_logger_with_level(drain, filter_level))
    } else {
        let drain = FullFormat::new(PlainDecorator::new(std::io::stderr()))
            .build()
            .fuse();
        root_logger(config, create_env_logger_with_level(drain, filter_level))
    }
}

/// A logger that drops every record, used by components nobody handed a logger to.
pub fn discard() -> Logger {
    Logger::root(Discard, o!())
}

static TESTING_LOGGER: Lazy<Logger> = Lazy::new(|| {
    if std::env::var("RUST_LOG").is_ok() {
        build_logger(&LoggerConfig {
            level: Level::Debug,
            terminal: false,
            ..LoggerConfig::default()
        })
    } else {
        discard()
    }
});

/// Logger for tests: silent unless `RUST_LOG` is set.
pub fn test_logger() -> Logger {
    TESTING_LOGGER.clone()
}

fn level_filter(level: Level) -> FilterLevel {
    match level {
        Level::Critical => FilterLevel::Critical,
        Level::Error => FilterLevel::Error,
        Level::Warning => FilterLevel::Warning,
        Level::Info => FilterLevel::Info,
        Level::Debug => FilterLevel::Debug,
        Level::Trace => FilterLevel::Trace,
    }
}

fn create_env_logger_with_level<D>(drain: D, level: FilterLevel) -> EnvLogger<D>
where
    D: Drain<Err = Never, Ok = ()> + Send + 'static,
{
    let mut builder = LogBuilder::new(drain).filter(None, level);
    if let Ok(directives) = std::env::var("RUST_LOG") {
        builder = builder.parse(&directives);
    }
    builder.build()
}

fn root_logger<D>(config: &LoggerConfig, drain: D) -> Logger
where
    D: Drain<Err = Never, Ok = ()> + Send + 'static,
{
    if config.is_async {
        let drain = Async::new(drain).chan_size(config.chan_size).build().fuse();
        Logger::root(drain, o!())
    } else {
        Logger::root(Mutex::new(drain).fuse(), o!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slog::info;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), Level::Info);
        assert_eq!(parse_level(" DEBUG ").unwrap(), Level::Debug);
        assert_eq!(parse_level("warn").unwrap(), Level::Warning);
        assert_eq!(parse_level("warning").unwrap(), Level::Warning);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_loggers_accept_records() {
        info!(discard(), "dropped"; "key" => 1);
        let logger = build_logger(&LoggerConfig {
            is_async: true,
            chan_size: 8,
            level: Level::Error,
            terminal: false,
        });
        info!(logger, "filtered out");
        info!(test_logger(), "maybe printed");
    }
}
