//! Structured logging initialisation
//!
//! Every module logs through `tracing` macros with structured fields. This
//! module wires those events to a `tracing-subscriber` registry:
//! - `EnvFilter` level filter (`RUST_LOG` wins when set)
//! - extra per-target directives
//! - JSON output for production, pretty output for development
//! - optional non-blocking writer via `tracing-appender`
//! - stderr by default in both modes, so stdout stays free for command output

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json, // Default to JSON
        }
    }
}

/// Stream the log lines go to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogWriter {
    Stdout,
    Stderr,
}

impl LogWriter {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "stdout" => LogWriter::Stdout,
            _ => LogWriter::Stderr,
        }
    }

    fn make(self) -> Box<dyn std::io::Write + Send> {
        match self {
            LogWriter::Stdout => Box::new(std::io::stdout()),
            LogWriter::Stderr => Box::new(std::io::stderr()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Enable non-blocking buffered output
    pub async_logging: bool,
    /// Extra filter directives (comma-separated, e.g. `segrouter::router=debug`)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
    /// Output stream, the same for sync and async logging
    pub writer: LogWriter,
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("SEGROUTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var("SEGROUTER_LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env::var("SEGROUTER_LOG_ASYNC")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            target_filter: env::var("SEGROUTER_LOG_TARGET_FILTER").ok(),
            include_location: env::var("SEGROUTER_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            writer: LogWriter::parse(
                &env::var("SEGROUTER_LOG_WRITER").unwrap_or_else(|_| "stderr".to_string()),
            ),
        }
    }

    /// Configuration for local development and tests
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
            writer: LogWriter::Stderr,
        }
    }

    /// Configuration for production: JSON, info level, buffered
    #[must_use]
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
            writer: LogWriter::Stderr,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Build the level filter plus any extra target directives
    ///
    /// Invalid directives are skipped with a note on stderr; logging is not up
    /// yet at this point.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',') {
                let filter = filter.trim();
                if filter.is_empty() {
                    continue;
                }
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
                }
            }
        }
        env_filter
    }
}

/// Initialize logging with the given configuration
///
/// May only succeed once per process; later calls return an error.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use segrouter::logging::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env()).unwrap();
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(config.writer.make());

        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(non_blocking)
                .boxed(),
        };

        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize async logging")?;

        // The writer thread flushes on drop; keep it for the process lifetime.
        std::mem::forget(guard);
    } else {
        let writer = config.writer;
        let fmt_layer = match config.format {
            LogFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(move || writer.make())
                .boxed(),
            LogFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_target(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_writer(move || writer.make())
                .boxed(),
        };

        registry
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize sync logging")?;
    }

    Ok(())
}
