//! # Logger Module
//!
//! Sets up `tracing-subscriber` for the CLI. `RUST_LOG` wins over the configured level:
//!
//! ```bash
//! RUST_LOG=pg_health::framework=debug pg-health check
//! ```
//!
//! Logs go to stderr by default so `--json` output on stdout stays machine readable.
//!
//! ## Environment Variables
//!
//! - `PG_HEALTH_LOGGER__LEVEL`: DEBUG, INFO, WARN or ERROR
//! - `PG_HEALTH_LOGGER__FORMAT`: Text or Json
//! - `PG_HEALTH_LOGGER__STDERR`: `false` sends logs to stdout

use serde::Deserialize;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Failed to install the log subscriber")]
    Init(#[from] TryInitError),
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggerLevel {
    #[serde(alias = "DEBUG", alias = "debug")]
    Debug,
    #[serde(alias = "INFO", alias = "info")]
    Info,
    #[serde(alias = "WARN", alias = "warn")]
    Warn,
    #[serde(alias = "ERROR", alias = "error")]
    Error,
}

impl LoggerLevel {
    pub fn to_tracing_level(&self) -> LevelFilter {
        match self {
            LoggerLevel::Debug => LevelFilter::DEBUG,
            LoggerLevel::Info => LevelFilter::INFO,
            LoggerLevel::Warn => LevelFilter::WARN,
            LoggerLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[serde(alias = "JSON", alias = "json")]
    Json,
    #[serde(alias = "TEXT", alias = "text")]
    Text,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct LoggerSettings {
    #[serde(default = "default_log_level")]
    pub level: LoggerLevel,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default = "default_log_stderr")]
    pub stderr: bool,
}

fn default_log_level() -> LoggerLevel {
    LoggerLevel::Warn
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

fn default_log_stderr() -> bool {
    true
}

impl Default for LoggerSettings {
    fn default() -> Self {
        LoggerSettings {
            level: default_log_level(),
            format: default_log_format(),
            stderr: default_log_stderr(),
        }
    }
}

pub fn setup_logging(settings: &LoggerSettings) -> Result<(), LoggerError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.to_tracing_level().to_string()));

    if settings.stderr {
        init_with_writer(settings.format, env_filter, std::io::stderr)
    } else {
        init_with_writer(settings.format, env_filter, std::io::stdout)
    }
}

fn init_with_writer<W>(
    format: LogFormat,
    env_filter: EnvFilter,
    writer: W,
) -> Result<(), LoggerError>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let format_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_level(true);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(format_layer.json())
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(format_layer.compact())
            .try_init()?,
    }
    Ok(())
}
