use std::time::Duration;

use thiserror::Error;

use crate::infrastructure::postgres::errors::ConnectionError;

/// Errors raised while running a check. None of them leave partial results behind.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Invalid schema name '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Diagnostic '{diagnostic}' failed on host {host}")]
    QueryExecutionFailed {
        host: String,
        diagnostic: String,
        #[source]
        source: ConnectionError,
    },

    #[error(
        "Diagnostic '{diagnostic}' timed out on host {host} after {}",
        humantime::format_duration(*.timeout)
    )]
    QueryTimeout {
        host: String,
        diagnostic: String,
        timeout: Duration,
    },

    #[error("Cannot map a row of diagnostic '{diagnostic}': {reason}")]
    RowMapping { diagnostic: String, reason: String },

    #[error(transparent)]
    Configuration(#[from] ConfigError),
}

/// Construction-time misconfiguration. Raised before any query is executed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Diagnostic '{diagnostic}' runs across the cluster but has no merge strategy")]
    MisconfiguredAcrossClusterDiagnostic { diagnostic: String },

    #[error("No query is registered for diagnostic '{diagnostic}'")]
    MissingQuery { diagnostic: String },

    #[error("Unknown diagnostic(s): {names}. Available diagnostics: {available}")]
    UnknownDiagnostic { names: String, available: String },
}
