use thiserror::Error;

/// Failures raised by the PostgreSQL client layer, before any row is mapped.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("PostgreSQL driver error")]
    Driver(#[from] sqlx::Error),

    #[error("Invalid connection url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unexpected response from {host}: {reason}")]
    UnexpectedResponse { host: String, reason: String },

    #[error("None of the configured hosts is a primary: {hosts}")]
    NoPrimary { hosts: String },
}
