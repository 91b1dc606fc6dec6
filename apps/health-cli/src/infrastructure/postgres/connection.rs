//! The seam between the check engine and a live database host.
//!
//! Every query issued by the engine goes through [`PgConnection::query`] and comes back
//! as a list of JSON objects, one per result row. The real implementation lives in
//! [`super::client`]; tests substitute scripted connections.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

use super::errors::ConnectionError;

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Identity of a database host, `host:port`. Used as the cache key for per-host checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PgHost(String);

impl PgHost {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn address(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PgHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A positional query parameter. `$1` is always the schema name.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Float(f64),
}

#[async_trait]
pub trait PgConnection: Send + Sync {
    fn host(&self) -> &PgHost;

    /// Runs a read-only query with positional parameters and returns its rows.
    async fn query(&self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>, ConnectionError>;
}
