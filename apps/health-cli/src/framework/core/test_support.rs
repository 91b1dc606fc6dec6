//! In-memory connections and topologies so engine tests never need a live database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::framework::core::diagnostic::Diagnostic;
use crate::infrastructure::postgres::connection::{PgConnection, PgHost, QueryParam, Row};
use crate::infrastructure::postgres::errors::ConnectionError;
use crate::infrastructure::postgres::queries::{QueryProvider, QueryTemplate, LAST_STATS_RESET};
use crate::infrastructure::postgres::topology::StaticTopology;

/// A connection that answers every diagnostic query with the same scripted rows.
pub struct MockConnection {
    host: PgHost,
    rows: Vec<Row>,
    stats_reset: Value,
    failure: Option<String>,
    stats_failure: AtomicBool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    params: Mutex<Vec<Vec<QueryParam>>>,
}

impl MockConnection {
    pub fn new(host: &str) -> Self {
        Self {
            host: PgHost::new(host),
            rows: Vec::new(),
            stats_reset: Value::Null,
            failure: None,
            stats_failure: AtomicBool::new(false),
            delay: None,
            calls: AtomicUsize::new(0),
            params: Mutex::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Value>) -> Self {
        self.rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => map,
                other => panic!("mock rows must be JSON objects, got {other}"),
            })
            .collect();
        self
    }

    pub fn with_stats_reset(mut self, timestamp: &str) -> Self {
        self.stats_reset = Value::String(timestamp.to_string());
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn failing_stats(self) -> Self {
        self.set_stats_failing(true);
        self
    }

    pub fn set_stats_failing(&self, failing: bool) {
        self.stats_failure.store(failing, Ordering::SeqCst);
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn shared(self) -> Arc<dyn PgConnection> {
        Arc::new(self)
    }

    /// Number of diagnostic queries received, statistics reads excluded.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_params(&self) -> Vec<Vec<QueryParam>> {
        self.params.lock().unwrap().clone()
    }
}

#[async_trait]
impl PgConnection for MockConnection {
    fn host(&self) -> &PgHost {
        &self.host
    }

    async fn query(&self, sql: &str, params: &[QueryParam]) -> Result<Vec<Row>, ConnectionError> {
        if sql == LAST_STATS_RESET {
            if self.stats_failure.load(Ordering::SeqCst) {
                return Err(self.error("permission denied for pg_stat_database"));
            }
            return Ok(vec![row(json!({ "stats_reset": self.stats_reset }))]);
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.params.lock().unwrap().push(params.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(reason) => Err(self.error(reason)),
            None => Ok(self.rows.clone()),
        }
    }
}

impl MockConnection {
    fn error(&self, reason: &str) -> ConnectionError {
        ConnectionError::UnexpectedResponse {
            host: self.host.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A provider that knows no queries at all.
pub struct NoQueries;

impl QueryProvider for NoQueries {
    fn query_for(&self, _diagnostic: &Diagnostic) -> Option<QueryTemplate> {
        None
    }
}

pub fn topology(
    primary: &Arc<MockConnection>,
    replicas: &[&Arc<MockConnection>],
) -> Arc<StaticTopology> {
    Arc::new(StaticTopology::with_replicas(
        primary.clone(),
        replicas
            .iter()
            .map(|replica| (*replica).clone() as Arc<dyn PgConnection>)
            .collect(),
    ))
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("rows must be JSON objects, got {other}"),
    }
}

pub fn unused_index_row(table: &str, index: &str, scans: u64) -> Value {
    json!({
        "table_name": table,
        "index_name": index,
        "index_size": 8192,
        "index_scans": scans
    })
}

pub fn missing_index_row(table: &str, seq_scans: u64) -> Value {
    json!({
        "table_name": table,
        "table_size": 65536,
        "seq_scans": seq_scans,
        "index_scans": 0
    })
}

pub fn index_row(table: &str, index: &str, size: u64) -> Value {
    json!({
        "table_name": table,
        "index_name": index,
        "index_size": size
    })
}
