//! Freshness of the cumulative statistics that runtime diagnostics are built on.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::infrastructure::postgres::connection::{PgConnection, PgHost};
use crate::infrastructure::postgres::errors::ConnectionError;
use crate::infrastructure::postgres::queries::LAST_STATS_RESET;

pub struct StatisticsOnHost {
    connection: Arc<dyn PgConnection>,
}

impl StatisticsOnHost {
    pub fn new(connection: Arc<dyn PgConnection>) -> Self {
        Self { connection }
    }

    pub fn host(&self) -> &PgHost {
        self.connection.host()
    }

    /// When statistics of the current database were last reset. `None` if never.
    pub async fn last_stats_reset_timestamp(
        &self,
    ) -> Result<Option<DateTime<Utc>>, ConnectionError> {
        let rows = self.connection.query(LAST_STATS_RESET, &[]).await?;
        match rows.first().and_then(|row| row.get("stats_reset")) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => parse_timestamp(raw)
                .map(Some)
                .ok_or_else(|| self.unexpected(format!("cannot parse stats_reset '{raw}'"))),
            Some(other) => {
                Err(self.unexpected(format!("stats_reset is not a timestamp: {other}")))
            }
        }
    }

    fn unexpected(&self, reason: String) -> ConnectionError {
        ConnectionError::UnexpectedResponse {
            host: self.host().to_string(),
            reason,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%#z"))
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .ok()
}

pub fn stats_reset_message(last_reset: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match last_reset {
        Some(timestamp) => format!(
            "Last statistics reset on this host was {} days ago ({})",
            (now - timestamp).num_days(),
            timestamp.to_rfc3339()
        ),
        None => "Statistics have never been reset on this host".to_string(),
    }
}
