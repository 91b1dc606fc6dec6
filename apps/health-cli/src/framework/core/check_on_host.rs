//! Runs one diagnostic against one host.

use std::sync::Arc;

use itertools::Itertools;
use tracing::debug;

use crate::infrastructure::postgres::connection::{PgConnection, PgHost};
use crate::infrastructure::postgres::mapper::map_row;
use crate::infrastructure::postgres::queries::QueryTemplate;

use super::context::PgContext;
use super::diagnostic::Diagnostic;
use super::errors::CheckError;
use super::model::DbObject;
use super::predicates::ExclusionPredicate;

pub struct HostCheck {
    connection: Arc<dyn PgConnection>,
    diagnostic: Diagnostic,
    template: QueryTemplate,
}

impl HostCheck {
    pub fn new(
        connection: Arc<dyn PgConnection>,
        diagnostic: Diagnostic,
        template: QueryTemplate,
    ) -> Self {
        Self {
            connection,
            diagnostic,
            template,
        }
    }

    pub fn host(&self) -> &PgHost {
        self.connection.host()
    }

    pub fn diagnostic(&self) -> Diagnostic {
        self.diagnostic
    }

    /// Returns the findings that survive `exclusions`, sorted by natural key.
    pub async fn check(
        &self,
        ctx: &PgContext,
        exclusions: &ExclusionPredicate,
    ) -> Result<Vec<DbObject>, CheckError> {
        debug!(
            host = %self.host(),
            diagnostic = self.diagnostic.name(),
            schema = ctx.schema_name(),
            "Executing diagnostic query on host"
        );

        let params = self.template.binding.params(ctx);
        let query = self.connection.query(&self.template.sql, &params);
        let result = match ctx.query_timeout() {
            Some(timeout) => tokio::time::timeout(timeout, query).await.map_err(|_| {
                CheckError::QueryTimeout {
                    host: self.host().to_string(),
                    diagnostic: self.diagnostic.name().to_string(),
                    timeout,
                }
            })?,
            None => query.await,
        };
        let rows = result.map_err(|source| CheckError::QueryExecutionFailed {
            host: self.host().to_string(),
            diagnostic: self.diagnostic.name().to_string(),
            source,
        })?;

        let mut objects = rows
            .iter()
            .map(|row| map_row(&self.diagnostic, row))
            .filter_ok(|object| !exclusions.is_excluded(object))
            .collect::<Result<Vec<_>, _>>()?;
        objects.sort();

        debug!(
            host = %self.host(),
            diagnostic = self.diagnostic.name(),
            rows = rows.len(),
            findings = objects.len(),
            "Diagnostic query finished"
        );
        Ok(objects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::core::registry::{BLOATED_INDEXES, INVALID_INDEXES};
    use crate::framework::core::test_support::{index_row, MockConnection};
    use crate::infrastructure::postgres::connection::QueryParam;
    use crate::infrastructure::postgres::errors::ConnectionError;
    use crate::infrastructure::postgres::queries::{QueryProvider, StandardQueries};
    use std::time::Duration;

    fn host_check(connection: Arc<MockConnection>, diagnostic: Diagnostic) -> HostCheck {
        let template = StandardQueries.query_for(&diagnostic).unwrap();
        HostCheck::new(connection, diagnostic, template)
    }

    #[tokio::test]
    async fn test_results_are_sorted() {
        let connection = Arc::new(MockConnection::new("primary:5432").with_rows(vec![
            index_row("orders", "orders_status_idx", 100),
            index_row("accounts", "accounts_email_idx", 200),
            index_row("orders", "orders_created_idx", 300),
        ]));
        let check = host_check(connection, INVALID_INDEXES);

        let objects = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap();
        let names: Vec<String> = objects.iter().map(|o| o.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "accounts.accounts_email_idx",
                "orders.orders_created_idx",
                "orders.orders_status_idx",
            ]
        );
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let connection = Arc::new(MockConnection::new("primary:5432").with_rows(vec![
            index_row("b", "b_idx", 1),
            index_row("a", "a_idx", 2),
        ]));
        let check = host_check(connection, INVALID_INDEXES);
        let ctx = PgContext::default();

        let first = check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        let second = check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_excluded_objects_are_dropped() {
        let connection = Arc::new(MockConnection::new("primary:5432").with_rows(vec![
            index_row("orders", "orders_status_idx", 100),
            index_row("accounts", "accounts_email_idx", 200),
        ]));
        let check = host_check(connection, INVALID_INDEXES);

        let objects = check
            .check(
                &PgContext::default(),
                &ExclusionPredicate::by_name(["ORDERS_STATUS_IDX"]),
            )
            .await
            .unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name(), "accounts_email_idx");
    }

    #[tokio::test]
    async fn test_schema_and_threshold_are_bound() {
        let connection = Arc::new(MockConnection::new("primary:5432"));
        let check = host_check(connection.clone(), BLOATED_INDEXES);
        let ctx = PgContext::of("Sales")
            .unwrap()
            .with_bloat_percentage_threshold(25.0)
            .unwrap();

        check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        assert_eq!(
            connection.seen_params(),
            vec![vec![
                QueryParam::Text("sales".to_string()),
                QueryParam::Float(25.0)
            ]]
        );
    }

    #[tokio::test]
    async fn test_driver_failure_is_wrapped() {
        let connection = Arc::new(MockConnection::new("replica:5432").failing("connection reset"));
        let check = host_check(connection, INVALID_INDEXES);

        let error = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap_err();
        match error {
            CheckError::QueryExecutionFailed {
                host,
                diagnostic,
                source,
            } => {
                assert_eq!(host, "replica:5432");
                assert_eq!(diagnostic, "invalid_indexes");
                assert!(matches!(source, ConnectionError::UnexpectedResponse { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_host_times_out() {
        let connection =
            Arc::new(MockConnection::new("slow:5432").with_delay(Duration::from_secs(5)));
        let check = host_check(connection, INVALID_INDEXES);
        let ctx = PgContext::default().with_query_timeout(Duration::from_millis(20));

        let error = check
            .check(&ctx, &ExclusionPredicate::none())
            .await
            .unwrap_err();
        assert!(matches!(error, CheckError::QueryTimeout { ref host, .. } if host == "slow:5432"));
    }

    #[tokio::test]
    async fn test_unmappable_row_fails() {
        let connection = Arc::new(
            MockConnection::new("primary:5432")
                .with_rows(vec![serde_json::json!({"table_name": "orders"})]),
        );
        let check = host_check(connection, INVALID_INDEXES);

        let error = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap_err();
        assert!(matches!(error, CheckError::RowMapping { .. }));
    }
}
