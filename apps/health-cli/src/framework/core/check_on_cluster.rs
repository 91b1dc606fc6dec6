//! Runs one diagnostic against the cluster: once on the primary, or on every host
//! followed by a merge of the per-host findings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::{join_all, try_join_all};
use tracing::{info, warn};

use crate::infrastructure::postgres::connection::{PgConnection, PgHost};
use crate::infrastructure::postgres::queries::{QueryProvider, QueryTemplate};
use crate::infrastructure::postgres::topology::ClusterTopology;

use super::check_on_host::HostCheck;
use super::context::PgContext;
use super::diagnostic::Diagnostic;
use super::errors::{CheckError, ConfigError};
use super::merge::MergeStrategy;
use super::model::DbObject;
use super::predicates::ExclusionPredicate;
use super::statistics::{stats_reset_message, StatisticsOnHost};

pub struct ClusterCheck {
    topology: Arc<dyn ClusterTopology>,
    diagnostic: Diagnostic,
    template: QueryTemplate,
    host_checks: DashMap<PgHost, Arc<HostCheck>>,
    statistics: DashMap<PgHost, Arc<StatisticsOnHost>>,
    last_stats_resets: DashMap<PgHost, Option<DateTime<Utc>>>,
}

impl std::fmt::Debug for ClusterCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterCheck")
            .field("diagnostic", &self.diagnostic.name())
            .field("hosts", &self.host_checks.len())
            .finish()
    }
}

impl ClusterCheck {
    /// Validates the wiring of `diagnostic` before anything is queried.
    pub fn new(
        topology: Arc<dyn ClusterTopology>,
        queries: &dyn QueryProvider,
        diagnostic: Diagnostic,
    ) -> Result<Self, ConfigError> {
        if diagnostic.is_across_cluster() && diagnostic.merge_strategy().is_none() {
            return Err(ConfigError::MisconfiguredAcrossClusterDiagnostic {
                diagnostic: diagnostic.name().to_string(),
            });
        }
        let template = queries
            .query_for(&diagnostic)
            .ok_or_else(|| ConfigError::MissingQuery {
                diagnostic: diagnostic.name().to_string(),
            })?;

        let check = Self {
            topology,
            diagnostic,
            template,
            host_checks: DashMap::new(),
            statistics: DashMap::new(),
            last_stats_resets: DashMap::new(),
        };
        check.host_check(&check.topology.connection_to_primary());
        Ok(check)
    }

    pub fn diagnostic(&self) -> Diagnostic {
        self.diagnostic
    }

    pub async fn check(
        &self,
        ctx: &PgContext,
        exclusions: &ExclusionPredicate,
    ) -> Result<Vec<DbObject>, CheckError> {
        match self.diagnostic.merge_strategy() {
            Some(merge_strategy) if self.diagnostic.is_across_cluster() => {
                self.check_on_cluster(ctx, exclusions, merge_strategy).await
            }
            _ => {
                let primary = self.host_check(&self.topology.connection_to_primary());
                primary.check(ctx, exclusions).await
            }
        }
    }

    /// Reset time seen the last time this check logged statistics freshness for `host`.
    /// `None` when statistics were never reset there or were never read.
    pub fn last_known_stats_reset(&self, host: &PgHost) -> Option<DateTime<Utc>> {
        self.last_stats_resets
            .get(host)
            .and_then(|last_reset| *last_reset.value())
    }

    async fn check_on_cluster(
        &self,
        ctx: &PgContext,
        exclusions: &ExclusionPredicate,
        merge_strategy: MergeStrategy,
    ) -> Result<Vec<DbObject>, CheckError> {
        let connections = self.topology.connections_to_all_hosts();
        if self.diagnostic.is_runtime() {
            self.log_statistics_freshness(&connections, ctx).await;
        }

        let host_checks: Vec<Arc<HostCheck>> = connections
            .iter()
            .map(|connection| self.host_check(connection))
            .collect();
        let per_host =
            try_join_all(host_checks.iter().map(|host| host.check(ctx, exclusions))).await?;
        Ok(merge_strategy.merge(per_host))
    }

    async fn log_statistics_freshness(
        &self,
        connections: &[Arc<dyn PgConnection>],
        ctx: &PgContext,
    ) {
        let now = Utc::now();
        join_all(connections.iter().map(|connection| async move {
            let statistics = self.statistics_on(connection);
            let read = statistics.last_stats_reset_timestamp();
            let result = match ctx.query_timeout() {
                Some(timeout) => match tokio::time::timeout(timeout, read).await {
                    Ok(result) => result.map_err(|e| format!("{e:?}")),
                    Err(_) => Err(format!(
                        "timed out after {}",
                        humantime::format_duration(timeout)
                    )),
                },
                None => read.await.map_err(|e| format!("{e:?}")),
            };

            let host = statistics.host();
            match result {
                Ok(last_reset) => {
                    self.last_stats_resets.insert(host.clone(), last_reset);
                    info!(
                        host = %host,
                        diagnostic = self.diagnostic.name(),
                        "{}",
                        stats_reset_message(last_reset, now)
                    );
                }
                Err(reason) => {
                    self.last_stats_resets.remove(host);
                    warn!(
                        host = %host,
                        diagnostic = self.diagnostic.name(),
                        "Could not read the statistics reset time: {reason}"
                    );
                }
            }
        }))
        .await;
    }

    fn host_check(&self, connection: &Arc<dyn PgConnection>) -> Arc<HostCheck> {
        self.host_checks
            .entry(connection.host().clone())
            .or_insert_with(|| {
                Arc::new(HostCheck::new(
                    connection.clone(),
                    self.diagnostic,
                    self.template.clone(),
                ))
            })
            .value()
            .clone()
    }

    fn statistics_on(&self, connection: &Arc<dyn PgConnection>) -> Arc<StatisticsOnHost> {
        self.statistics
            .entry(connection.host().clone())
            .or_insert_with(|| Arc::new(StatisticsOnHost::new(connection.clone())))
            .value()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::core::diagnostic::{ExecutionTopology, Staticness};
    use crate::framework::core::model::ResultType;
    use crate::framework::core::registry::{
        INVALID_INDEXES, TABLES_WITH_MISSING_INDEXES, UNUSED_INDEXES,
    };
    use crate::framework::core::test_support::{
        index_row, missing_index_row, topology, unused_index_row, MockConnection, NoQueries,
    };
    use crate::infrastructure::postgres::queries::StandardQueries;
    use std::time::Duration;

    fn names(objects: &[DbObject]) -> Vec<String> {
        objects.iter().map(|o| o.to_string()).collect()
    }

    #[test]
    fn test_across_cluster_without_merge_fails_before_any_query() {
        let primary = Arc::new(MockConnection::new("primary:5432"));
        let replica = Arc::new(MockConnection::new("replica:5432"));
        let unmerged = Diagnostic::new(
            "unused_indexes",
            ResultType::UnusedIndex,
            Staticness::Runtime,
            ExecutionTopology::AcrossCluster,
        );

        let error =
            ClusterCheck::new(topology(&primary, &[&replica]), &StandardQueries, unmerged)
                .unwrap_err();
        assert!(matches!(
            error,
            ConfigError::MisconfiguredAcrossClusterDiagnostic { ref diagnostic }
                if diagnostic == "unused_indexes"
        ));
        assert_eq!(primary.calls() + replica.calls(), 0);
    }

    #[test]
    fn test_missing_query_fails_at_construction() {
        let primary = Arc::new(MockConnection::new("primary:5432"));
        let error =
            ClusterCheck::new(topology(&primary, &[]), &NoQueries, INVALID_INDEXES).unwrap_err();
        assert!(matches!(error, ConfigError::MissingQuery { .. }));
    }

    #[tokio::test]
    async fn test_on_primary_only_queries_primary() {
        let primary = Arc::new(
            MockConnection::new("primary:5432").with_rows(vec![index_row("t", "t_idx", 1)]),
        );
        let replica = Arc::new(MockConnection::new("replica:5432"));
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            INVALID_INDEXES,
        )
        .unwrap();

        let objects = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap();
        assert_eq!(names(&objects), vec!["t.t_idx"]);
        assert_eq!(primary.calls(), 1);
        assert_eq!(replica.calls(), 0);
    }

    #[tokio::test]
    async fn test_on_primary_is_idempotent() {
        let primary = Arc::new(MockConnection::new("primary:5432").with_rows(vec![
            index_row("b", "b_idx", 1),
            index_row("a", "a_idx", 1),
        ]));
        let check =
            ClusterCheck::new(topology(&primary, &[]), &StandardQueries, INVALID_INDEXES).unwrap();
        let ctx = PgContext::default();

        let first = check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        let second = check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        assert_eq!(names(&first), names(&second));
    }

    #[tokio::test]
    async fn test_union_across_hosts() {
        let a = Arc::new(MockConnection::new("a:5432").with_rows(vec![
            missing_index_row("orders", 100),
            missing_index_row("clients", 50),
        ]));
        let b = Arc::new(MockConnection::new("b:5432").with_rows(vec![
            missing_index_row("clients", 70),
            missing_index_row("payments", 10),
        ]));

        for topology in [topology(&a, &[&b]), topology(&b, &[&a])] {
            let check =
                ClusterCheck::new(topology, &StandardQueries, TABLES_WITH_MISSING_INDEXES).unwrap();
            let objects = check
                .check(&PgContext::default(), &ExclusionPredicate::none())
                .await
                .unwrap();
            assert_eq!(names(&objects), vec!["clients", "orders", "payments"]);
        }
    }

    #[tokio::test]
    async fn test_intersection_across_hosts() {
        let a = Arc::new(MockConnection::new("a:5432").with_rows(vec![
            unused_index_row("t", "a_idx", 0),
            unused_index_row("t", "b_idx", 0),
            unused_index_row("t", "c_idx", 0),
        ]));
        let b = Arc::new(MockConnection::new("b:5432").with_rows(vec![
            unused_index_row("t", "b_idx", 0),
            unused_index_row("t", "c_idx", 1),
        ]));
        let c = Arc::new(MockConnection::new("c:5432").with_rows(vec![
            unused_index_row("t", "b_idx", 0),
            unused_index_row("t", "c_idx", 0),
            unused_index_row("t", "d_idx", 0),
        ]));
        let check =
            ClusterCheck::new(topology(&a, &[&b, &c]), &StandardQueries, UNUSED_INDEXES).unwrap();

        let objects = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap();
        assert_eq!(names(&objects), vec!["t.b_idx", "t.c_idx"]);
        assert_eq!(a.calls() + b.calls() + c.calls(), 3);
    }

    #[tokio::test]
    async fn test_one_failing_host_fails_the_whole_check() {
        let primary = Arc::new(
            MockConnection::new("primary:5432").with_rows(vec![unused_index_row("t", "i", 0)]),
        );
        let replica = Arc::new(MockConnection::new("replica:5432").failing("too many clients"));
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            UNUSED_INDEXES,
        )
        .unwrap();

        let error = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            CheckError::QueryExecutionFailed { ref host, .. } if host == "replica:5432"
        ));
    }

    #[tokio::test]
    async fn test_one_slow_host_times_out_the_whole_check() {
        let primary = Arc::new(MockConnection::new("primary:5432"));
        let replica =
            Arc::new(MockConnection::new("replica:5432").with_delay(Duration::from_secs(5)));
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            TABLES_WITH_MISSING_INDEXES,
        )
        .unwrap();
        let ctx = PgContext::default().with_query_timeout(Duration::from_millis(20));

        let error = check
            .check(&ctx, &ExclusionPredicate::none())
            .await
            .unwrap_err();
        assert!(matches!(error, CheckError::QueryTimeout { ref host, .. } if host == "replica:5432"));
    }

    #[tokio::test]
    async fn test_empty_hosts_give_empty_result() {
        let primary = Arc::new(MockConnection::new("primary:5432"));
        let replica = Arc::new(MockConnection::new("replica:5432"));
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            UNUSED_INDEXES,
        )
        .unwrap();

        let objects = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn test_statistics_failures_do_not_affect_results() {
        let primary = Arc::new(
            MockConnection::new("primary:5432")
                .with_stats_reset("2024-01-01T00:00:00+00:00")
                .with_rows(vec![unused_index_row("t", "i", 0)]),
        );
        let replica = Arc::new(
            MockConnection::new("replica:5432")
                .failing_stats()
                .with_rows(vec![unused_index_row("t", "i", 0)]),
        );
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            UNUSED_INDEXES,
        )
        .unwrap();

        let objects = check
            .check(&PgContext::default(), &ExclusionPredicate::none())
            .await
            .unwrap();
        assert_eq!(names(&objects), vec!["t.i"]);
        assert_eq!(
            check
                .last_known_stats_reset(&PgHost::new("primary:5432"))
                .map(|timestamp| timestamp.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(
            check.last_known_stats_reset(&PgHost::new("replica:5432")),
            None
        );
    }

    #[tokio::test]
    async fn test_failed_statistics_read_forgets_previous_reset() {
        let primary = Arc::new(MockConnection::new("primary:5432"));
        let replica =
            Arc::new(MockConnection::new("replica:5432").with_stats_reset("2024-03-01T12:00:00Z"));
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            UNUSED_INDEXES,
        )
        .unwrap();
        let ctx = PgContext::default();
        let replica_host = PgHost::new("replica:5432");

        check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        assert!(check.last_known_stats_reset(&replica_host).is_some());

        replica.set_stats_failing(true);
        check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        assert_eq!(check.last_known_stats_reset(&replica_host), None);
        assert!(!check.last_stats_resets.contains_key(&replica_host));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checks_share_one_host_check_per_host() {
        let primary = Arc::new(
            MockConnection::new("primary:5432")
                .with_rows(vec![unused_index_row("t", "i", 0)])
                .with_delay(Duration::from_millis(5)),
        );
        let first = Arc::new(
            MockConnection::new("replica-1:5432")
                .with_rows(vec![unused_index_row("t", "i", 0)])
                .with_delay(Duration::from_millis(5)),
        );
        let second = Arc::new(
            MockConnection::new("replica-2:5432")
                .with_rows(vec![unused_index_row("t", "i", 0)])
                .with_delay(Duration::from_millis(5)),
        );
        let check = Arc::new(
            ClusterCheck::new(
                topology(&primary, &[&first, &second]),
                &StandardQueries,
                UNUSED_INDEXES,
            )
            .unwrap(),
        );
        let connection: Arc<dyn PgConnection> = second.clone();
        let before = check.host_check(&connection);

        let runs = (0..32).map(|_| {
            let check = check.clone();
            tokio::spawn(async move {
                check
                    .check(&PgContext::default(), &ExclusionPredicate::none())
                    .await
            })
        });
        for run in join_all(runs).await {
            assert_eq!(names(&run.unwrap().unwrap()), vec!["t.i"]);
        }

        assert_eq!(check.host_checks.len(), 3);
        assert_eq!(check.statistics.len(), 3);
        assert!(Arc::ptr_eq(&before, &check.host_check(&connection)));
        assert_eq!(primary.calls() + first.calls() + second.calls(), 96);
    }

    #[tokio::test]
    async fn test_one_host_check_per_host() {
        let primary = Arc::new(MockConnection::new("primary:5432"));
        let replica = Arc::new(MockConnection::new("replica:5432"));
        let check = ClusterCheck::new(
            topology(&primary, &[&replica]),
            &StandardQueries,
            UNUSED_INDEXES,
        )
        .unwrap();
        assert_eq!(check.host_checks.len(), 1);

        let ctx = PgContext::default();
        for _ in 0..3 {
            check.check(&ctx, &ExclusionPredicate::none()).await.unwrap();
        }
        assert_eq!(check.host_checks.len(), 2);
        assert_eq!(check.statistics.len(), 2);

        let connection: Arc<dyn PgConnection> = replica.clone();
        assert!(Arc::ptr_eq(
            &check.host_check(&connection),
            &check.host_check(&connection)
        ));
        assert_eq!(replica.calls(), 3);
    }
}
