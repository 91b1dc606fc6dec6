//! Entry point of the engine: every registered diagnostic wired against one cluster.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::infrastructure::postgres::queries::QueryProvider;
use crate::infrastructure::postgres::topology::ClusterTopology;

use super::check_on_cluster::ClusterCheck;
use super::context::PgContext;
use super::diagnostic::Diagnostic;
use super::errors::{CheckError, ConfigError};
use super::health_report::{DiagnosticResult, HealthReport, REPORT_KEY_PREFIX};
use super::model::DbObject;
use super::predicates::ExclusionPredicate;
use super::registry;

#[derive(Debug)]
pub struct DatabaseChecks {
    checks: Vec<ClusterCheck>,
}

impl DatabaseChecks {
    /// Wires the whole catalog. Fails on the first misconfigured diagnostic.
    pub fn new(
        topology: Arc<dyn ClusterTopology>,
        queries: &dyn QueryProvider,
    ) -> Result<Self, ConfigError> {
        Self::with_diagnostics(topology, queries, registry::all())
    }

    pub fn with_diagnostics(
        topology: Arc<dyn ClusterTopology>,
        queries: &dyn QueryProvider,
        diagnostics: &[Diagnostic],
    ) -> Result<Self, ConfigError> {
        let checks = diagnostics
            .iter()
            .map(|diagnostic| ClusterCheck::new(topology.clone(), queries, *diagnostic))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { checks })
    }

    pub fn list_diagnostics(&self) -> Vec<Diagnostic> {
        self.checks.iter().map(ClusterCheck::diagnostic).collect()
    }

    /// Runs `diagnostic` on the `public` schema without exclusions.
    pub async fn check(&self, diagnostic: &Diagnostic) -> Result<Vec<DbObject>, CheckError> {
        self.check_with_context(diagnostic, &PgContext::default()).await
    }

    pub async fn check_with_context(
        &self,
        diagnostic: &Diagnostic,
        ctx: &PgContext,
    ) -> Result<Vec<DbObject>, CheckError> {
        self.check_with_exclusions(diagnostic, ctx, &ExclusionPredicate::none())
            .await
    }

    pub async fn check_with_exclusions(
        &self,
        diagnostic: &Diagnostic,
        ctx: &PgContext,
        exclusions: &ExclusionPredicate,
    ) -> Result<Vec<DbObject>, CheckError> {
        self.cluster_check(diagnostic)?.check(ctx, exclusions).await
    }

    /// Runs the named diagnostics, or all of them when `names` is empty, one after
    /// the other. The first failure aborts the report.
    pub async fn check_all<S: AsRef<str>>(
        &self,
        ctx: &PgContext,
        exclusions: &ExclusionPredicate,
        names: &[S],
    ) -> Result<HealthReport, CheckError> {
        let selected = if names.is_empty() {
            self.list_diagnostics()
        } else {
            registry::find_all(names)?
        };

        info!(
            schema = ctx.schema_name(),
            diagnostics = selected.len(),
            "Collecting database health"
        );
        let mut results = Vec::with_capacity(selected.len());
        for diagnostic in selected {
            let findings = self
                .check_with_exclusions(&diagnostic, ctx, exclusions)
                .await?;
            if findings.is_empty() {
                debug!(diagnostic = diagnostic.name(), "No findings");
            } else {
                warn!(
                    diagnostic = diagnostic.name(),
                    findings = findings.len(),
                    "{REPORT_KEY_PREFIX}\t{}\t{}",
                    diagnostic.name(),
                    findings.len()
                );
            }
            results.push(DiagnosticResult::new(diagnostic, findings));
        }
        Ok(HealthReport::new(ctx.schema_name(), results))
    }

    fn cluster_check(&self, diagnostic: &Diagnostic) -> Result<&ClusterCheck, ConfigError> {
        self.checks
            .iter()
            .find(|check| check.diagnostic() == *diagnostic)
            .ok_or_else(|| ConfigError::UnknownDiagnostic {
                names: diagnostic.name().to_string(),
                available: self
                    .checks
                    .iter()
                    .map(|check| check.diagnostic().name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
