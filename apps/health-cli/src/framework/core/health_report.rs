use chrono::{DateTime, Utc};
use serde::Serialize;

use super::diagnostic::Diagnostic;
use super::model::{DbObject, ResultType};

pub const REPORT_KEY_PREFIX: &str = "db_indexes_health";

#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticResult {
    pub diagnostic: &'static str,
    pub result_type: ResultType,
    pub findings: Vec<DbObject>,
}

impl DiagnosticResult {
    pub fn new(diagnostic: Diagnostic, findings: Vec<DbObject>) -> Self {
        Self {
            diagnostic: diagnostic.name(),
            result_type: diagnostic.result_type(),
            findings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticCount {
    pub diagnostic: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_findings: usize,
    pub diagnostics_with_findings: usize,
    pub counts: Vec<DiagnosticCount>,
}

/// Findings of a set of diagnostics run against one schema, in run order.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub schema_name: String,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub results: Vec<DiagnosticResult>,
}

impl HealthReport {
    pub fn new(schema_name: impl Into<String>, results: Vec<DiagnosticResult>) -> Self {
        let counts: Vec<DiagnosticCount> = results
            .iter()
            .map(|result| DiagnosticCount {
                diagnostic: result.diagnostic,
                count: result.findings.len(),
            })
            .collect();
        let summary = ReportSummary {
            total_findings: counts.iter().map(|c| c.count).sum(),
            diagnostics_with_findings: counts.iter().filter(|c| c.count > 0).count(),
            counts,
        };
        Self {
            schema_name: schema_name.into(),
            generated_at: Utc::now(),
            summary,
            results,
        }
    }

    pub fn total_findings(&self) -> usize {
        self.summary.total_findings
    }

    pub fn has_findings(&self) -> bool {
        self.total_findings() > 0
    }

    pub fn result(&self, diagnostic: &str) -> Option<&DiagnosticResult> {
        self.results.iter().find(|r| r.diagnostic == diagnostic)
    }

    /// One `db_indexes_health\t<diagnostic>\t<count>` line per diagnostic, for log scrapers.
    pub fn key_value_lines(&self) -> Vec<String> {
        self.summary
            .counts
            .iter()
            .map(|c| format!("{REPORT_KEY_PREFIX}\t{}\t{}", c.diagnostic, c.count))
            .collect()
    }
}
