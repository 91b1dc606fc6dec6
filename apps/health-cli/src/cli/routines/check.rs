use std::sync::Arc;
use std::time::Duration;

use itertools::Itertools;
use tracing::{info, warn};

use pg_health::framework::core::database_checks::DatabaseChecks;
use pg_health::framework::core::errors::CheckError;
use pg_health::framework::core::generator::{generate_migrations, GeneratingOptions};
use pg_health::framework::core::health_report::HealthReport;
use pg_health::framework::core::registry::{self, FOREIGN_KEYS_WITHOUT_INDEX};
use pg_health::infrastructure::postgres::client::redact_password;
use pg_health::infrastructure::postgres::config::PostgresConfig;
use pg_health::infrastructure::postgres::queries::StandardQueries;
use pg_health::infrastructure::postgres::topology::StaticTopology;

use crate::cli::commands::CheckArgs;
use crate::cli::display::{new_table, Message};
use crate::cli::settings::Settings;

use super::{RoutineFailure, RoutineSuccess};

/// Findings listed per diagnostic in the text table before eliding the rest.
const MAX_LISTED_FINDINGS: usize = 5;

fn failure<E: Into<anyhow::Error>>(details: &str, error: E) -> RoutineFailure {
    let error = error.into();
    RoutineFailure::new(
        Message {
            action: "Check".to_string(),
            details: format!("{details}: {error}"),
        },
        error,
    )
}

/// Validates everything the operator supplied before any host is contacted.
pub async fn run_check(
    settings: Settings,
    args: &CheckArgs,
) -> Result<RoutineSuccess, RoutineFailure> {
    let query_timeout = args
        .timeout
        .or(settings.postgres.query_timeout_secs.map(Duration::from_secs));
    let ctx = settings
        .check
        .to_context(args.schema.as_deref(), query_timeout)
        .map_err(|e| failure("Invalid check settings", e))?;
    registry::find_all(&args.diagnostics).map_err(|e| failure("Invalid diagnostics", e))?;
    if args.generate_migrations {
        settings
            .generator
            .validate()
            .map_err(|e| failure("Invalid generator settings", e))?;
    }

    let mut exclusions = settings.exclusions.clone();
    exclusions.table_names.extend(args.exclude_tables.iter().cloned());
    exclusions.index_names.extend(args.exclude_indexes.iter().cloned());
    let predicate = exclusions
        .to_predicate(&ctx)
        .map_err(|e| failure("Invalid exclusions", e))?;

    let generator = settings.generator.clone();
    let postgres = postgres_config(settings.postgres, args);
    info!(
        primary = %redact_password(&postgres.primary_url),
        replicas = postgres.replica_urls.len(),
        "Connecting to the cluster"
    );
    let topology = StaticTopology::connect(&postgres)
        .await
        .map_err(|e| failure("Failed to connect", e))?;
    let checks = DatabaseChecks::new(Arc::new(topology), &StandardQueries)
        .map_err(|e| failure("Misconfigured diagnostics", e))?;

    let report = checks
        .check_all(&ctx, &predicate, &args.diagnostics)
        .await
        .map_err(|e| failure("Health check failed", e))?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| failure("Failed to render the report as JSON", e))?;
        println!("{rendered}");
        return Ok(RoutineSuccess::silent());
    }

    if report.has_findings() {
        println!("{}", render_findings(&report));
    }
    if args.generate_migrations {
        let migrations = migrations_for(&report, &generator)
            .map_err(|e| failure("Cannot generate migrations", e))?;
        if !migrations.is_empty() {
            println!("{}", migrations.join("\n\n"));
        }
    }
    let message = Message {
        action: "Check".to_string(),
        details: format!(
            "{} diagnostics on schema '{}': {} findings",
            report.results.len(),
            report.schema_name,
            report.total_findings()
        ),
    };
    Ok(if report.has_findings() {
        RoutineSuccess::highlight(message)
    } else {
        RoutineSuccess::success(message)
    })
}

fn postgres_config(mut config: PostgresConfig, args: &CheckArgs) -> PostgresConfig {
    if let Some(primary_url) = &args.primary_url {
        config.primary_url = primary_url.clone();
    }
    if !args.replica_urls.is_empty() {
        config.replica_urls = args.replica_urls.clone();
    }
    if args.discover_primary {
        config.discover_primary = true;
    }
    config
}

/// Migrations for the foreign keys without an index found by this run.
fn migrations_for(
    report: &HealthReport,
    options: &GeneratingOptions,
) -> Result<Vec<String>, CheckError> {
    match report.result(FOREIGN_KEYS_WITHOUT_INDEX.name()) {
        Some(result) => generate_migrations(&result.findings, options),
        None => {
            warn!(
                "Migrations are only generated for {}, which was not run",
                FOREIGN_KEYS_WITHOUT_INDEX.name()
            );
            Ok(Vec::new())
        }
    }
}

fn render_findings(report: &HealthReport) -> String {
    let mut table = new_table(["Diagnostic", "Findings", "Objects"]);
    for result in report.results.iter().filter(|r| !r.findings.is_empty()) {
        let mut objects = result
            .findings
            .iter()
            .take(MAX_LISTED_FINDINGS)
            .map(|finding| finding.to_string())
            .join("\n");
        if result.findings.len() > MAX_LISTED_FINDINGS {
            objects.push_str(&format!(
                "\n... and {} more",
                result.findings.len() - MAX_LISTED_FINDINGS
            ));
        }
        table.add_row(vec![
            result.diagnostic.to_string(),
            result.findings.len().to_string(),
            objects,
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pg_health::framework::core::health_report::DiagnosticResult;
    use pg_health::framework::core::model::{Column, DbObject, ForeignKey, Table};
    use pg_health::framework::core::registry::{INVALID_INDEXES, TABLES_WITHOUT_PRIMARY_KEY};

    fn args() -> CheckArgs {
        CheckArgs {
            diagnostics: vec![],
            schema: None,
            primary_url: None,
            replica_urls: vec![],
            discover_primary: false,
            exclude_tables: vec![],
            exclude_indexes: vec![],
            json: false,
            generate_migrations: false,
            timeout: None,
        }
    }

    #[test]
    fn test_flags_override_postgres_settings() {
        let args = CheckArgs {
            primary_url: Some("postgres://flag/app".to_string()),
            replica_urls: vec!["postgres://replica/app".to_string()],
            ..args()
        };
        let config = postgres_config(
            PostgresConfig {
                replica_urls: vec!["postgres://file-replica/app".to_string()],
                ..Default::default()
            },
            &args,
        );
        assert_eq!(config.primary_url, "postgres://flag/app");
        assert_eq!(config.replica_urls, vec!["postgres://replica/app"]);
    }

    #[test]
    fn test_unset_flags_keep_settings() {
        let config = postgres_config(PostgresConfig::default(), &args());
        assert_eq!(config, PostgresConfig::default());
    }

    #[test]
    fn test_findings_table_elides_long_lists() {
        let tables = (0..7)
            .map(|i| {
                DbObject::Table(Table {
                    table_name: format!("t{i}"),
                    table_size_in_bytes: 0,
                })
            })
            .collect();
        let report = HealthReport::new(
            "public",
            vec![
                DiagnosticResult::new(TABLES_WITHOUT_PRIMARY_KEY, tables),
                DiagnosticResult::new(INVALID_INDEXES, vec![]),
            ],
        );
        let rendered = render_findings(&report);
        assert!(rendered.contains("tables_without_primary_key"));
        assert!(rendered.contains("... and 2 more"));
        assert!(!rendered.contains("invalid_indexes"));
    }

    #[test]
    fn test_migrations_cover_foreign_keys_without_index() {
        let foreign_key = DbObject::ForeignKey(ForeignKey {
            table_name: "orders".to_string(),
            constraint_name: "orders_client_id_fkey".to_string(),
            columns: vec![Column {
                table_name: "orders".to_string(),
                column_name: "client_id".to_string(),
                not_null: false,
            }],
        });
        let report = HealthReport::new(
            "public",
            vec![DiagnosticResult::new(FOREIGN_KEYS_WITHOUT_INDEX, vec![foreign_key])],
        );
        let migrations = migrations_for(&report, &GeneratingOptions::default()).unwrap();
        assert_eq!(
            migrations,
            vec![
                "create index concurrently if not exists orders_client_id_without_nulls_idx\n    \
                 on orders (client_id) where client_id is not null;"
            ]
        );

        let other = HealthReport::new(
            "public",
            vec![DiagnosticResult::new(INVALID_INDEXES, vec![])],
        );
        assert!(migrations_for(&other, &GeneratingOptions::default())
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_bad_generator_settings_fail_before_connecting() {
        let mut settings = Settings::default();
        settings.generator.indentation = 12;
        let args = CheckArgs {
            generate_migrations: true,
            primary_url: Some("not a url".to_string()),
            ..args()
        };
        let failure = run_check(settings, &args).await.unwrap_err();
        assert!(failure.message.details.contains("Invalid generator settings"));
    }

    #[tokio::test]
    async fn test_bad_schema_fails_before_connecting() {
        let args = CheckArgs {
            schema: Some("bad;schema".to_string()),
            primary_url: Some("not a url".to_string()),
            ..args()
        };
        let failure = run_check(Settings::default(), &args).await.unwrap_err();
        assert!(failure.message.details.contains("Invalid schema name"));
    }
}
