//! Settings are read from `~/.pg-health/config.toml` (or `--config`), then overridden by
//! `PG_HEALTH_*` environment variables, then by command line flags.
//!
//! ```toml
//! [postgres]
//! primary_url = "postgres://app@db-primary:5432/app"
//! replica_urls = ["postgres://app@db-replica:5432/app"]
//! query_timeout_secs = 30
//!
//! [check]
//! schema = "public"
//!
//! [exclusions]
//! index_names = ["orders_legacy_idx"]
//!
//! [generator]
//! concurrently = true
//! idx_position = "suffix"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use pg_health::framework::core::context::{
    PgContext, DEFAULT_BLOAT_PERCENTAGE_THRESHOLD, DEFAULT_REMAINING_PERCENTAGE_THRESHOLD,
    DEFAULT_SCHEMA_NAME,
};
use pg_health::framework::core::errors::CheckError;
use pg_health::framework::core::exclusions::ExclusionsConfig;
use pg_health::framework::core::generator::GeneratingOptions;
use pg_health::infrastructure::postgres::config::PostgresConfig;
use pg_health::utilities::constants::{
    CLI_CONFIG_FILE, CLI_USER_DIRECTORY, ENV_PREFIX, ENV_SEPARATOR,
};

use super::logger::LoggerSettings;

const LIST_KEYS: [&str; 4] = [
    "postgres.replica_urls",
    "exclusions.table_names",
    "exclusions.index_names",
    "exclusions.sequence_names",
];

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub logger: LoggerSettings,
    #[serde(default)]
    pub postgres: PostgresConfig,
    #[serde(default)]
    pub check: CheckSettings,
    #[serde(default)]
    pub exclusions: ExclusionsConfig,
    #[serde(default)]
    pub generator: GeneratingOptions,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CheckSettings {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_bloat_percentage_threshold")]
    pub bloat_percentage_threshold: f64,
    #[serde(default = "default_remaining_percentage_threshold")]
    pub remaining_percentage_threshold: f64,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA_NAME.to_string()
}

fn default_bloat_percentage_threshold() -> f64 {
    DEFAULT_BLOAT_PERCENTAGE_THRESHOLD
}

fn default_remaining_percentage_threshold() -> f64 {
    DEFAULT_REMAINING_PERCENTAGE_THRESHOLD
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            bloat_percentage_threshold: default_bloat_percentage_threshold(),
            remaining_percentage_threshold: default_remaining_percentage_threshold(),
        }
    }
}

impl CheckSettings {
    pub fn to_context(
        &self,
        schema: Option<&str>,
        query_timeout: Option<Duration>,
    ) -> Result<PgContext, CheckError> {
        let ctx = PgContext::of(schema.unwrap_or(&self.schema))?
            .with_bloat_percentage_threshold(self.bloat_percentage_threshold)?
            .with_remaining_percentage_threshold(self.remaining_percentage_threshold)?;
        Ok(match query_timeout {
            Some(timeout) => ctx.with_query_timeout(timeout),
            None => ctx,
        })
    }
}

pub fn user_directory() -> PathBuf {
    home::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CLI_USER_DIRECTORY)
}

pub fn config_file_path() -> PathBuf {
    user_directory().join(CLI_CONFIG_FILE)
}

/// An explicit `config_path` must exist. The default one is optional.
pub fn read_settings(config_path: Option<&Path>) -> Result<Settings, ConfigError> {
    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (config_file_path(), false),
    };

    let environment = LIST_KEYS.iter().fold(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(","),
        |environment, key| environment.with_list_parse_key(key),
    );

    Config::builder()
        .add_source(File::from(path).format(FileFormat::Toml).required(required))
        .add_source(environment)
        .build()?
        .try_deserialize()
}
