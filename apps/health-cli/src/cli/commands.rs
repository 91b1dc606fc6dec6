//! # CLI Commands
//! A module for all the commands that can be run from the CLI

use std::time::Duration;

use clap::{Args, Subcommand};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lists every diagnostic the engine can run
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Runs diagnostics against a PostgreSQL cluster and reports the findings
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Diagnostics to run, e.g. unused_indexes. All of them when omitted
    pub diagnostics: Vec<String>,

    /// Schema to inspect (default: public)
    #[arg(long)]
    pub schema: Option<String>,

    /// Connection url of the primary host
    #[arg(long, value_name = "URL")]
    pub primary_url: Option<String>,

    /// Connection url of a replica. Repeat for every replica
    #[arg(long = "replica-url", value_name = "URL")]
    pub replica_urls: Vec<String>,

    /// Ask every host whether it is in recovery instead of trusting --primary-url
    #[arg(long)]
    pub discover_primary: bool,

    /// Table whose findings are not reported. Repeatable
    #[arg(long = "exclude-table", value_name = "TABLE")]
    pub exclude_tables: Vec<String>,

    /// Index whose findings are not reported. Repeatable
    #[arg(long = "exclude-index", value_name = "INDEX")]
    pub exclude_indexes: Vec<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print `create index` migrations for foreign keys without an index
    #[arg(long, conflicts_with = "json")]
    pub generate_migrations: bool,

    /// Deadline for each host query, e.g. 30s or 2m
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,
}
