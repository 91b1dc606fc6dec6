#[macro_use]
pub(crate) mod display;

pub mod commands;
pub mod logger;
pub mod routines;
pub mod settings;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use pg_health::utilities::constants::{CLI_NAME, CLI_VERSION};

use commands::Commands;
use routines::{RoutineFailure, RoutineSuccess};
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = CLI_NAME, version = CLI_VERSION, author, about, long_about = None, arg_required_else_help(true), next_display_order = None)]
pub struct Cli {
    /// Turn debugging information on
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Config file to read instead of ~/.pg-health/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

pub async fn top_command_handler(
    settings: Settings,
    commands: &Commands,
) -> Result<RoutineSuccess, RoutineFailure> {
    info!("{} version: {}", CLI_NAME, CLI_VERSION);
    match commands {
        Commands::List { json } => routines::list::list_diagnostics(*json),
        Commands::Check(args) => routines::check::run_check(settings, args).await,
    }
}
