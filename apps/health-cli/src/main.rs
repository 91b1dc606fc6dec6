#[macro_use]
mod cli;

use std::process::ExitCode;

use clap::Parser;
use cli::display::{Message, MessageType};
use cli::logger::LoggerLevel;

// Entry point for the CLI application
fn main() -> ExitCode {
    let cli_result = cli::Cli::parse();

    let mut settings = match cli::settings::read_settings(cli_result.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            show_message!(
                MessageType::Error,
                Message {
                    action: "Config".to_string(),
                    details: format!("Failed to read settings: {e}"),
                }
            );
            return ExitCode::from(1);
        }
    };
    if cli_result.debug {
        settings.logger.level = LoggerLevel::Debug;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to create Tokio runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        if let Err(e) = cli::logger::setup_logging(&settings.logger) {
            eprintln!("{e:?}");
        }
        cli::top_command_handler(settings, &cli_result.command).await
    });

    match result {
        Ok(s) => {
            // --json output is already printed
            if !s.is_silent() {
                s.show();
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            show_message!(e.message_type, e.message);
            if let Some(err) = e.error {
                eprintln!("{err:?}");
            }
            ExitCode::from(1)
        }
    }
}
