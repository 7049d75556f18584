use std::io;
use std::process::ExitCode;

use clap::Parser;
use kvtar_engine::EngineError;
use tracing::Level;

mod cli;
mod commands;
mod prompt;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_logging(&cli);
    match commands::run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<EngineError>() {
                Some(e) if e.is_aborted() => tracing::error!("Aborted."),
                _ => tracing::error!("{:#}", err),
            }
            ExitCode::from(commands::exit_code(&err))
        }
    }
}

fn init_logging(cli: &cli::Cli) {
    let level = if cli.debug {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}
