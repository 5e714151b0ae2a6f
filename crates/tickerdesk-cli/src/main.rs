mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    let session = commands::build_dashboard(&cli)?;

    if let Command::Watch(args) = &cli.command {
        return commands::watch::run(args, &cli, &session).await;
    }

    let outcome = commands::run(&cli, &session).await?;
    output::render(&outcome.envelope, cli.format, cli.pretty)?;
    Ok(ExitCode::from(outcome.exit_code()))
}
