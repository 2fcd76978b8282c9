//! MoveFlow command-line interface.

mod cli;
mod commands;
mod config;
mod context;
mod error;
mod output;

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigAction};
use config::{default_config_path, CliConfig};
use error::CliResult;
use output::OutputFormat;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout carries the MCP transport, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> CliResult<String> {
    let format: OutputFormat = cli.format.into();
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = CliConfig::load(&config_path)?;
    cli.apply_overrides(&mut config);

    match &cli.command {
        Commands::McpServer => {
            let aptos = context::aptos_config(&config, cli.private_key.clone())?;
            commands::mcp_server(aptos).await
        }
        Commands::QueryStreams { address } => {
            let ops = context::operations(&config, cli.private_key.clone())?;
            commands::query_streams(&ops, address, format).await
        }
        Commands::Balance { address, token } => {
            let ops = context::operations(&config, cli.private_key.clone())?;
            commands::balance(&ops, address.as_deref(), token.as_deref(), format).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(&config, format),
            ConfigAction::Init { force } => commands::config_init(&config_path, *force),
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let mut buf = Vec::new();
            clap_complete::generate(
                clap_complete::Shell::from(*shell),
                &mut cmd,
                "moveflow",
                &mut buf,
            );
            Ok(String::from_utf8_lossy(&buf).into_owned())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} [{}] {}", "error:".red().bold(), e.error_code(), e);
            ExitCode::from(e.exit_code().clamp(1, 255) as u8)
        }
    }
}
