mod cli;
mod commands;
mod completions;
mod config;
mod error;
mod output;
mod render;
mod setup;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use docchat_storage::paths;
use render::CliRenderer;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to a file so they never interleave with streamed answers.
    let _guard = match init_logging(cli.verbose) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: file logging disabled: {err:#}");
            None
        }
    };

    let config = config::CliConfig::load();

    match run(cli, config).await {
        Ok(code) => code,
        Err(err) => error::handle_error(err),
    }
}

fn init_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = paths::log_dir()?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "docchat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    Ok(guard)
}

async fn run(cli: Cli, config: config::CliConfig) -> Result<ExitCode> {
    let Cli {
        command,
        server,
        format,
        ..
    } = cli;
    let server = server.as_deref();

    match command.unwrap_or(Commands::Chat) {
        Commands::Completions { shell } => {
            completions::generate_completions(shell);
        }
        Commands::Session { command } => {
            let session = setup::load_session();
            commands::session::run(&session, command, format)?;
        }
        Commands::Ask { question } => {
            let (client, renderer) =
                setup::connect(server, &config, CliRenderer::for_format(format, true))?;
            return commands::ask::run(&client, &renderer, &question, format).await;
        }
        Commands::Docs { command } => {
            let (client, _renderer) =
                setup::connect(server, &config, CliRenderer::for_format(format, false))?;
            commands::documents::run(&client, command, format).await?;
        }
        Commands::Chat => {
            let (client, renderer) =
                setup::connect(server, &config, CliRenderer::for_format(format, false))?;
            commands::chat::run(&client, &renderer, format).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
