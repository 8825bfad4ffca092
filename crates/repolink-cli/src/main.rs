//! repolink CLI
//!
//! Mirrors documents from the git repositories under a project root into a
//! workspace directory as symlinks.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::Context;
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let Some(command) = cli.command.clone() else {
        println!("{} Repository document linker", "repolink".green().bold());
        println!();
        println!("Run {} for available commands.", "repolink --help".cyan());
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        commands::run_completions(shell);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(async {
        let ctx = Context::resolve(&cli)?;
        execute_command(&ctx, command).await
    })
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CliError::user(format!("failed to set tracing subscriber: {e}")))?;
    tracing::debug!("verbose mode enabled");
    Ok(())
}

async fn execute_command(ctx: &Context, command: Commands) -> Result<()> {
    match command {
        Commands::Index { json } => commands::run_index(ctx, json),
        Commands::Reconcile { json } => commands::run_reconcile(ctx, json).await,
        Commands::Start { json } => commands::run_start(ctx, json).await,
        Commands::Status { json } => commands::run_status(ctx, json),
        Commands::Policy { action } => commands::run_policy(ctx, action).await,
        Commands::Completions { shell } => {
            commands::run_completions(shell);
            Ok(())
        }
    }
}
