//! Ebb CLI - offline-first todos from the terminal
//!
//! Every write lands locally first and syncs when the remote API is reachable.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::common::{load_settings, open_engine, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::conflicts::{run_conflicts, run_resolve};
use crate::commands::delete::run_delete;
use crate::commands::edit::{run_done, run_edit, run_toggle};
use crate::commands::list::run_list;
use crate::commands::sync::{run_status, run_sync, run_watch};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::from_default_env();
    let filter = match "ebb=info".parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let settings = load_settings(cli.api_url.as_deref())?;
    let db_path = resolve_db_path(cli.db_path);
    let engine = open_engine(&db_path, &settings, cli.offline).await?;

    match cli.command {
        Commands::Add { title } => run_add(&engine, &title).await?,
        Commands::List { all, json } => run_list(&engine, all, json).await?,
        Commands::Edit { id, title } => run_edit(&engine, &id, &title).await?,
        Commands::Toggle { id } => run_toggle(&engine, &id).await?,
        Commands::Done { id } => run_done(&engine, &id).await?,
        Commands::Delete { id } => run_delete(&engine, &id).await?,
        Commands::Sync => run_sync(&engine).await?,
        Commands::Status => run_status(&engine, &settings.api_base_url).await?,
        Commands::Conflicts { limit, json } => run_conflicts(&engine, limit, json).await?,
        Commands::Resolve { action_id, choice } => {
            run_resolve(&engine, &action_id, choice).await?;
        }
        Commands::Watch => {
            let shutdown = async {
                let _ = tokio::signal::ctrl_c().await;
            };
            run_watch(&engine, &settings, shutdown).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
