use ebb_core::services::LocalStore;
use ebb_core::remote::RemoteStore;
use ebb_core::sync::HeldConflict;
use ebb_core::ConflictRecord;
use serde::Serialize;

use crate::cli::ResolveChoice;
use crate::commands::common::{format_conflict_record_lines, format_held_conflict_lines, Engine};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct ConflictsOutput {
    pub held: Vec<HeldConflict>,
    pub resolved: Vec<ConflictRecord>,
}

/// Held conflicts only exist after a drain, so this drains first when online.
pub async fn run_conflicts<R: RemoteStore>(
    engine: &Engine<R>,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    if engine.connectivity().is_online() {
        engine.drain().await?;
    }
    let output = ConflictsOutput {
        held: engine.held_conflicts().await,
        resolved: engine.local().list_conflicts(limit).await?,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if output.held.is_empty() {
        println!("No conflicts waiting on a decision.");
    } else {
        println!("Waiting on a decision:");
        for line in format_held_conflict_lines(&output.held) {
            println!("  {line}");
        }
    }

    if !output.resolved.is_empty() {
        println!("Recently resolved:");
        for line in format_conflict_record_lines(&output.resolved) {
            println!("  {line}");
        }
    }
    Ok(())
}

pub async fn run_resolve<R: RemoteStore>(
    engine: &Engine<R>,
    action_id: &str,
    choice: ResolveChoice,
) -> Result<(), CliError> {
    if !engine.connectivity().is_online() {
        return Err(CliError::Offline);
    }
    engine.drain().await?;

    let todo = engine.resolve_held(action_id.trim(), choice.into()).await?;
    println!("{}", todo.id);
    Ok(())
}
