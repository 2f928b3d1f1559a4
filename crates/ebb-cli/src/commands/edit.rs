use ebb_core::remote::RemoteStore;

use crate::commands::common::{format_write_outcome, normalize_title, parse_todo_id, Engine};
use crate::error::CliError;

pub async fn run_edit<R: RemoteStore>(
    engine: &Engine<R>,
    id: &str,
    title_parts: &[String],
) -> Result<(), CliError> {
    let id = parse_todo_id(id)?;
    let title = normalize_title(title_parts)?;
    let outcome = engine.writer().update_title(id, &title).await?;

    println!("{}", format_write_outcome(&outcome));
    Ok(())
}

pub async fn run_toggle<R: RemoteStore>(engine: &Engine<R>, id: &str) -> Result<(), CliError> {
    let id = parse_todo_id(id)?;
    let outcome = engine.writer().toggle_completed(id).await?;

    println!("{}", format_write_outcome(&outcome));
    Ok(())
}

pub async fn run_done<R: RemoteStore>(engine: &Engine<R>, id: &str) -> Result<(), CliError> {
    let id = parse_todo_id(id)?;
    let outcome = engine.writer().set_completed(id, true).await?;

    println!("{}", format_write_outcome(&outcome));
    Ok(())
}
