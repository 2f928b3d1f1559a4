use ebb_core::remote::RemoteStore;

use crate::commands::common::{format_write_outcome, parse_todo_id, Engine};
use crate::error::CliError;

pub async fn run_delete<R: RemoteStore>(engine: &Engine<R>, id: &str) -> Result<(), CliError> {
    let id = parse_todo_id(id)?;
    let outcome = engine.writer().delete_todo(id).await?;

    println!("{}", format_write_outcome(&outcome));
    Ok(())
}
