use ebb_core::remote::RemoteStore;

use crate::commands::common::{format_write_outcome, normalize_title, Engine};
use crate::error::CliError;

pub async fn run_add<R: RemoteStore>(
    engine: &Engine<R>,
    title_parts: &[String],
) -> Result<(), CliError> {
    let title = normalize_title(title_parts)?;
    let outcome = engine.writer().create_todo(&title).await?;

    println!("{}", format_write_outcome(&outcome));
    Ok(())
}
