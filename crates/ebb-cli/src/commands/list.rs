use ebb_core::remote::RemoteStore;

use crate::commands::common::{format_todo_lines, todo_to_list_item, Engine, TodoListItem};
use crate::error::CliError;

pub async fn run_list<R: RemoteStore>(
    engine: &Engine<R>,
    include_deleted: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let todos = engine.local().list_todos(include_deleted).await?;

    if as_json {
        let json_items = todos
            .iter()
            .map(todo_to_list_item)
            .collect::<Vec<TodoListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if todos.is_empty() {
        println!("No todos yet.");
    } else {
        for line in format_todo_lines(&todos) {
            println!("{line}");
        }
    }

    Ok(())
}
