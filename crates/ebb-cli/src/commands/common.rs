use std::env;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ebb_core::config::SyncSettings;
use ebb_core::remote::{HttpRemoteStore, RemoteStore};
use ebb_core::services::DatabaseService;
use ebb_core::sync::{Connectivity, HeldConflict, SyncEngine, SyncReport, WriteOutcome};
use ebb_core::{ConflictRecord, Todo, TodoId};
use serde::Serialize;

use crate::error::CliError;

/// Engine wired to the local database and the HTTP remote store.
pub type CliEngine = SyncEngine<DatabaseService, HttpRemoteStore>;

/// Engine type every command runs against, generic over the remote.
pub type Engine<R> = SyncEngine<DatabaseService, R>;

#[derive(Debug, Serialize)]
pub struct TodoListItem {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub relative_time: String,
}

pub fn load_settings(api_url: Option<&str>) -> Result<SyncSettings, CliError> {
    let settings = SyncSettings::from_env()?;
    match api_url {
        Some(url) => Ok(settings.with_api_base_url(url)?),
        None => Ok(settings),
    }
}

/// Open the local store and decide connectivity with one probe (skipped when `offline`).
pub async fn open_engine(
    db_path: &Path,
    settings: &SyncSettings,
    offline: bool,
) -> Result<CliEngine, CliError> {
    let local = DatabaseService::open_path(db_path).await?;
    let remote = HttpRemoteStore::new(&settings.api_base_url, settings.request_timeout)?;

    let online = if offline {
        false
    } else {
        match remote.probe().await {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!("Remote store unreachable, working offline: {error}");
                false
            }
        }
    };

    Ok(SyncEngine::new(local, remote, Connectivity::new(online)))
}

pub fn normalize_title(parts: &[String]) -> Result<String, CliError> {
    let title = parts.join(" ");
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn parse_todo_id(id: &str) -> Result<TodoId, CliError> {
    id.parse::<TodoId>()
        .map_err(|_| CliError::InvalidTodoId(id.trim().to_string()))
}

pub fn format_write_outcome(outcome: &WriteOutcome) -> String {
    match outcome {
        WriteOutcome::Synced(todo) => todo.id.to_string(),
        WriteOutcome::Queued(todo) => format!("{}  (queued)", todo.id),
    }
}

pub fn format_todo_lines(todos: &[Todo]) -> Vec<String> {
    let now = Utc::now();
    todos
        .iter()
        .map(|todo| {
            let id = todo.id.to_string();
            let mark = if todo.completed { "x" } else { " " };
            let relative_time = format_relative_time(todo.last_modified(), now);
            let line = format!("{id:<13}  [{mark}] {:<40}  {relative_time}", todo.title);
            if todo.deleted {
                format!("{line}  (deleted)")
            } else {
                line
            }
        })
        .collect()
}

pub fn todo_to_list_item(todo: &Todo) -> TodoListItem {
    TodoListItem {
        id: todo.id.get(),
        title: todo.title.clone(),
        completed: todo.completed,
        deleted: todo.deleted,
        created_at: todo.created_at.timestamp_millis(),
        updated_at: todo.updated_at.map(|updated_at| updated_at.timestamp_millis()),
        relative_time: format_relative_time(todo.last_modified(), Utc::now()),
    }
}

pub fn format_report(report: &SyncReport) -> String {
    format!(
        "Sync finished: {} synced, {} failed, {} conflicted, {} voided",
        report.succeeded, report.failed, report.conflicted, report.voided
    )
}

pub fn format_held_conflict_lines(conflicts: &[HeldConflict]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let details = &conflict.details;
            let fields = details
                .conflict_fields
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "{}  todo={}  fields={fields}  server={}  local={}",
                conflict.action.id,
                details.client_version.id,
                describe_version(&details.server_version),
                describe_version(&details.client_version)
            )
        })
        .collect()
}

pub fn format_conflict_record_lines(conflicts: &[ConflictRecord]) -> Vec<String> {
    conflicts
        .iter()
        .map(|conflict| {
            let fields = conflict
                .fields
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            format!(
                "{}  {:<11}  todo={}  fields={fields}",
                format_sync_timestamp(conflict.resolved_at),
                conflict.strategy.as_str(),
                conflict.todo_id
            )
        })
        .collect()
}

fn describe_version(todo: &Todo) -> String {
    let mut flags = Vec::new();
    if todo.completed {
        flags.push("completed");
    }
    if todo.deleted {
        flags.push("deleted");
    }
    if flags.is_empty() {
        format!("{:?}", todo.title)
    } else {
        format!("{:?} ({})", todo.title, flags.join(", "))
    }
}

pub fn format_sync_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = (now - timestamp).num_milliseconds().max(0);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("EBB_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ebb")
        .join("ebb.db")
}

/// Pull the remote snapshot, tolerating an unreachable remote.
pub async fn refresh_quietly<R: RemoteStore>(engine: &Engine<R>) -> Result<(), CliError> {
    match engine.refresh().await {
        Ok(()) => Ok(()),
        Err(error) if error.is_remote_unavailable() => {
            tracing::warn!("Could not refresh from the remote store: {error}");
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}
