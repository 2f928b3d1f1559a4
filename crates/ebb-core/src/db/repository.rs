//! Todo repository implementation

use chrono::{DateTime, Utc};
use libsql::{Connection, Row, Value};

use crate::error::{Error, Result};
use crate::models::{ConflictField, ConflictRecord, Todo, TodoId};
use crate::util::from_millis;

const TODO_COLUMNS: &str = "id, title, completed, deleted, created_at, updated_at";

/// Trait for record store operations (async)
#[allow(async_fn_in_trait)]
pub trait TodoRepository {
    /// Get a todo by ID, tombstones included
    async fn get(&self, id: TodoId) -> Result<Option<Todo>>;

    /// List todos newest first; tombstones only when `include_deleted`
    async fn list(&self, include_deleted: bool) -> Result<Vec<Todo>>;

    /// Insert or overwrite a single todo
    async fn upsert(&self, todo: &Todo) -> Result<()>;

    /// Physically remove a todo row
    async fn remove(&self, id: TodoId) -> Result<()>;

    /// Replace the whole snapshot in one transaction
    async fn replace_all(&self, todos: &[Todo]) -> Result<()>;

    /// Append an entry to the conflict log
    async fn record_conflict(&self, conflict: &ConflictRecord) -> Result<i64>;

    /// List logged conflicts, most recent first
    async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>>;
}

/// libSQL implementation of `TodoRepository`
pub struct LibSqlTodoRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlTodoRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn insert_row(&self, todo: &Todo) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO todos (id, title, completed, deleted, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
                libsql::params![
                    todo.id.get(),
                    todo.title.as_str(),
                    i32::from(todo.completed),
                    i32::from(todo.deleted),
                    todo.created_at.timestamp_millis(),
                    optional_millis(todo.updated_at)
                ],
            )
            .await?;
        Ok(())
    }

    async fn replace_rows(&self, todos: &[Todo]) -> Result<()> {
        self.conn.execute("DELETE FROM todos", ()).await?;
        for todo in todos {
            self.insert_row(todo).await?;
        }
        Ok(())
    }

    /// Parse a todo from a database row
    fn parse_todo(row: &Row) -> Result<Todo> {
        Ok(Todo {
            id: TodoId::new(row.get::<i64>(0)?),
            title: row.get(1)?,
            completed: row.get::<i32>(2)? != 0,
            deleted: row.get::<i32>(3)? != 0,
            created_at: from_millis(row.get::<i64>(4)?),
            updated_at: match row.get_value(5)? {
                Value::Integer(timestamp_ms) => Some(from_millis(timestamp_ms)),
                _ => None,
            },
        })
    }

    fn parse_conflict(row: &Row) -> Result<ConflictRecord> {
        let strategy: String = row.get(2)?;
        let fields: String = row.get(3)?;
        Ok(ConflictRecord {
            id: row.get(0)?,
            todo_id: TodoId::new(row.get::<i64>(1)?),
            strategy: strategy.parse().map_err(Error::Database)?,
            fields: fields
                .split(',')
                .filter(|field| !field.trim().is_empty())
                .map(str::parse::<ConflictField>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(Error::Database)?,
            server_modified_at: from_millis(row.get::<i64>(4)?),
            client_modified_at: from_millis(row.get::<i64>(5)?),
            resolved_at: from_millis(row.get::<i64>(6)?),
        })
    }
}

fn optional_millis(value: Option<DateTime<Utc>>) -> Value {
    value.map_or(Value::Null, |timestamp| {
        Value::Integer(timestamp.timestamp_millis())
    })
}

impl TodoRepository for LibSqlTodoRepository<'_> {
    async fn get(&self, id: TodoId) -> Result<Option<Todo>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?"),
                libsql::params![id.get()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_todo(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, include_deleted: bool) -> Result<Vec<Todo>> {
        let filter = if include_deleted {
            ""
        } else {
            "WHERE deleted = 0"
        };
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {TODO_COLUMNS} FROM todos {filter} ORDER BY created_at DESC, id DESC"),
                (),
            )
            .await?;

        let mut todos = Vec::new();
        while let Some(row) = rows.next().await? {
            todos.push(Self::parse_todo(&row)?);
        }
        Ok(todos)
    }

    async fn upsert(&self, todo: &Todo) -> Result<()> {
        self.insert_row(todo).await
    }

    async fn remove(&self, id: TodoId) -> Result<()> {
        self.conn
            .execute("DELETE FROM todos WHERE id = ?", libsql::params![id.get()])
            .await?;
        Ok(())
    }

    async fn replace_all(&self, todos: &[Todo]) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        if let Err(e) = self.replace_rows(todos).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(())
    }

    async fn record_conflict(&self, conflict: &ConflictRecord) -> Result<i64> {
        let fields = conflict
            .fields
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(",");

        self.conn
            .execute(
                "INSERT INTO sync_conflicts (
                    todo_id, strategy, fields, server_modified_at, client_modified_at, resolved_at
                 ) VALUES (?, ?, ?, ?, ?, ?)",
                libsql::params![
                    conflict.todo_id.get(),
                    conflict.strategy.as_str(),
                    fields,
                    conflict.server_modified_at.timestamp_millis(),
                    conflict.client_modified_at.timestamp_millis(),
                    conflict.resolved_at.timestamp_millis()
                ],
            )
            .await?;

        Ok(self.conn.last_insert_rowid())
    }

    async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = self
            .conn
            .query(
                "SELECT id, todo_id, strategy, fields, server_modified_at, client_modified_at, resolved_at
                 FROM sync_conflicts
                 ORDER BY resolved_at DESC, id DESC
                 LIMIT ?",
                libsql::params![limit],
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(Self::parse_conflict(&row)?);
        }
        Ok(conflicts)
    }
}
