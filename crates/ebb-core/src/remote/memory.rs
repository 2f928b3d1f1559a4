//! In-process todo table and a remote store built on it.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use super::RemoteStore;
use crate::models::{NewTodo, Todo, TodoId, TodoPatch};
use crate::util::now_millis;
use crate::{Error, Result};

/// Rejections from the authoritative table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Todo not found: {0}")]
    NotFound(TodoId),
    #[error("Todo title must not be blank")]
    BlankTitle,
}

/// Authoritative todo table with server-side id assignment and soft deletes.
#[derive(Debug, Clone, Default)]
pub struct TodoTable {
    todos: BTreeMap<TodoId, Todo>,
    last_id: i64,
}

impl TodoTable {
    /// All records, newest first
    pub fn list(&self) -> Vec<Todo> {
        let mut todos = self.todos.values().cloned().collect::<Vec<_>>();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        todos
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.get(&id)
    }

    /// Store a record verbatim, keeping id assignment ahead of it
    pub fn insert(&mut self, todo: Todo) {
        self.last_id = self.last_id.max(todo.id.get());
        self.todos.insert(todo.id, todo);
    }

    pub fn create(&mut self, new: NewTodo) -> std::result::Result<Todo, TableError> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(TableError::BlankTitle);
        }

        self.last_id += 1;
        let todo = Todo {
            id: TodoId::new(self.last_id),
            title: title.to_string(),
            completed: new.completed,
            deleted: false,
            created_at: new.created_at.unwrap_or_else(now_millis),
            updated_at: None,
        };
        self.todos.insert(todo.id, todo.clone());
        Ok(todo)
    }

    pub fn update(&mut self, patch: &TodoPatch) -> std::result::Result<Todo, TableError> {
        if patch
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            return Err(TableError::BlankTitle);
        }
        let todo = self
            .todos
            .get_mut(&patch.id)
            .ok_or(TableError::NotFound(patch.id))?;

        if let Some(title) = &patch.title {
            todo.title = title.trim().to_string();
        }
        if let Some(completed) = patch.completed {
            todo.completed = completed;
        }
        if let Some(deleted) = patch.deleted {
            todo.deleted = deleted;
        }
        todo.updated_at = Some(now_millis());
        Ok(todo.clone())
    }

    pub fn delete(&mut self, id: TodoId) -> std::result::Result<(), TableError> {
        let todo = self.todos.get_mut(&id).ok_or(TableError::NotFound(id))?;
        todo.deleted = true;
        todo.updated_at = Some(now_millis());
        Ok(())
    }
}

#[derive(Debug)]
struct MemoryState {
    table: TodoTable,
    available: bool,
    failing: HashSet<TodoId>,
    write_calls: usize,
}

/// Remote store living in process memory, with switches for simulating outages.
#[derive(Debug, Clone)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<MemoryState>>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                table: TodoTable::default(),
                available: true,
                failing: HashSet::new(),
                write_calls: 0,
            })),
        }
    }

    /// Make every call fail (`false`) or succeed again (`true`)
    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// Put a record straight into the table
    pub async fn seed(&self, todo: Todo) {
        self.state.lock().await.table.insert(todo);
    }

    /// Fail every write that targets `id`
    pub async fn fail_writes_to(&self, id: TodoId) {
        self.state.lock().await.failing.insert(id);
    }

    pub async fn clear_failures(&self) {
        self.state.lock().await.failing.clear();
    }

    pub async fn get(&self, id: TodoId) -> Option<Todo> {
        self.state.lock().await.table.get(id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<Todo> {
        self.state.lock().await.table.list()
    }

    /// Number of create/update/delete calls received
    pub async fn write_calls(&self) -> usize {
        self.state.lock().await.write_calls
    }
}

fn unavailable() -> Error {
    Error::RemoteUnavailable("remote store is offline".to_string())
}

fn rejected(error: &TableError) -> Error {
    Error::RemoteUnavailable(error.to_string())
}

impl RemoteStore for MemoryRemoteStore {
    async fn list(&self) -> Result<Vec<Todo>> {
        let state = self.state.lock().await;
        if !state.available {
            return Err(unavailable());
        }
        Ok(state.table.list())
    }

    async fn create(&self, todo: &Todo) -> Result<Todo> {
        let mut state = self.state.lock().await;
        if !state.available {
            return Err(unavailable());
        }
        state.write_calls += 1;
        if state.failing.contains(&todo.id) {
            return Err(Error::RemoteUnavailable(format!("create {} failed", todo.id)));
        }
        state.table.create(NewTodo::from(todo)).map_err(|e| rejected(&e))
    }

    async fn update(&self, patch: &TodoPatch) -> Result<Todo> {
        let mut state = self.state.lock().await;
        if !state.available {
            return Err(unavailable());
        }
        state.write_calls += 1;
        if state.failing.contains(&patch.id) {
            return Err(Error::RemoteUnavailable(format!("update {} failed", patch.id)));
        }
        state.table.update(patch).map_err(|e| rejected(&e))
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.available {
            return Err(unavailable());
        }
        state.write_calls += 1;
        if state.failing.contains(&id) {
            return Err(Error::RemoteUnavailable(format!("delete {id} failed")));
        }
        state.table.delete(id).map_err(|e| rejected(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_todo(title: &str) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            completed: false,
            created_at: None,
        }
    }

    #[test]
    fn table_assigns_increasing_ids() {
        let mut table = TodoTable::default();
        let first = table.create(new_todo("a")).unwrap();
        let second = table.create(new_todo("b")).unwrap();
        assert_eq!(first.id, TodoId::new(1));
        assert_eq!(second.id, TodoId::new(2));
        assert!(first.updated_at.is_none());
    }

    #[test]
    fn table_rejects_blank_titles() {
        let mut table = TodoTable::default();
        assert_eq!(table.create(new_todo("  ")), Err(TableError::BlankTitle));
    }

    #[test]
    fn table_update_applies_only_present_fields() {
        let mut table = TodoTable::default();
        let created = table.create(new_todo("title")).unwrap();

        let updated = table
            .update(&TodoPatch::completion(created.id, true))
            .unwrap();
        assert_eq!(updated.title, "title");
        assert!(updated.completed);
        assert!(updated.updated_at.is_some());

        assert_eq!(
            table.update(&TodoPatch::completion(TodoId::new(99), true)),
            Err(TableError::NotFound(TodoId::new(99)))
        );
    }

    #[test]
    fn table_delete_is_a_tombstone() {
        let mut table = TodoTable::default();
        let created = table.create(new_todo("x")).unwrap();
        table.delete(created.id).unwrap();

        let stored = table.get(created.id).unwrap();
        assert!(stored.deleted);
        assert_eq!(table.list().len(), 1);
    }

    #[test]
    fn seeded_ids_push_assignment_forward() {
        let mut table = TodoTable::default();
        table.insert(Todo::new(TodoId::new(10), "seeded"));
        let created = table.create(new_todo("next")).unwrap();
        assert_eq!(created.id, TodoId::new(11));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn memory_store_fails_every_call_while_unavailable() {
        let remote = MemoryRemoteStore::new();
        remote.set_available(false).await;

        assert!(remote.list().await.unwrap_err().is_remote_unavailable());
        assert!(remote
            .create(&Todo::new(TodoId::new(1), "x"))
            .await
            .unwrap_err()
            .is_remote_unavailable());

        remote.set_available(true).await;
        assert!(remote.probe().await.is_ok());
    }
}
