//! Shared database service wrapper used across clients.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::LocalStore;
use crate::db::{
    Database, LibSqlPendingActionRepository, LibSqlTodoRepository, PendingActionRepository,
    TodoRepository,
};
use crate::models::{ConflictRecord, PendingAction, Todo, TodoId};
use crate::Result;

/// Thread-safe service for DB and repository operations.
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl DatabaseService {
    /// Open a database service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening local store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory database service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// List todos newest-first, optionally with tombstones.
    pub async fn list_todos(&self, include_deleted: bool) -> Result<Vec<Todo>> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.list(include_deleted).await
    }

    /// Number of queued actions.
    pub async fn pending_count(&self) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingActionRepository::new(db.connection());
        repo.count().await
    }
}

impl LocalStore for DatabaseService {
    async fn replace_all(&self, todos: &[Todo]) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.replace_all(todos).await
    }

    async fn read_all(&self) -> Result<Vec<Todo>> {
        self.list_todos(true).await
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.get(id).await
    }

    async fn upsert(&self, todo: &Todo) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.upsert(todo).await
    }

    async fn remove_by_id(&self, id: TodoId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.remove(id).await
    }

    async fn enqueue_pending_action(&self, action: &PendingAction) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingActionRepository::new(db.connection());
        repo.enqueue(action).await
    }

    async fn upsert_and_enqueue(&self, todo: &Todo, action: &PendingAction) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();
        conn.execute("BEGIN TRANSACTION", ()).await?;

        let staged = async {
            LibSqlTodoRepository::new(conn).upsert(todo).await?;
            LibSqlPendingActionRepository::new(conn).enqueue(action).await
        }
        .await;
        if let Err(e) = staged {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e);
        }

        if let Err(e) = conn.execute("COMMIT", ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(())
    }

    async fn list_pending_actions(&self) -> Result<Vec<PendingAction>> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingActionRepository::new(db.connection());
        repo.list().await
    }

    async fn remove_pending_action(&self, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingActionRepository::new(db.connection());
        repo.remove(id).await
    }

    async fn retarget_pending_actions(&self, from: TodoId, to: TodoId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlPendingActionRepository::new(db.connection());
        let rewritten = repo.retarget(from, to).await?;
        tracing::debug!(%from, %to, rewritten, "Retargeted queued actions");
        Ok(())
    }

    async fn record_conflict(&self, conflict: &ConflictRecord) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.record_conflict(conflict).await.map(|_| ())
    }

    async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        let db = self.db.lock().await;
        let repo = LibSqlTodoRepository::new(db.connection());
        repo.list_conflicts(limit).await
    }
}
