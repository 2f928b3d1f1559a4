//! Services shared by every client: the local durable store.

mod database;

pub use database::DatabaseService;

use crate::models::{ConflictRecord, PendingAction, Todo, TodoId};
use crate::Result;

/// Local durable store used by the sync engine.
///
/// Implementations must offer atomic single-record upsert/delete, an atomic
/// full-snapshot replace, and a queue that lists actions in insertion order.
#[allow(async_fn_in_trait)]
pub trait LocalStore {
    /// Atomically replace every stored todo
    async fn replace_all(&self, todos: &[Todo]) -> Result<()>;

    /// Every stored todo, tombstones included
    async fn read_all(&self) -> Result<Vec<Todo>>;

    /// A single todo by id
    async fn get(&self, id: TodoId) -> Result<Option<Todo>>;

    /// Insert or overwrite one todo
    async fn upsert(&self, todo: &Todo) -> Result<()>;

    /// Physically remove one todo
    async fn remove_by_id(&self, id: TodoId) -> Result<()>;

    /// Append to the pending action queue
    async fn enqueue_pending_action(&self, action: &PendingAction) -> Result<()>;

    /// Write the intended record and queue its action in one transaction
    async fn upsert_and_enqueue(&self, todo: &Todo, action: &PendingAction) -> Result<()>;

    /// Queued actions in insertion order
    async fn list_pending_actions(&self) -> Result<Vec<PendingAction>>;

    /// Drop one queued action
    async fn remove_pending_action(&self, id: &str) -> Result<()>;

    /// Repoint queued actions from a temporary id to the server-assigned one
    async fn retarget_pending_actions(&self, from: TodoId, to: TodoId) -> Result<()>;

    /// Append to the conflict log
    async fn record_conflict(&self, conflict: &ConflictRecord) -> Result<()>;

    /// Most recent conflict log entries
    async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>>;
}
