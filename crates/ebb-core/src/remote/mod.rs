//! Remote record store: the authoritative copy the engine reconciles against.

mod http;
mod memory;

pub use http::{normalize_base_url, HttpRemoteStore};
pub use memory::{MemoryRemoteStore, TableError, TodoTable};

use crate::models::{Todo, TodoId, TodoPatch};
use crate::Result;

/// Request/response CRUD over the authoritative todo set.
///
/// Every call either succeeds or fails as a whole; failures surface as
/// [`crate::Error::RemoteUnavailable`].
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Every record the server knows, tombstones included
    async fn list(&self) -> Result<Vec<Todo>>;

    /// Create a record from the client's intended version; the server picks the id
    async fn create(&self, todo: &Todo) -> Result<Todo>;

    /// Apply a partial update
    async fn update(&self, patch: &TodoPatch) -> Result<Todo>;

    /// Soft-delete a record
    async fn delete(&self, id: TodoId) -> Result<()>;

    /// Cheap reachability check used by the connectivity poller
    async fn probe(&self) -> Result<()> {
        self.list().await.map(|_| ())
    }
}
