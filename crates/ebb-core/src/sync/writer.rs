//! Optimistic write path for user-initiated mutations.

use super::engine::SyncEngine;
use crate::models::{ActionPayload, PendingAction, Todo, TodoId, TodoRef};
use crate::remote::RemoteStore;
use crate::services::LocalStore;
use crate::{Error, Result};

/// Where a write ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The remote store accepted it; the local copy is the server's record
    Synced(Todo),
    /// Applied locally and queued for the next drain
    Queued(Todo),
}

impl WriteOutcome {
    pub const fn todo(&self) -> &Todo {
        match self {
            Self::Synced(todo) | Self::Queued(todo) => todo,
        }
    }

    pub fn into_todo(self) -> Todo {
        match self {
            Self::Synced(todo) | Self::Queued(todo) => todo,
        }
    }

    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}

/// Write path borrowed from a [`SyncEngine`].
pub struct TodoWriter<'a, L, R> {
    engine: &'a SyncEngine<L, R>,
}

impl<'a, L: LocalStore, R: RemoteStore> TodoWriter<'a, L, R> {
    pub(crate) fn new(engine: &'a SyncEngine<L, R>) -> Self {
        Self { engine }
    }

    pub async fn create_todo(&self, title: &str) -> Result<WriteOutcome> {
        let title = validate_title(title)?;
        let id = self.temporary_id().await?;
        let intended = Todo::new(id, title);
        self.apply(ActionPayload::Create(intended.clone()), intended)
            .await
    }

    pub async fn update_title(&self, id: TodoId, title: &str) -> Result<WriteOutcome> {
        let title = validate_title(title)?;
        let existing = self.live(id).await?;
        let intended = Todo { title, ..existing }.touched();
        self.apply(ActionPayload::Update(intended.clone()), intended)
            .await
    }

    pub async fn toggle_completed(&self, id: TodoId) -> Result<WriteOutcome> {
        let existing = self.live(id).await?;
        self.set_completed(id, !existing.completed).await
    }

    pub async fn set_completed(&self, id: TodoId, completed: bool) -> Result<WriteOutcome> {
        let existing = self.live(id).await?;
        let intended = Todo {
            completed,
            ..existing
        }
        .touched();
        self.apply(ActionPayload::Update(intended.clone()), intended)
            .await
    }

    pub async fn delete_todo(&self, id: TodoId) -> Result<WriteOutcome> {
        let existing = self.live(id).await?;
        let intended = existing.into_tombstone().touched();
        self.apply(ActionPayload::Delete(TodoRef { id }), intended)
            .await
    }

    async fn apply(&self, payload: ActionPayload, intended: Todo) -> Result<WriteOutcome> {
        let local = self.engine.local();

        if self.engine.connectivity().is_online() {
            match self.engine.push(payload.kind(), &intended).await {
                Ok(stored) => {
                    local.upsert(&stored).await?;
                    return Ok(WriteOutcome::Synced(stored));
                }
                Err(error) if error.is_remote_unavailable() => {
                    tracing::warn!(
                        kind = %payload.kind(),
                        id = %intended.id,
                        "Remote write failed, queueing locally: {error}"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        let action = PendingAction::new(payload);
        local.upsert_and_enqueue(&intended, &action).await?;
        tracing::debug!(action = %action.id, "Queued pending action");
        Ok(WriteOutcome::Queued(intended))
    }

    async fn live(&self, id: TodoId) -> Result<Todo> {
        self.engine
            .local()
            .get(id)
            .await?
            .filter(|todo| !todo.deleted)
            .ok_or_else(|| Error::NotFound(format!("todo {id}")))
    }

    /// Wall-clock id, stepped forward past any id already in the local store
    async fn temporary_id(&self) -> Result<TodoId> {
        let mut id = TodoId::temporary();
        while self.engine.local().get(id).await?.is_some() {
            id = id.next();
        }
        Ok(id)
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Todo title must not be empty".to_string()));
    }
    Ok(title.to_string())
}
