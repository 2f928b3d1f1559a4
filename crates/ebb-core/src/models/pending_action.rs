//! Pending action model: a mutation not yet confirmed by the remote store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::todo::{Todo, TodoId, TodoRef};
use crate::util::now_millis;

/// Kind of queued mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a queued action carries, keyed by its kind.
///
/// Creates and updates snapshot the full intended record; deletes only need
/// the target id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionPayload {
    Create(Todo),
    Update(Todo),
    Delete(TodoRef),
}

impl ActionPayload {
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Create(_) => ActionKind::Create,
            Self::Update(_) => ActionKind::Update,
            Self::Delete(_) => ActionKind::Delete,
        }
    }

    /// Id of the record this action mutates.
    pub const fn target_id(&self) -> TodoId {
        match self {
            Self::Create(todo) | Self::Update(todo) => todo.id,
            Self::Delete(target) => target.id,
        }
    }

    /// The record the user intended, when the payload carries one.
    pub const fn intended(&self) -> Option<&Todo> {
        match self {
            Self::Create(todo) | Self::Update(todo) => Some(todo),
            Self::Delete(_) => None,
        }
    }

    /// Same payload pointed at a different record id.
    #[must_use]
    pub fn retargeted(self, id: TodoId) -> Self {
        match self {
            Self::Create(todo) => Self::Create(Todo { id, ..todo }),
            Self::Update(todo) => Self::Update(Todo { id, ..todo }),
            Self::Delete(_) => Self::Delete(TodoRef { id }),
        }
    }
}

/// A mutation waiting in the durable FIFO queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    /// `{type}_{timestamp}_{random}`, unique even for same-millisecond bursts
    pub id: String,
    pub payload: ActionPayload,
    /// Enqueue time; telemetry only, queue order is insertion order
    pub timestamp: DateTime<Utc>,
}

impl PendingAction {
    /// Build a new action with a fresh id stamped at the current time
    #[must_use]
    pub fn new(payload: ActionPayload) -> Self {
        let timestamp = now_millis();
        let random = Uuid::now_v7().simple().to_string();
        let id = format!(
            "{}_{}_{}",
            payload.kind(),
            timestamp.timestamp_millis(),
            &random[random.len() - 12..]
        );
        Self {
            id,
            payload,
            timestamp,
        }
    }

    pub const fn kind(&self) -> ActionKind {
        self.payload.kind()
    }

    pub const fn target_id(&self) -> TodoId {
        self.payload.target_id()
    }
}
