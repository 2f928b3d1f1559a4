//! Todo model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::now_millis;

/// Integer identity of a todo.
///
/// Server-issued ids are small sequence numbers; ids minted while offline are
/// wall-clock milliseconds and are replaced once the remote store assigns one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    /// Wrap a raw id
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Temporary client-side id derived from the current wall clock.
    #[must_use]
    pub fn temporary() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Raw integer value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// The next id up, used to step past a collision.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A todo item, the unit of shared state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Identity
    pub id: TodoId,
    /// Title text, never blank once committed
    pub title: String,
    /// Completion flag
    #[serde(default)]
    pub completed: bool,
    /// Tombstone flag
    #[serde(default)]
    pub deleted: bool,
    /// Creation timestamp, immutable
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp; `None` until the first update
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Todo {
    /// Create a new, never-updated todo with the given id and title
    #[must_use]
    pub fn new(id: TodoId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            completed: false,
            deleted: false,
            created_at: now_millis(),
            updated_at: None,
        }
    }

    /// Minimal tombstone for a record only known by id.
    #[must_use]
    pub fn tombstone(id: TodoId) -> Self {
        Self {
            deleted: true,
            ..Self::new(id, String::new())
        }
    }

    /// Timestamp used to order versions: `updated_at`, falling back to `created_at`.
    #[must_use]
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Copy of this todo marked deleted.
    #[must_use]
    pub fn into_tombstone(self) -> Self {
        Self {
            deleted: true,
            ..self
        }
    }

    /// Stamp `updated_at` with the current time.
    #[must_use]
    pub fn touched(self) -> Self {
        Self {
            updated_at: Some(now_millis()),
            ..self
        }
    }

    /// Whether the title is blank (whitespace-only counts as blank)
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }
}

/// The payload of a queued delete: just enough to identify the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoRef {
    pub id: TodoId,
}

/// Body of a create call: what the client decides, the server assigns the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Offline creations keep their original creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Todo> for NewTodo {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            completed: todo.completed,
            created_at: Some(todo.created_at),
        }
    }
}

/// Partial update keyed by id; absent fields are left untouched by the remote store.
///
/// The id travels in the request path, not the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPatch {
    #[serde(skip)]
    pub id: TodoId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
}

impl TodoPatch {
    /// Patch that only changes completion.
    #[must_use]
    pub const fn completion(id: TodoId, completed: bool) -> Self {
        Self {
            id,
            title: None,
            completed: Some(completed),
            deleted: None,
        }
    }

    /// Patch that only changes the title.
    #[must_use]
    pub fn title(id: TodoId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            completed: None,
            deleted: None,
        }
    }
}

impl From<&Todo> for TodoPatch {
    fn from(todo: &Todo) -> Self {
        Self {
            id: todo.id,
            title: Some(todo.title.clone()),
            completed: Some(todo.completed),
            deleted: Some(todo.deleted),
        }
    }
}
