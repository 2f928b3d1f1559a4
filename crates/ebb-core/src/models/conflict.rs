//! Conflict resolution outcomes and the persisted conflict log entry.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::todo::{Todo, TodoId};

/// How a queued action was reconciled against the server's copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    ServerWins,
    ClientWins,
    Merge,
    /// Needs an explicit user decision; the action stays queued
    Manual,
}

impl ResolutionStrategy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerWins => "server-wins",
            Self::ClientWins => "client-wins",
            Self::Merge => "merge",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server-wins" => Ok(Self::ServerWins),
            "client-wins" => Ok(Self::ClientWins),
            "merge" => Ok(Self::Merge),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown resolution strategy: {other}")),
        }
    }
}

/// A field whose value differs between server and client versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictField {
    Title,
    Completed,
    Deleted,
}

impl ConflictField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for ConflictField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "title" => Ok(Self::Title),
            "completed" => Ok(Self::Completed),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown conflict field: {other}")),
        }
    }
}

/// Both versions of a diverged record plus the fields that disagree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetails {
    pub server_version: Todo,
    pub client_version: Todo,
    pub conflict_fields: Vec<ConflictField>,
}

/// Output of the conflict resolver. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictResolution {
    pub strategy: ResolutionStrategy,
    /// Record to replay; `None` means the action is void
    pub resolved: Option<Todo>,
    /// Present for `Merge` and `Manual`
    pub details: Option<ConflictDetails>,
}

impl ConflictResolution {
    pub const fn client_wins(resolved: Option<Todo>) -> Self {
        Self {
            strategy: ResolutionStrategy::ClientWins,
            resolved,
            details: None,
        }
    }

    pub const fn server_wins(resolved: Option<Todo>) -> Self {
        Self {
            strategy: ResolutionStrategy::ServerWins,
            resolved,
            details: None,
        }
    }

    pub const fn merge(resolved: Todo, details: ConflictDetails) -> Self {
        Self {
            strategy: ResolutionStrategy::Merge,
            resolved: Some(resolved),
            details: Some(details),
        }
    }

    pub const fn manual(details: ConflictDetails) -> Self {
        Self {
            strategy: ResolutionStrategy::Manual,
            resolved: None,
            details: Some(details),
        }
    }

    pub fn requires_user_input(&self) -> bool {
        self.strategy == ResolutionStrategy::Manual
    }
}

/// The user's answer to a manual conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserChoice {
    /// Keep the server's version
    Server,
    /// Keep the local version
    Client,
    /// Merge both with the automatic rules
    Merge,
}

impl FromStr for UserChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "client" => Ok(Self::Client),
            "merge" => Ok(Self::Merge),
            other => Err(format!("expected server, client or merge, got {other}")),
        }
    }
}

/// Logged merge or manual resolution, kept for later inspection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Conflict row identifier
    pub id: i64,
    /// Todo involved in the conflict
    pub todo_id: TodoId,
    /// Strategy that settled it
    pub strategy: ResolutionStrategy,
    /// Fields that disagreed
    pub fields: Vec<ConflictField>,
    /// Server version's last-modified time
    pub server_modified_at: DateTime<Utc>,
    /// Client version's last-modified time
    pub client_modified_at: DateTime<Utc>,
    /// When the conflict was settled
    pub resolved_at: DateTime<Utc>,
}

impl ConflictRecord {
    /// Log entry for a settled conflict; `id` is assigned on insert.
    pub fn from_details(
        strategy: ResolutionStrategy,
        details: &ConflictDetails,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            todo_id: details.client_version.id,
            strategy,
            fields: details.conflict_fields.clone(),
            server_modified_at: details.server_version.last_modified(),
            client_modified_at: details.client_version.last_modified(),
            resolved_at,
        }
    }
}
