//! Error types for ebb-core

use thiserror::Error;

/// Result type alias using ebb-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in ebb-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Local database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network or server failure talking to the remote store
    #[error("Remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Another drain cycle or conflict resolution currently owns the queue
    #[error("A sync cycle is already in progress")]
    SyncInProgress,
}

impl Error {
    /// Whether this error came from the remote store rather than local state.
    ///
    /// Remote failures are recoverable: writes fall back to the pending
    /// queue and queued actions are retried on the next reconnect.
    pub const fn is_remote_unavailable(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }

    /// Whether the local durable store failed.
    pub const fn is_local_store_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::LibSql(_) | Self::Io(_))
    }
}
