use std::io;

use ebb_core::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ebb_core::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No todo title provided")]
    EmptyTitle,
    #[error("Invalid todo ID: {0}")]
    InvalidTodoId(String),
    #[error("Remote store is unreachable; pending changes stay queued")]
    Offline,
}
