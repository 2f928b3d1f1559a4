//! ebb-core - Core library for Ebb
//!
//! This crate contains the shared models, the local libSQL store, the remote
//! store client, and the offline-first sync engine used by every Ebb
//! interface (the CLI and the reference API server).

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    ActionKind, ActionPayload, ConflictDetails, ConflictField, ConflictRecord,
    ConflictResolution, NewTodo, PendingAction, ResolutionStrategy, Todo, TodoId, TodoPatch,
    TodoRef, UserChoice,
};
