//! Data models for Ebb

mod conflict;
mod pending_action;
mod todo;

pub use conflict::{
    ConflictDetails, ConflictField, ConflictRecord, ConflictResolution, ResolutionStrategy,
    UserChoice,
};
pub use pending_action::{ActionKind, ActionPayload, PendingAction};
pub use todo::{NewTodo, Todo, TodoId, TodoPatch, TodoRef};
