//! Database layer for Ebb

mod action_repository;
mod connection;
mod migrations;
mod repository;

pub use action_repository::{LibSqlPendingActionRepository, PendingActionRepository};
pub use connection::Database;
pub use repository::{LibSqlTodoRepository, TodoRepository};
