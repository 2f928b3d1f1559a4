//! Offline-first sync: conflict resolution, queue draining, and the optimistic write path.

mod connectivity;
mod engine;
mod resolver;
mod writer;

pub use connectivity::{poll_connectivity, sync_on_reconnect, Connectivity};
pub use engine::{DrainOutcome, HeldConflict, SyncEngine, SyncReport};
pub use resolver::{detect_conflicts, handle_delete_conflict, merge_todos, resolve_conflict};
pub use writer::{TodoWriter, WriteOutcome};
