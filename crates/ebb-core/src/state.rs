//! Shared cross-platform state types.

/// Unified sync state surfaced to presentation layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncState {
    Offline,
    Syncing,
    Synced,
    /// Some queued actions wait on a manual conflict decision.
    Conflicted,
    Error,
}

impl SyncState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Conflicted => "conflicted",
            Self::Error => "error",
        }
    }
}
