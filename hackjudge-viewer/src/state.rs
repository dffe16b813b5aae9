//! Viewer synchronization state

use std::fmt;

/// Where a viewer is in its sync lifecycle
///
/// ```text
/// Disconnected -> Loading -> Ready <-> Refreshing
///                                \-> Error (halted until retry)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Nothing loaded yet and no request in flight
    #[default]
    Disconnected,
    /// First fetch in flight
    Loading,
    /// Snapshot held; no request in flight
    Ready,
    /// Snapshot held (possibly stale) while a new one is fetched
    Refreshing,
    /// Halted after repeated failures
    Error(String),
}

impl SyncState {
    /// True when a snapshot is held and can be rendered
    pub fn has_data(&self) -> bool {
        matches!(self, SyncState::Ready | SyncState::Refreshing)
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, SyncState::Error(_))
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Disconnected => write!(f, "disconnected"),
            SyncState::Loading => write!(f, "loading"),
            SyncState::Ready => write!(f, "ready"),
            SyncState::Refreshing => write!(f, "refreshing"),
            SyncState::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}
