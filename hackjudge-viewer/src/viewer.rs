//! Local snapshot holder and its state machine

use crate::error::ViewerError;
use crate::source::SnapshotSource;
use crate::state::SyncState;
use hackjudge_common::events::JudgingEvent;
use hackjudge_common::Snapshot;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_FAILURES: u32 = 3;

/// A viewer's copy of server state
///
/// The snapshot is only ever replaced wholesale. Failed fetches leave the
/// previous snapshot in place; after `max_failures` consecutive failures
/// the viewer halts in [`SyncState::Error`] until [`Viewer::retry`].
pub struct Viewer<S> {
    source: S,
    snapshot: Snapshot,
    state: SyncState,
    loaded: bool,
    consecutive_failures: u32,
    max_failures: u32,
    revision: Option<u64>,
}

impl<S: SnapshotSource> Viewer<S> {
    pub fn new(source: S, max_failures: u32) -> Self {
        Self {
            source,
            snapshot: Snapshot::default(),
            state: SyncState::Disconnected,
            loaded: false,
            consecutive_failures: 0,
            max_failures: max_failures.max(1),
            revision: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Last snapshot received (empty before the first)
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Revision of the last pushed event, if any
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }

    /// The halting error, if the viewer is in `Error`
    pub fn halted(&self) -> Option<ViewerError> {
        match &self.state {
            SyncState::Error(msg) => Some(ViewerError::Halted(msg.clone())),
            _ => None,
        }
    }

    /// Mark a request as in flight
    pub fn begin(&mut self) -> Result<(), ViewerError> {
        if let Some(halted) = self.halted() {
            return Err(halted);
        }
        self.state = if self.loaded {
            SyncState::Refreshing
        } else {
            SyncState::Loading
        };
        Ok(())
    }

    /// Fetch and install a fresh snapshot
    pub async fn refresh(&mut self) -> Result<&Snapshot, ViewerError> {
        self.begin()?;
        let fetched = self.source.fetch().await;
        match fetched {
            Ok(snapshot) => {
                self.replace(snapshot);
                Ok(&self.snapshot)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Install the snapshot carried by a pushed event
    pub fn apply_event(&mut self, event: JudgingEvent) -> Result<(), ViewerError> {
        if let Some(halted) = self.halted() {
            return Err(halted);
        }

        let JudgingEvent::DataUpdate {
            revision, payload, ..
        } = event;
        if let Some(previous) = self.revision {
            if revision > previous + 1 {
                debug!(
                    "Skipped {} revision(s) between {} and {}",
                    revision - previous - 1,
                    previous,
                    revision
                );
            }
        }
        self.revision = Some(revision);
        self.replace(payload);
        Ok(())
    }

    /// Record a failed request, halting once the limit is reached
    ///
    /// Returns the error for the caller to propagate.
    pub fn fail(&mut self, err: ViewerError) -> ViewerError {
        self.consecutive_failures += 1;

        if self.consecutive_failures >= self.max_failures {
            warn!(
                "Halting after {} consecutive failures: {}",
                self.consecutive_failures, err
            );
            self.state = SyncState::Error(err.to_string());
        } else {
            debug!(
                "Sync failure {}/{}: {}",
                self.consecutive_failures, self.max_failures, err
            );
            self.state = if self.loaded {
                SyncState::Ready
            } else {
                SyncState::Disconnected
            };
        }
        err
    }

    /// Leave `Error` and fetch again
    pub async fn retry(&mut self) -> Result<&Snapshot, ViewerError> {
        if self.is_halted() {
            info!("Retrying synchronization");
            self.consecutive_failures = 0;
            self.state = if self.loaded {
                SyncState::Ready
            } else {
                SyncState::Disconnected
            };
        }
        self.refresh().await
    }

    fn replace(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.loaded = true;
        self.consecutive_failures = 0;
        self.state = SyncState::Ready;
    }
}
