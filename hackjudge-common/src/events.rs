//! Snapshot broadcast for the synchronization layer
//!
//! Every successful mutation publishes the full post-mutation snapshot to
//! all subscribers. Viewers replace their state with the payload; there is
//! no incremental patching and no ordering guarantee relative to the HTTP
//! response of the mutation that caused it.

use crate::models::Snapshot;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events delivered to connected viewers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JudgingEvent {
    /// Full state after a mutation
    #[serde(rename = "DATA_UPDATE")]
    DataUpdate {
        /// Monotonic per-process counter; a gap means notifications were skipped
        revision: u64,
        /// When the snapshot was read
        timestamp: chrono::DateTime<chrono::Utc>,
        payload: Snapshot,
    },
}

impl JudgingEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            JudgingEvent::DataUpdate { .. } => "DATA_UPDATE",
        }
    }

    pub fn revision(&self) -> u64 {
        match self {
            JudgingEvent::DataUpdate { revision, .. } => *revision,
        }
    }
}

/// Broadcast bus carrying snapshots to every connected viewer
///
/// Backed by `tokio::sync::broadcast`: subscribers that fall more than
/// `capacity` events behind skip the oldest ones. Because every event is a
/// full snapshot, the next one received restores consistency.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JudgingEvent>,
    revision: Arc<AtomicU64>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            revision: Arc::new(AtomicU64::new(0)),
            capacity,
        }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<JudgingEvent> {
        self.tx.subscribe()
    }

    /// Publish a snapshot, returning the event that was sent
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, snapshot: Snapshot) -> JudgingEvent {
        let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
        let event = JudgingEvent::DataUpdate {
            revision,
            timestamp: chrono::Utc::now(),
            payload: snapshot,
        };
        let _ = self.tx.send(event.clone());
        event
    }

    /// Wrap a snapshot at the current revision without publishing it
    ///
    /// Used for the initial event sent to a newly connected viewer.
    pub fn current(&self, snapshot: Snapshot) -> JudgingEvent {
        JudgingEvent::DataUpdate {
            revision: self.revision(),
            timestamp: chrono::Utc::now(),
            payload: snapshot,
        }
    }

    /// Revision of the most recent publish (0 before the first)
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
