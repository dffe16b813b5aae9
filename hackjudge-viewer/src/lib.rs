//! hackjudge-viewer library - keeps a local snapshot in sync with the API
//!
//! A [`Viewer`] owns the latest [`Snapshot`](hackjudge_common::Snapshot) and
//! replaces it wholesale on every successful fetch or `DATA_UPDATE` event.
//! Two drivers are provided: [`run_polling`] re-fetches on a fixed interval,
//! [`run_push`] consumes the server's SSE stream.

pub mod error;
pub mod source;
pub mod sse;
pub mod state;
pub mod sync;
pub mod viewer;

pub use error::ViewerError;
pub use source::{EventSource, EventStream, HttpSource, SnapshotSource};
pub use state::SyncState;
pub use sync::{run_polling, run_push};
pub use viewer::Viewer;
