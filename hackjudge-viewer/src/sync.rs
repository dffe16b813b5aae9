//! Pull and push synchronization loops
//!
//! Both loops run until the viewer halts and then return the halting
//! error. `on_update` is called after every attempt, successful or not.

use crate::error::ViewerError;
use crate::source::{EventSource, SnapshotSource};
use crate::viewer::Viewer;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Re-fetch the full snapshot every `every`
pub async fn run_polling<S, F>(viewer: &mut Viewer<S>, every: Duration, mut on_update: F) -> ViewerError
where
    S: SnapshotSource,
    F: FnMut(&Viewer<S>),
{
    let mut ticker = time::interval(every.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if let Err(e) = viewer.refresh().await {
            warn!("Poll failed: {}", e);
        }
        on_update(viewer);

        if let Some(halted) = viewer.halted() {
            return halted;
        }
    }
}

/// Follow the server's event stream, reconnecting after `reconnect_delay`
///
/// Each connection starts with the current snapshot, so a reconnect
/// resynchronizes without a separate fetch.
pub async fn run_push<S, F>(
    viewer: &mut Viewer<S>,
    reconnect_delay: Duration,
    mut on_update: F,
) -> ViewerError
where
    S: EventSource,
    F: FnMut(&Viewer<S>),
{
    loop {
        if let Err(halted) = viewer.begin() {
            return halted;
        }

        let subscribed = viewer.source().subscribe().await;
        match subscribed {
            Ok(mut events) => {
                info!("Event stream connected");
                let mut ended_with_error = false;
                while let Some(item) = events.next().await {
                    match item {
                        Ok(event) => {
                            if let Err(halted) = viewer.apply_event(event) {
                                return halted;
                            }
                            on_update(viewer);
                        }
                        Err(e) => {
                            warn!("Event stream failed: {}", e);
                            viewer.fail(e);
                            ended_with_error = true;
                            break;
                        }
                    }
                }
                if !ended_with_error {
                    warn!("Event stream closed");
                    viewer.fail(ViewerError::StreamClosed);
                }
            }
            Err(e) => {
                warn!("Could not open event stream: {}", e);
                viewer.fail(e);
            }
        }
        on_update(viewer);

        if let Some(halted) = viewer.halted() {
            return halted;
        }
        time::sleep(reconnect_delay).await;
    }
}
