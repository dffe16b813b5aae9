//! Server-Sent Events (SSE) broadcaster
//!
//! Push-model viewers subscribe here. Each connection first receives the
//! current snapshot, then one `DATA_UPDATE` event per committed mutation.
//! If that snapshot cannot be read the request fails like any other read,
//! so viewers see the outage instead of an idle stream. Closing the
//! connection drops the subscription.

use super::ApiError;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use hackjudge_common::events::JudgingEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, info, warn};

/// GET /api/events - SSE snapshot stream
pub async fn event_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (rx, current) = state.subscribe().await?;
    let initial = to_sse(&current);
    info!(
        "SSE viewer connected ({} subscriber(s))",
        state.events.subscriber_count()
    );

    let updates = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                debug!("SSE: sending revision {}", event.revision());
                to_sse(&event)
            }
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("SSE viewer lagged, skipped {} snapshot(s)", skipped);
                None
            }
        }
    });

    let stream = stream::iter(initial).chain(updates).map(Ok);

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

fn to_sse(event: &JudgingEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(
            Event::default()
                .event(event.event_type())
                .id(event.revision().to_string())
                .data(json),
        ),
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}
