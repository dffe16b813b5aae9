//! hackjudge-api library - REST surface and snapshot broadcast
//!
//! Thin request handlers over the document store. Every successful
//! mutation is followed by a full-snapshot broadcast to connected viewers.

use axum::Router;
use hackjudge_common::db::{snapshot, Store};
use hackjudge_common::events::{EventBus, JudgingEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

pub mod api;
pub mod config;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Document store (owns the connection pool)
    pub store: Store,
    /// Snapshot broadcast to SSE viewers
    pub events: EventBus,
    /// Reject scores that reference unknown projects or judges
    pub strict_references: bool,
    /// Held across snapshot read + publish so revisions follow read order
    publish_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Store, events: EventBus, strict_references: bool) -> Self {
        Self {
            store,
            events,
            strict_references,
            publish_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Publish the current snapshot after a committed mutation
    ///
    /// The snapshot is read while holding the publish lock, so a higher
    /// revision never carries older state than a lower one. A failure here
    /// does not undo the mutation; viewers pick up the change with the next
    /// successful broadcast or poll.
    pub async fn broadcast(&self) {
        let _guard = self.publish_lock.lock().await;
        match snapshot::load(&self.store).await {
            Ok(snapshot) => {
                let event = self.events.publish(snapshot);
                debug!(
                    "Broadcast revision {} to {} viewer(s)",
                    event.revision(),
                    self.events.subscriber_count()
                );
            }
            Err(e) => warn!("Mutation committed but snapshot broadcast failed: {}", e),
        }
    }

    /// Subscribe to future broadcasts and read the current snapshot
    ///
    /// Both happen under the publish lock: every event later received on
    /// the returned channel was read after the returned snapshot.
    pub async fn subscribe(
        &self,
    ) -> hackjudge_common::Result<(broadcast::Receiver<JudgingEvent>, JudgingEvent)> {
        let _guard = self.publish_lock.lock().await;
        let rx = self.events.subscribe();
        let current = snapshot::load(&self.store).await?;
        Ok((rx, self.events.current(current)))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use api::documents::{create, delete, list, update};
    use axum::routing::{delete as delete_route, get};
    use hackjudge_common::models::{CriterionFields, JudgeFields, ProjectFields};

    let resources = Router::new()
        .route(
            "/api/projects",
            get(list::<ProjectFields>)
                .post(create::<ProjectFields>)
                .put(update::<ProjectFields>),
        )
        .route("/api/projects/:id", delete_route(delete::<ProjectFields>))
        .route(
            "/api/judges",
            get(list::<JudgeFields>)
                .post(create::<JudgeFields>)
                .put(update::<JudgeFields>),
        )
        .route("/api/judges/:id", delete_route(delete::<JudgeFields>))
        .route("/api/judges/:id/projects", get(api::judge_projects))
        .route(
            "/api/criteria",
            get(list::<CriterionFields>)
                .post(create::<CriterionFields>)
                .put(update::<CriterionFields>),
        )
        .route("/api/criteria/:id", delete_route(delete::<CriterionFields>))
        .route("/api/scores", get(api::list_scores).post(api::upsert_score))
        .route("/api/scores/:id", delete_route(api::delete_score));

    let sync = Router::new()
        .route("/api/data", get(api::get_snapshot))
        .route("/api/events", get(api::event_stream))
        .route("/api/results", get(api::get_results));

    Router::new()
        .merge(resources)
        .merge(sync)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
