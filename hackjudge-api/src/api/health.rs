//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Revision of the last broadcast snapshot
    pub revision: u64,
    pub viewers: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /health
///
/// 200 when the store answers, 503 with the connection error otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, label, error) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok", None),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(e.to_string())),
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            module: "hackjudge-api".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            revision: state.events.revision(),
            viewers: state.events.subscriber_count(),
            error,
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
