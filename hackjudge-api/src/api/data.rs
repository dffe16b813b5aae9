//! Full-snapshot read endpoint
//!
//! Pull-model viewers call this on a fixed interval and replace their
//! local state with the response.

use super::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use hackjudge_common::db::snapshot;
use hackjudge_common::Snapshot;

/// GET /api/data
pub async fn get_snapshot(State(state): State<AppState>) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(snapshot::load(&state.store).await?))
}
