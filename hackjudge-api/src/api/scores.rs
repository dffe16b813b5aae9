//! Score handlers
//!
//! Scores are written through a single upsert endpoint keyed by the
//! client-generated id; resubmitting replaces the stored score.

use super::{detached, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use hackjudge_common::db::scores;
use hackjudge_common::models::Score;
use hackjudge_common::Error;
use serde_json::{json, Value};

/// GET /api/scores
pub async fn list_scores(State(state): State<AppState>) -> Result<Json<Vec<Score>>, ApiError> {
    Ok(Json(scores::list_all(&state.store).await?))
}

/// POST /api/scores
///
/// Responds 200 with the stored score.
pub async fn upsert_score(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Score>, ApiError> {
    let Json(body) = body?;
    let score: Score =
        serde_json::from_value(body).map_err(|e| Error::validation(e.to_string()))?;
    let strict = state.strict_references;

    detached(async move {
        let stored = scores::upsert(&state.store, score, strict).await?;
        state.broadcast().await;
        Ok(Json(stored))
    })
    .await
}

/// DELETE /api/scores/:id
pub async fn delete_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    detached(async move {
        scores::delete_by_id(&state.store, &id).await?;
        state.broadcast().await;
        Ok(Json(json!({ "success": true })))
    })
    .await
}
