//! Aggregation and assignment views

use super::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use hackjudge_common::db::{documents, snapshot};
use hackjudge_common::models::{JudgeFields, Project, ProjectFields};
use hackjudge_common::results::{self, TrackResults};

/// GET /api/results - standings per track
pub async fn get_results(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackResults>>, ApiError> {
    let snapshot = snapshot::load(&state.store).await?;
    Ok(Json(results::aggregate(&snapshot)))
}

/// GET /api/judges/:id/projects - projects in the judge's tracks
pub async fn judge_projects(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Project>>, ApiError> {
    let judge = documents::get_by_id::<JudgeFields>(&state.store, &id).await?;
    let projects = documents::list_all::<ProjectFields>(&state.store)
        .await?
        .into_iter()
        .filter(|p| judge.fields.evaluates(&p.fields.track))
        .collect();
    Ok(Json(projects))
}
