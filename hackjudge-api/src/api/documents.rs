//! Resource handlers for server-keyed collections
//!
//! Projects, judges and criteria share one set of generic handlers; the
//! entity type decides the collection and the cascade rule applied on
//! delete.

use super::{detached, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use hackjudge_common::db::documents;
use hackjudge_common::models::{Entity, OneOrMany, Record};
use hackjudge_common::Error;
use serde_json::{json, Map, Value};

/// GET /api/{collection}
pub async fn list<E: Entity>(
    State(state): State<AppState>,
) -> Result<Json<Vec<Record<E>>>, ApiError> {
    Ok(Json(documents::list_all::<E>(&state.store).await?))
}

/// POST /api/{collection}
///
/// Accepts one document or an array; responds in the same shape with
/// server-assigned ids.
pub async fn create<E: Entity>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<OneOrMany<Record<E>>>), ApiError> {
    let Json(body) = body?;
    let payload = OneOrMany::<E>::from_value(body)?;

    let one = payload.is_one();

    detached(async move {
        let created = documents::insert_many::<E>(&state.store, payload.into_vec()).await?;
        state.broadcast().await;
        Ok((StatusCode::CREATED, Json(OneOrMany::from_vec(created, one))))
    })
    .await
}

/// PUT /api/{collection}
///
/// Body is `{id, ...fields}`; `id` selects the document and is not stored.
/// Each field given replaces the stored value whole.
pub async fn update<E: Entity>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Record<E>>, ApiError> {
    let Json(body) = body?;
    let (id, changes) = split_update(body)?;

    detached(async move {
        let updated = documents::update_by_id::<E>(&state.store, &id, changes).await?;
        state.broadcast().await;
        Ok(Json(updated))
    })
    .await
}

/// DELETE /api/{collection}/:id
pub async fn delete<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    detached(async move {
        let outcome = documents::delete_by_id::<E>(&state.store, &id).await?;
        state.broadcast().await;
        Ok(Json(json!({
            "success": true,
            "cascadedScores": outcome.cascaded_scores,
        })))
    })
    .await
}

/// Separate the lookup id from the fields of an update body
fn split_update(body: Value) -> Result<(String, Map<String, Value>), Error> {
    let Value::Object(mut map) = body else {
        return Err(Error::validation("update body must be a JSON object"));
    };

    let id = match map.remove("id") {
        Some(Value::String(id)) => id,
        Some(_) => return Err(Error::validation("id must be a string")),
        None => return Err(Error::validation("update body must include an id")),
    };
    Ok((id, map))
}
