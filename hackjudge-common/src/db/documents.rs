//! CRUD for server-keyed collections (projects, judges, criteria)
//!
//! External ids are parsed to UUIDs before any query runs, so a malformed
//! id is always a validation error. Documents are stored without their id
//! and re-keyed on the way out.

use crate::db::Store;
use crate::models::{Collection, Entity, Record};
use crate::uuid_utils::{parse_id, to_external};
use crate::{uuid_utils, Error, Result};
use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use tracing::info;

/// Result of a delete, including dependent scores removed with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub cascaded_scores: u64,
}

/// Score column that references documents of `collection`, if any
fn score_reference(collection: Collection) -> Option<&'static str> {
    match collection {
        Collection::Projects => Some("project_id"),
        Collection::Judges => Some("judge_id"),
        Collection::Criteria | Collection::Scores => None,
    }
}

fn decode<E: Entity>(id: String, doc: &str) -> Result<Record<E>> {
    let fields: E = serde_json::from_str(doc)?;
    Ok(Record { id, fields })
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// All documents of a collection in insertion order, on an open connection
pub async fn fetch_all<E: Entity>(conn: &mut SqliteConnection) -> Result<Vec<Record<E>>> {
    let sql = format!("SELECT id, doc FROM {} ORDER BY rowid", E::COLLECTION.table());
    let rows: Vec<(String, String)> = sqlx::query_as(&sql).fetch_all(conn).await?;
    rows.into_iter()
        .map(|(id, doc)| decode::<E>(id, &doc))
        .collect()
}

/// All documents of a collection in insertion order
pub async fn list_all<E: Entity>(store: &Store) -> Result<Vec<Record<E>>> {
    let pool = store.pool().await?;
    let mut conn = pool.acquire().await?;
    fetch_all::<E>(&mut *conn).await
}

/// Look up one document by external id
pub async fn get_by_id<E: Entity>(store: &Store, raw_id: &str) -> Result<Record<E>> {
    let collection = E::COLLECTION;
    let id = to_external(&parse_id(collection.singular(), raw_id)?);
    let pool = store.pool().await?;

    let sql = format!("SELECT doc FROM {} WHERE id = ?", collection.table());
    let doc: Option<String> = sqlx::query_scalar(&sql)
        .bind(&id)
        .fetch_optional(pool)
        .await?;

    let doc = doc.ok_or_else(|| Error::not_found(format!("{} {}", collection.singular(), id)))?;
    decode(id, &doc)
}

/// Insert documents, assigning each a fresh id
///
/// All-or-nothing: either every document is stored or none is.
pub async fn insert_many<E: Entity>(store: &Store, items: Vec<E>) -> Result<Vec<Record<E>>> {
    let collection = E::COLLECTION;
    if items.is_empty() {
        return Err(Error::validation(format!(
            "no {} documents to insert",
            collection.singular()
        )));
    }

    let mut items = items;
    for item in &mut items {
        item.strip_reserved();
        item.validate()?;
    }

    let pool = store.pool().await?;
    let mut tx = pool.begin().await?;
    let timestamp = now();
    let sql = format!(
        "INSERT INTO {} (id, doc, created_at, updated_at) VALUES (?, ?, ?, ?)",
        collection.table()
    );

    let mut created = Vec::with_capacity(items.len());
    for fields in items {
        let id = to_external(&uuid_utils::generate());
        let doc = serde_json::to_string(&fields)?;
        sqlx::query(&sql)
            .bind(&id)
            .bind(doc)
            .bind(&timestamp)
            .bind(&timestamp)
            .execute(&mut *tx)
            .await?;
        created.push(Record { id, fields });
    }
    tx.commit().await?;

    info!("Inserted {} {} document(s)", created.len(), collection.singular());
    Ok(created)
}

/// Insert a single document
pub async fn insert_one<E: Entity>(store: &Store, item: E) -> Result<Record<E>> {
    let mut created = insert_many(store, vec![item]).await?;
    created
        .pop()
        .ok_or_else(|| Error::Storage("insert returned no document".to_string()))
}

/// Replace the named top-level fields of a stored document
///
/// Each key in `changes` overwrites the stored value whole (nested objects
/// are not merged) and an explicit `null` is stored as `null`. Fields not
/// named keep their stored values. The write is one statement, so
/// concurrent updates to different fields of the same document do not
/// overwrite each other; a result that no longer decodes as `E` is rolled
/// back as a validation error.
pub async fn update_by_id<E: Entity>(
    store: &Store,
    raw_id: &str,
    mut changes: Map<String, Value>,
) -> Result<Record<E>> {
    let collection = E::COLLECTION;
    let id = to_external(&parse_id(collection.singular(), raw_id)?);
    changes.remove("id");

    let patch: E::Patch = serde_json::from_value(Value::Object(changes.clone()))
        .map_err(|e| Error::validation(e.to_string()))?;
    E::validate_patch(&patch)?;

    let mut assignments = Vec::with_capacity(changes.len());
    for key in changes.keys() {
        assignments.push(field_path(key)?);
    }
    let doc_expr = if assignments.is_empty() {
        "doc".to_string()
    } else {
        format!("json_set(doc{})", ", ?, json(?)".repeat(assignments.len()))
    };

    let pool = store.pool().await?;
    let mut tx = pool.begin().await?;
    let sql = format!(
        "UPDATE {} SET doc = {}, updated_at = ? WHERE id = ? RETURNING doc",
        collection.table(),
        doc_expr
    );
    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for (path, value) in assignments.into_iter().zip(changes.values()) {
        query = query.bind(path).bind(value.to_string());
    }
    let doc: Option<String> = query
        .bind(now())
        .bind(&id)
        .fetch_optional(&mut *tx)
        .await?;

    let doc = doc.ok_or_else(|| Error::not_found(format!("{} {}", collection.singular(), id)))?;
    let fields: E = serde_json::from_str(&doc)
        .map_err(|e| Error::validation(format!("update leaves {} invalid: {}", collection.singular(), e)))?;
    fields.validate()?;
    tx.commit().await?;

    info!("Updated {} {}", collection.singular(), id);
    Ok(Record { id, fields })
}

/// JSON path addressing one top-level key
fn field_path(key: &str) -> Result<String> {
    if key.is_empty() || key.contains(['"', '\\']) {
        return Err(Error::validation(format!("invalid field name {:?}", key)));
    }
    Ok(format!("$.\"{}\"", key))
}

/// Delete a document and any scores that reference it
pub async fn delete_by_id<E: Entity>(store: &Store, raw_id: &str) -> Result<DeleteOutcome> {
    let collection = E::COLLECTION;
    let id = to_external(&parse_id(collection.singular(), raw_id)?);
    let pool = store.pool().await?;
    let mut tx = pool.begin().await?;

    let deleted = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", collection.table()))
        .bind(&id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::not_found(format!("{} {}", collection.singular(), id)));
    }

    let cascaded_scores = match score_reference(collection) {
        Some(column) => sqlx::query(&format!("DELETE FROM scores WHERE {} = ?", column))
            .bind(&id)
            .execute(&mut *tx)
            .await?
            .rows_affected(),
        None => 0,
    };
    tx.commit().await?;

    info!(
        "Deleted {} {} (cascaded {} score(s))",
        collection.singular(),
        id,
        cascaded_scores
    );
    Ok(DeleteOutcome { cascaded_scores })
}
