//! Score collection
//!
//! Scores are keyed by the client-supplied id. Writes are upserts: a
//! resubmitted score replaces the stored document in a single statement,
//! so concurrent writers to the same id resolve as last-write-wins.

use crate::db::Store;
use crate::models::Score;
use crate::uuid_utils::{parse_id, to_external};
use crate::{Error, Result};
use sqlx::SqliteConnection;
use tracing::info;
use uuid::Uuid;

const UPSERT_CONFLICT: &str = r#"
    ON CONFLICT(id) DO UPDATE SET
        project_id = excluded.project_id,
        judge_id = excluded.judge_id,
        doc = excluded.doc,
        updated_at = excluded.updated_at
"#;

/// All scores in first-submission order, on an open connection
pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Score>> {
    let docs: Vec<String> = sqlx::query_scalar("SELECT doc FROM scores ORDER BY rowid")
        .fetch_all(conn)
        .await?;
    docs.iter()
        .map(|doc| serde_json::from_str(doc).map_err(Error::from))
        .collect()
}

/// All scores in first-submission order
pub async fn list_all(store: &Store) -> Result<Vec<Score>> {
    let pool = store.pool().await?;
    let mut conn = pool.acquire().await?;
    fetch_all(&mut *conn).await
}

/// Insert or replace a score by its external id
///
/// The document is stored exactly as submitted. The `project_id` and
/// `judge_id` lookup columns hold the canonical form of any reference that
/// parses as a UUID, so cascades match however the client spelled it.
/// With `strict_references` both references must be UUIDs naming existing
/// documents (checked inside the same statement).
pub async fn upsert(store: &Store, score: Score, strict_references: bool) -> Result<Score> {
    score.validate()?;
    let (project_key, judge_key) = if strict_references {
        (
            to_external(&parse_id("project", &score.project_id)?),
            to_external(&parse_id("judge", &score.judge_id)?),
        )
    } else {
        (
            reference_key(&score.project_id),
            reference_key(&score.judge_id),
        )
    };

    let doc = serde_json::to_string(&score)?;
    let timestamp = chrono::Utc::now().to_rfc3339();
    let pool = store.pool().await?;

    let written = if strict_references {
        let sql = format!(
            r#"
            INSERT INTO scores (id, project_id, judge_id, doc, created_at, updated_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM projects WHERE id = ?)
              AND EXISTS (SELECT 1 FROM judges WHERE id = ?)
            {}
            "#,
            UPSERT_CONFLICT
        );
        sqlx::query(&sql)
            .bind(&score.id)
            .bind(&project_key)
            .bind(&judge_key)
            .bind(&doc)
            .bind(&timestamp)
            .bind(&timestamp)
            .bind(&project_key)
            .bind(&judge_key)
            .execute(pool)
            .await?
            .rows_affected()
    } else {
        let sql = format!(
            r#"
            INSERT INTO scores (id, project_id, judge_id, doc, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            {}
            "#,
            UPSERT_CONFLICT
        );
        sqlx::query(&sql)
            .bind(&score.id)
            .bind(&project_key)
            .bind(&judge_key)
            .bind(&doc)
            .bind(&timestamp)
            .bind(&timestamp)
            .execute(pool)
            .await?
            .rows_affected()
    };

    if written == 0 {
        return Err(Error::validation(format!(
            "score {} references an unknown project or judge",
            score.id
        )));
    }

    info!(
        "Upserted score {} (project {}, judge {})",
        score.id, score.project_id, score.judge_id
    );
    Ok(score)
}

/// Lookup-column value for a score reference
fn reference_key(raw: &str) -> String {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => to_external(&id),
        Err(_) => raw.to_string(),
    }
}

/// Delete one score; scores have no dependents
pub async fn delete_by_id(store: &Store, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::validation("score id must not be empty"));
    }
    let pool = store.pool().await?;
    let deleted = sqlx::query("DELETE FROM scores WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::not_found(format!("score {}", id)));
    }
    info!("Deleted score {}", id);
    Ok(())
}
