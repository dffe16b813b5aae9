//! Collection tables
//!
//! Idempotent; safe to run on every start.

use crate::models::Collection;
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub(super) async fn ensure(pool: &SqlitePool) -> Result<()> {
    for collection in [Collection::Projects, Collection::Judges, Collection::Criteria] {
        create_document_table(pool, collection.table()).await?;
    }
    create_scores_table(pool).await?;
    info!("Document store schema ready");
    Ok(())
}

async fn create_document_table(pool: &SqlitePool, table: &str) -> Result<()> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id TEXT PRIMARY KEY NOT NULL,
            doc TEXT NOT NULL CHECK (json_valid(doc)),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        table
    ))
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_scores_table(pool: &SqlitePool) -> Result<()> {
    // project_id / judge_id mirror the document so cascades can use an index
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scores (
            id TEXT PRIMARY KEY NOT NULL,
            project_id TEXT NOT NULL,
            judge_id TEXT NOT NULL,
            doc TEXT NOT NULL CHECK (json_valid(doc)),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scores_project ON scores(project_id)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_scores_judge ON scores(judge_id)")
        .execute(pool)
        .await?;

    Ok(())
}
