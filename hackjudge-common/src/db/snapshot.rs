//! Full-state snapshot read

use crate::db::{documents, scores, Store};
use crate::models::{CriterionFields, JudgeFields, ProjectFields, Snapshot};
use crate::Result;

/// Read all four collections
///
/// The reads share one transaction so the snapshot never mixes states
/// from before and after a concurrent mutation.
pub async fn load(store: &Store) -> Result<Snapshot> {
    let pool = store.pool().await?;
    let mut tx = pool.begin().await?;

    let projects = documents::fetch_all::<ProjectFields>(&mut *tx).await?;
    let judges = documents::fetch_all::<JudgeFields>(&mut *tx).await?;
    let criteria = documents::fetch_all::<CriterionFields>(&mut *tx).await?;
    let scores = scores::fetch_all(&mut *tx).await?;

    tx.commit().await?;

    Ok(Snapshot {
        projects,
        judges,
        criteria,
        scores,
    })
}
