//! HTTP API handlers for hackjudge-api

pub mod data;
pub mod documents;
pub mod error;
pub mod health;
pub mod results;
pub mod scores;
pub mod sse;

pub use data::get_snapshot;
pub use error::ApiError;
pub use health::health_routes;
pub use results::{get_results, judge_projects};
pub use scores::{delete_score, list_scores, upsert_score};
pub use sse::event_stream;

use std::future::Future;

/// Run a mutation on its own task so it completes even if the client
/// disconnects mid-request
pub(crate) async fn detached<T, F>(mutation: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(mutation).await.map_err(|e| {
        ApiError::from(hackjudge_common::Error::Storage(format!(
            "mutation task failed: {}",
            e
        )))
    })?
}
