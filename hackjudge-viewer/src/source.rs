//! Where snapshots come from
//!
//! The viewer only depends on the traits; [`HttpSource`] talks to a running
//! hackjudge-api over HTTP.

use crate::error::ViewerError;
use crate::sse;
use futures::stream::{BoxStream, StreamExt};
use hackjudge_common::events::JudgingEvent;
use hackjudge_common::Snapshot;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("hackjudge-viewer/", env!("CARGO_PKG_VERSION"));

/// Stream of pushed events for one connection
pub type EventStream = BoxStream<'static, Result<JudgingEvent, ViewerError>>;

/// Pull side: fetch the full current snapshot
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, ViewerError>> + Send;
}

/// Push side: open a stream of snapshot events
pub trait EventSource: SnapshotSource {
    fn subscribe(&self) -> impl Future<Output = Result<EventStream, ViewerError>> + Send;
}

/// Error body returned by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for a hackjudge-api server
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:3001`)
    pub fn new(base_url: impl Into<String>) -> Result<Self, ViewerError> {
        // No overall timeout on the client: it would cut the SSE stream
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success response into `ViewerError::Status`
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ViewerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ViewerError::Status {
        status: status.as_u16(),
        message,
    })
}

impl SnapshotSource for HttpSource {
    async fn fetch(&self) -> Result<Snapshot, ViewerError> {
        let url = self.url("/api/data");
        debug!(url = %url, "Fetching snapshot");

        let response = self
            .client
            .get(&url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await?;
        let response = check_status(response).await?;

        response
            .json::<Snapshot>()
            .await
            .map_err(|e| ViewerError::Decode(e.to_string()))
    }
}

impl EventSource for HttpSource {
    async fn subscribe(&self) -> Result<EventStream, ViewerError> {
        let url = self.url("/api/events");
        debug!(url = %url, "Opening event stream");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = check_status(response).await?;

        Ok(sse::decode_events(response.bytes_stream()).boxed())
    }
}
