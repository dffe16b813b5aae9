//! Server-Sent Events decoding
//!
//! Incremental parser for `text/event-stream` bodies. Chunks may split
//! lines (or UTF-8 sequences) anywhere; complete frames are emitted once
//! their terminating blank line arrives.

use crate::error::ViewerError;
use futures::stream::{Stream, StreamExt};
use hackjudge_common::events::JudgingEvent;
use std::fmt::Display;
use tracing::debug;

/// Event name carrying a full snapshot
pub const DATA_UPDATE: &str = "DATA_UPDATE";

/// One dispatched SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Line-buffered SSE parser
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    last_id: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk, returning every frame it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&raw);
            if let Some(frame) = self.process_line(text.trim_end_matches(['\n', '\r'])) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // comment / keep-alive
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event,
            id: self.last_id.clone(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

/// Decode a byte stream into `DATA_UPDATE` events
///
/// Frames with other event names are skipped. A transport error is yielded
/// once and ends the stream.
pub fn decode_events<S, B, E>(chunks: S) -> impl Stream<Item = Result<JudgingEvent, ViewerError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    async_stream::stream! {
        let mut decoder = SseDecoder::new();
        let mut chunks = Box::pin(chunks);

        while let Some(chunk) = chunks.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(ViewerError::Network(e.to_string()));
                    return;
                }
            };

            for frame in decoder.feed(bytes.as_ref()) {
                if frame.event.as_deref() != Some(DATA_UPDATE) {
                    debug!("SSE: ignoring {:?} event", frame.event);
                    continue;
                }
                yield serde_json::from_str::<JudgingEvent>(&frame.data)
                    .map_err(|e| ViewerError::Decode(e.to_string()));
            }
        }
    }
}
