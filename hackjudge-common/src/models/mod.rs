//! Document models
//!
//! Projects, judges and criteria are stored as documents keyed by a
//! server-assigned UUID; scores are keyed by a client-supplied id. Every
//! document leaves the data access layer with exactly one `id` field.

mod criterion;
mod judge;
mod project;
mod score;
mod snapshot;
mod track;

pub use criterion::{Criterion, CriterionFields, CriterionPatch, DEFAULT_WEIGHT};
pub use judge::{Judge, JudgeFields, JudgePatch};
pub use project::{Project, ProjectFields, ProjectPatch};
pub use score::Score;
pub use snapshot::Snapshot;
pub use track::Track;

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four document collections held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Judges,
    Criteria,
    Scores,
}

impl Collection {
    /// Backing table name
    pub fn table(self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Judges => "judges",
            Collection::Criteria => "criteria",
            Collection::Scores => "scores",
        }
    }

    /// Singular noun used in error messages and logs
    pub fn singular(self) -> &'static str {
        match self {
            Collection::Projects => "project",
            Collection::Judges => "judge",
            Collection::Criteria => "criterion",
            Collection::Scores => "score",
        }
    }
}

/// A stored document with its external identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,
    #[serde(flatten)]
    pub fields: T,
}

/// Field set of a server-keyed entity
///
/// `Patch` is the partial field set accepted by updates; it serializes to a
/// JSON merge patch containing only the fields being changed.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    type Patch: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Reject field sets that must never be stored
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Reject patches that would leave a stored document invalid
    fn validate_patch(_patch: &Self::Patch) -> Result<()> {
        Ok(())
    }

    /// Drop client-supplied keys that the store owns
    fn strip_reserved(&mut self) {}
}

/// Create payloads accept either a single document or an array of them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: DeserializeOwned> OneOrMany<T> {
    /// Decode a request body, reporting the failing field precisely
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    serde_json::from_value(item)
                        .map_err(|e| Error::validation(format!("item {}: {}", i, e)))
                })
                .collect::<Result<Vec<T>>>()
                .map(OneOrMany::Many),
            Value::Object(_) => serde_json::from_value(value)
                .map(OneOrMany::One)
                .map_err(|e| Error::validation(e.to_string())),
            other => Err(Error::validation(format!(
                "expected an object or an array of objects, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }

    pub fn is_one(&self) -> bool {
        matches!(self, OneOrMany::One(_))
    }

    /// Rebuild a response in the shape of the request
    ///
    /// `one` is honored only when exactly one item is present.
    pub fn from_vec(mut items: Vec<T>, one: bool) -> Self {
        if one && items.len() == 1 {
            OneOrMany::One(items.remove(0))
        } else {
            OneOrMany::Many(items)
        }
    }
}

/// Human-readable JSON type name
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
