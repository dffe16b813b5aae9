//! Judge documents

use super::{Collection, Entity, Record, Track};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Judge as returned to clients
pub type Judge = Record<JudgeFields>;

/// Stored field set of a judge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeFields {
    pub name: String,
    /// Tracks this judge evaluates
    #[serde(default)]
    pub tracks: BTreeSet<Track>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update of a judge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<BTreeSet<Track>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JudgeFields {
    pub fn evaluates(&self, track: &Track) -> bool {
        self.tracks.contains(track)
    }
}

impl Entity for JudgeFields {
    const COLLECTION: Collection = Collection::Judges;

    type Patch = JudgePatch;

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("judge name must not be empty"));
        }
        Ok(())
    }

    fn validate_patch(patch: &JudgePatch) -> Result<()> {
        if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
            return Err(Error::validation("judge name must not be empty"));
        }
        Ok(())
    }

    fn strip_reserved(&mut self) {
        self.extra.remove("id");
    }
}
