//! Project documents

use super::{Collection, Entity, Record, Track};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Project as returned to clients
pub type Project = Record<ProjectFields>;

/// Stored field set of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFields {
    pub name: String,
    pub track: Track,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Team member names
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<String>,
    /// Table or booth where the team presents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial update of a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<Track>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity for ProjectFields {
    const COLLECTION: Collection = Collection::Projects;

    type Patch = ProjectPatch;

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("project name must not be empty"));
        }
        Ok(())
    }

    fn validate_patch(patch: &ProjectPatch) -> Result<()> {
        if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
            return Err(Error::validation("project name must not be empty"));
        }
        Ok(())
    }

    fn strip_reserved(&mut self) {
        self.extra.remove("id");
    }
}
