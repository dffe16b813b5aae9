//! Score documents
//!
//! Unlike other entities a score is keyed by a client-generated id, so a
//! judge resubmitting the same sheet overwrites rather than duplicates.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: String,
    pub project_id: String,
    pub judge_id: String,
    /// Criterion id to awarded value, kept as submitted
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scores: BTreeMap<String, Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Score {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("id", &self.id),
            ("projectId", &self.project_id),
            ("judgeId", &self.judge_id),
        ] {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("score {} must not be empty", field)));
            }
        }
        Ok(())
    }

    /// Sum of awarded values, each multiplied by its criterion weight
    pub fn weighted_total<F>(&self, weight_of: F) -> f64
    where
        F: Fn(&str) -> f64,
    {
        self.scores
            .iter()
            .map(|(criterion_id, value)| value.as_f64().unwrap_or(0.0) * weight_of(criterion_id))
            .sum()
    }
}
