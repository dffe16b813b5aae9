//! Scoring criteria

use super::{Collection, Entity, Record};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Weight applied when a criterion does not specify one
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Criterion as returned to clients
pub type Criterion = Record<CriterionFields>;

/// Stored field set of a criterion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionFields {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_weight() -> f64 {
    DEFAULT_WEIGHT
}

/// Partial update of a criterion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn check_weight(weight: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::validation(format!(
            "criterion weight must be a non-negative number, got {}",
            weight
        )));
    }
    Ok(())
}

impl Entity for CriterionFields {
    const COLLECTION: Collection = Collection::Criteria;

    type Patch = CriterionPatch;

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("criterion name must not be empty"));
        }
        check_weight(self.weight)
    }

    fn validate_patch(patch: &CriterionPatch) -> Result<()> {
        if matches!(&patch.name, Some(name) if name.trim().is_empty()) {
            return Err(Error::validation("criterion name must not be empty"));
        }
        patch.weight.map(check_weight).transpose()?;
        Ok(())
    }

    fn strip_reserved(&mut self) {
        self.extra.remove("id");
    }
}
