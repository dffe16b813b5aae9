//! Full-state snapshot

use super::{Criterion, Judge, Project, Score};
use crate::uuid_utils::same_reference;
use serde::{Deserialize, Serialize};

/// All four collections as served by the "fetch everything" endpoint
///
/// Viewers replace their local state with a snapshot wholesale; there is
/// no merge step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub judges: Vec<Judge>,
    #[serde(default)]
    pub criteria: Vec<Criterion>,
    #[serde(default)]
    pub scores: Vec<Score>,
}

impl Snapshot {
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn judge(&self, id: &str) -> Option<&Judge> {
        self.judges.iter().find(|j| j.id == id)
    }

    pub fn scores_for_project<'a>(&'a self, project_id: &'a str) -> impl Iterator<Item = &'a Score> {
        self.scores
            .iter()
            .filter(move |s| same_reference(&s.project_id, project_id))
    }

    /// Projects a judge is eligible to score
    pub fn projects_for_judge<'a>(&'a self, judge: &'a Judge) -> impl Iterator<Item = &'a Project> {
        self.projects
            .iter()
            .filter(move |p| judge.fields.evaluates(&p.fields.track))
    }

    /// One-line description used in logs
    pub fn summary(&self) -> String {
        format!(
            "{} projects, {} judges, {} criteria, {} scores",
            self.projects.len(),
            self.judges.len(),
            self.criteria.len(),
            self.scores.len()
        )
    }
}
