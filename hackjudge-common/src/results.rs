//! Results aggregation
//!
//! Turns a snapshot into per-track standings. A score's weighted total is
//! the sum of its criterion values times the criterion weight; a project's
//! standing is the mean weighted total over all scores it received.
//! Criteria that no longer exist weigh `DEFAULT_WEIGHT`.

use crate::models::{Snapshot, Track, DEFAULT_WEIGHT};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Aggregated standing of one project
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResult {
    pub project_id: String,
    pub name: String,
    pub track: Track,
    /// Distinct judges with at least one score for the project
    pub judge_count: usize,
    pub score_count: usize,
    pub average: f64,
    /// 1-based position within the track
    pub rank: usize,
}

/// Standings of one track, best first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackResults {
    pub track: Track,
    pub projects: Vec<ProjectResult>,
}

/// Compute standings for every track that has at least one project
pub fn aggregate(snapshot: &Snapshot) -> Vec<TrackResults> {
    let weights: HashMap<&str, f64> = snapshot
        .criteria
        .iter()
        .map(|c| (c.id.as_str(), c.fields.weight))
        .collect();
    let weight_of = |criterion_id: &str| weights.get(criterion_id).copied().unwrap_or(DEFAULT_WEIGHT);

    let mut by_track: BTreeMap<Track, Vec<ProjectResult>> = BTreeMap::new();
    for project in &snapshot.projects {
        let mut judges = BTreeSet::new();
        let mut total = 0.0;
        let mut score_count = 0;
        for score in snapshot.scores_for_project(&project.id) {
            judges.insert(score.judge_id.as_str());
            total += score.weighted_total(&weight_of);
            score_count += 1;
        }
        let average = if score_count == 0 {
            0.0
        } else {
            total / score_count as f64
        };

        by_track
            .entry(project.fields.track.clone())
            .or_default()
            .push(ProjectResult {
                project_id: project.id.clone(),
                name: project.fields.name.clone(),
                track: project.fields.track.clone(),
                judge_count: judges.len(),
                score_count,
                average,
                rank: 0,
            });
    }

    by_track
        .into_iter()
        .map(|(track, mut projects)| {
            projects.sort_by(|a, b| {
                b.average
                    .partial_cmp(&a.average)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.name.cmp(&b.name))
            });
            for (i, result) in projects.iter_mut().enumerate() {
                result.rank = i + 1;
            }
            TrackResults { track, projects }
        })
        .collect()
}
