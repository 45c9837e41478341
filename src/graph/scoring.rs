//! Coverage scoring
//!
//! For each Field or Role with at least one required skill, the share of
//! its required skills present in a [`SkillProfile`]. A Field's required
//! skills are the sources of its incoming REQUIRED_FOR edges; a Role's are
//! the targets of its REQUIRES edges.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use super::schema::{EdgeLabel, NodeLabel};
use super::store::{Direction, GraphStore};
use crate::error::{require_id, GraphError};

/// Missing skills carried by each recommendation
pub const MAX_MISSING_PREVIEW: usize = 5;

/// Which node kinds are scored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageTarget {
    Fields,
    Roles,
    #[default]
    All,
}

impl CoverageTarget {
    fn labels(self) -> &'static [NodeLabel] {
        match self {
            CoverageTarget::Fields => &[NodeLabel::Field],
            CoverageTarget::Roles => &[NodeLabel::Role],
            CoverageTarget::All => &[NodeLabel::Field, NodeLabel::Role],
        }
    }
}

/// A validated, unordered set of skill ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProfile {
    skills: BTreeSet<String>,
}

impl SkillProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a profile, rejecting blank ids. Duplicates collapse.
    pub fn from_ids<I, T>(ids: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut profile = Self::new();
        for id in ids {
            profile.insert(id)?;
        }
        Ok(profile)
    }

    pub fn insert(&mut self, id: impl Into<String>) -> Result<bool, GraphError> {
        let id = id.into();
        require_id("skill_id", &id)?;
        Ok(self.skills.insert(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.skills.contains(id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.skills.iter().map(String::as_str)
    }
}

/// Coverage of one Field or Role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageScore {
    pub node_name: String,
    pub kind: NodeLabel,
    /// Percentage in `[0, 100]`, one decimal place
    pub score_percent: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub total_required: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub node_name: String,
    pub kind: NodeLabel,
    pub score_percent: f64,
    pub matched_skills: Vec<String>,
    /// First few missing skills, in the order the graph returned them
    pub skills_to_learn: Vec<String>,
}

impl From<CoverageScore> for Recommendation {
    fn from(score: CoverageScore) -> Self {
        let mut skills_to_learn = score.missing_skills;
        skills_to_learn.truncate(MAX_MISSING_PREVIEW);
        Recommendation {
            node_name: score.node_name,
            kind: score.kind,
            score_percent: score.score_percent,
            matched_skills: score.matched_skills,
            skills_to_learn,
        }
    }
}

pub struct ScoringEngine<'g, S: GraphStore + ?Sized> {
    store: &'g S,
    target: CoverageTarget,
}

impl<'g, S: GraphStore + ?Sized> ScoringEngine<'g, S> {
    pub fn new(store: &'g S) -> Self {
        Self {
            store,
            target: CoverageTarget::default(),
        }
    }

    pub fn with_target(mut self, target: CoverageTarget) -> Self {
        self.target = target;
        self
    }

    /// Score every eligible node, best first.
    ///
    /// Ordered by score descending, then name ascending, then kind (Field
    /// before Role). Nodes without required skills are left out. A store
    /// failure is logged and yields an empty ranking.
    pub fn evaluate(&self, profile: &SkillProfile) -> Vec<CoverageScore> {
        match self.score_all(profile) {
            Ok(mut scores) => {
                scores.sort_by(ranking);
                scores
            }
            Err(e) => {
                tracing::warn!(error = %e, "coverage scoring failed, returning empty result");
                Vec::new()
            }
        }
    }

    /// Entries scoring strictly above `min_score_percent`, at most `limit`
    pub fn top_recommendations(
        &self,
        profile: &SkillProfile,
        limit: usize,
        min_score_percent: f64,
    ) -> Vec<Recommendation> {
        self.evaluate(profile)
            .into_iter()
            .filter(|score| score.score_percent > min_score_percent)
            .take(limit)
            .map(Recommendation::from)
            .collect()
    }

    fn score_all(&self, profile: &SkillProfile) -> Result<Vec<CoverageScore>> {
        self.store.refresh()?;
        let mut scores = Vec::new();
        for &label in self.target.labels() {
            for node in self.store.nodes(label)? {
                let required = self.required_skills(label, &node.key)?;
                if let Some(score) = score_node(node.key, label, required, profile) {
                    scores.push(score);
                }
            }
        }
        tracing::debug!(scored = scores.len(), profile = profile.len(), "coverage evaluated");
        Ok(scores)
    }

    fn required_skills(&self, label: NodeLabel, key: &str) -> Result<Vec<String>> {
        let nodes = match label {
            NodeLabel::Field => {
                self.store
                    .neighbors(EdgeLabel::RequiredFor, key, Direction::Incoming)?
            }
            _ => self
                .store
                .neighbors(EdgeLabel::Requires, key, Direction::Outgoing)?,
        };
        let mut seen = HashSet::new();
        Ok(nodes
            .into_iter()
            .map(|n| n.key)
            .filter(|k| seen.insert(k.clone()))
            .collect())
    }
}

fn score_node(
    name: String,
    kind: NodeLabel,
    required: Vec<String>,
    profile: &SkillProfile,
) -> Option<CoverageScore> {
    let total = required.len();
    if total == 0 {
        return None;
    }
    let (matched, missing): (Vec<String>, Vec<String>) =
        required.into_iter().partition(|id| profile.contains(id));
    let raw = matched.len() as f64 / total as f64 * 100.0;
    Some(CoverageScore {
        node_name: name,
        kind,
        score_percent: (raw * 10.0).round() / 10.0,
        matched_skills: matched,
        missing_skills: missing,
        total_required: total,
    })
}

fn kind_rank(kind: NodeLabel) -> u8 {
    match kind {
        NodeLabel::Field => 0,
        NodeLabel::Role => 1,
        _ => 2,
    }
}

fn ranking(a: &CoverageScore, b: &CoverageScore) -> Ordering {
    b.score_percent
        .total_cmp(&a.score_percent)
        .then_with(|| a.node_name.cmp(&b.node_name))
        .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
}
