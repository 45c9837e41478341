//! Person profiles
//!
//! Person nodes and their HAS_SKILL edges. Profiles link only to skills the
//! taxonomy already knows, and they outlive taxonomy rebuilds.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

use super::schema::{EdgeLabel, NodeLabel, PersonNode, SkillNode, SkillSummary};
use super::scoring::SkillProfile;
use super::store::{merge_payload, Direction, GraphStore};
use crate::error::{require_id, GraphError};

/// Outcome of `create_profile`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub person_id: String,
    /// Skill ids linked with HAS_SKILL
    pub linked: Vec<String>,
    /// Skill ids not present in the graph
    pub unknown: Vec<String>,
}

/// A person sharing skills with a queried profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarProfile {
    pub id: String,
    pub name: String,
    pub common_skills: usize,
}

pub struct ProfileOps<'g, S: GraphStore + ?Sized> {
    store: &'g S,
}

impl<'g, S: GraphStore + ?Sized> ProfileOps<'g, S> {
    pub fn new(store: &'g S) -> Self {
        Self { store }
    }

    /// Merge a Person node and link it to the known skills of `skills`.
    ///
    /// Links are additive: merging an existing person again keeps the skills
    /// linked before. Store failures are returned, not swallowed.
    pub fn create_profile(
        &self,
        person_id: &str,
        name: &str,
        skills: &SkillProfile,
    ) -> Result<ProfileReport, GraphError> {
        require_id("person_id", person_id)?;
        let person = PersonNode {
            id: person_id.to_string(),
            name: name.to_string(),
        };
        self.store.refresh().map_err(GraphError::from_store)?;
        merge_payload(self.store, &person).map_err(GraphError::from_store)?;

        let mut report = ProfileReport {
            person_id: person_id.to_string(),
            ..Default::default()
        };
        for skill_id in skills.iter() {
            let known = self
                .store
                .get_node(NodeLabel::Skill, skill_id)
                .map_err(GraphError::from_store)?
                .is_some();
            if !known {
                report.unknown.push(skill_id.to_string());
                continue;
            }
            self.store
                .merge_edge(EdgeLabel::HasSkill, person_id, skill_id, json!({}))
                .map_err(GraphError::from_store)?;
            report.linked.push(skill_id.to_string());
        }

        tracing::info!(
            person_id,
            linked = report.linked.len(),
            unknown = report.unknown.len(),
            "profile stored"
        );
        Ok(report)
    }

    /// Skills linked to a person, ordered by id. Unknown person: empty.
    pub fn profile_skills(&self, person_id: &str) -> Result<Vec<SkillSummary>, GraphError> {
        require_id("person_id", person_id)?;
        let nodes = match self
            .store
            .refresh()
            .and_then(|_| self.store.neighbors(EdgeLabel::HasSkill, person_id, Direction::Outgoing))
        {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!(person_id, error = %e, "profile lookup failed, returning empty result");
                return Ok(Vec::new());
            }
        };
        let mut skills: Vec<SkillSummary> = nodes
            .into_iter()
            .map(|node| {
                node.decode::<SkillNode>()
                    .map(SkillSummary::from)
                    .unwrap_or_else(|_| SkillNode::bare(&node.key).into())
            })
            .collect();
        skills.sort();
        skills.dedup_by(|a, b| a.id == b.id);
        Ok(skills)
    }

    /// A person's skills as a scoring profile
    pub fn profile_of(&self, person_id: &str) -> Result<SkillProfile, GraphError> {
        let skills = self.profile_skills(person_id)?;
        SkillProfile::from_ids(skills.into_iter().map(|s| s.id))
    }

    /// People sharing at least one skill with `profile`.
    ///
    /// Ordered by shared-skill count descending, then person id.
    pub fn similar_profiles(&self, profile: &SkillProfile, limit: usize) -> Vec<SimilarProfile> {
        if let Err(e) = self.store.refresh() {
            tracing::warn!(error = %e, "similar profile lookup failed");
            return Vec::new();
        }
        let mut shared: HashMap<String, SimilarProfile> = HashMap::new();
        for skill_id in profile.iter() {
            let people = match self
                .store
                .neighbors(EdgeLabel::HasSkill, skill_id, Direction::Incoming)
            {
                Ok(people) => people,
                Err(e) => {
                    tracing::warn!(skill_id, error = %e, "similar profile lookup failed");
                    return Vec::new();
                }
            };
            for person in people {
                let name = person
                    .decode::<PersonNode>()
                    .map(|p| p.name)
                    .unwrap_or_default();
                shared
                    .entry(person.key.clone())
                    .or_insert_with(|| SimilarProfile {
                        id: person.key,
                        name,
                        common_skills: 0,
                    })
                    .common_skills += 1;
            }
        }

        let mut similar: Vec<SimilarProfile> = shared.into_values().collect();
        similar.sort_by(|a, b| {
            b.common_skills
                .cmp(&a.common_skills)
                .then_with(|| a.id.cmp(&b.id))
        });
        similar.truncate(limit);
        similar
    }

    /// Delete every Person node and its HAS_SKILL edges
    pub fn clear_profiles(&self) -> Result<usize, GraphError> {
        let removed = self
            .store
            .refresh()
            .and_then(|_| self.store.delete_nodes(NodeLabel::Person))
            .map_err(GraphError::from_store)?;
        tracing::info!(removed, "profiles cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryGraphStore;

    fn seeded() -> MemoryGraphStore {
        let store = MemoryGraphStore::new();
        for id in ["python", "sql", "spark"] {
            merge_payload(&store, &SkillNode::bare(id)).unwrap();
        }
        store
    }

    #[test]
    fn test_create_profile_reports_unknown_skills() {
        let store = seeded();
        let ops = ProfileOps::new(&store);
        let skills = SkillProfile::from_ids(["sql", "cobol", "python"]).unwrap();

        let report = ops.create_profile("p1", "Ada", &skills).unwrap();
        assert_eq!(report.linked, vec!["python", "sql"]);
        assert_eq!(report.unknown, vec!["cobol"]);
        assert_eq!(store.count_nodes(NodeLabel::Skill).unwrap(), 3);

        let ids: Vec<String> = ops.profile_skills("p1").unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["python", "sql"]);
        assert!(ops.profile_of("p1").unwrap().contains("sql"));
        assert!(ops.profile_skills("nobody").unwrap().is_empty());
    }

    #[test]
    fn test_similar_profiles_ranking() {
        let store = seeded();
        let ops = ProfileOps::new(&store);
        ops.create_profile("b", "Bo", &SkillProfile::from_ids(["sql"]).unwrap())
            .unwrap();
        ops.create_profile("a", "Al", &SkillProfile::from_ids(["sql"]).unwrap())
            .unwrap();
        ops.create_profile("c", "Cy", &SkillProfile::from_ids(["sql", "spark"]).unwrap())
            .unwrap();

        let query = SkillProfile::from_ids(["sql", "spark"]).unwrap();
        let similar = ops.similar_profiles(&query, 10);
        let order: Vec<(&str, usize)> = similar
            .iter()
            .map(|p| (p.id.as_str(), p.common_skills))
            .collect();
        assert_eq!(order, vec![("c", 2), ("a", 1), ("b", 1)]);
        assert_eq!(similar[0].name, "Cy");
        assert_eq!(ops.similar_profiles(&query, 1).len(), 1);
    }

    #[test]
    fn test_clear_profiles() {
        let store = seeded();
        let ops = ProfileOps::new(&store);
        ops.create_profile("p1", "Ada", &SkillProfile::from_ids(["sql"]).unwrap())
            .unwrap();
        assert_eq!(ops.clear_profiles().unwrap(), 1);
        assert_eq!(store.count_edges(EdgeLabel::HasSkill).unwrap(), 0);
        assert!(ops.create_profile("", "Nobody", &SkillProfile::new()).is_err());
    }
}
