//! Read-only traversals over the career graph
//!
//! Every operation rejects blank identifiers with
//! [`GraphError::InvalidInput`]. Missing nodes and store failures are not
//! errors here: the query logs and answers with an empty result.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use super::schema::{EdgeLabel, NodeLabel, SkillNode, SkillSummary};
use super::store::{Direction, GraphStore, StoredNode};
use crate::error::{require_id, GraphError};

/// Query engine borrowing a graph store
pub struct QueryEngine<'g, S: GraphStore + ?Sized> {
    store: &'g S,
}

impl<'g, S: GraphStore + ?Sized> QueryEngine<'g, S> {
    pub fn new(store: &'g S) -> Self {
        Self { store }
    }

    /// Shortest chain of PREREQUISITE_OF edges from `start` to `end`.
    ///
    /// Breadth-first with a visited set, so the path is length-minimal and
    /// cycles terminate. `start == end` yields the single node.
    pub fn shortest_prerequisite_path(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<SkillSummary>, GraphError> {
        require_id("start_skill_id", start)?;
        require_id("end_skill_id", end)?;
        Ok(self.or_empty("shortest_prerequisite_path", self.bfs_path(start, end)))
    }

    /// Skills a role REQUIRES, one hop, ordered by id
    pub fn direct_required_skills(&self, role: &str) -> Result<Vec<SkillSummary>, GraphError> {
        require_id("role_name", role)?;
        let nodes = self.neighbors(EdgeLabel::Requires, role, Direction::Outgoing);
        Ok(self.or_empty("direct_required_skills", nodes.map(summaries)))
    }

    /// Skills with a PREREQUISITE_OF edge pointing at `skill`, ordered by id
    pub fn direct_prerequisites(&self, skill: &str) -> Result<Vec<SkillSummary>, GraphError> {
        require_id("skill_id", skill)?;
        let nodes = self.neighbors(EdgeLabel::PrerequisiteOf, skill, Direction::Incoming);
        Ok(self.or_empty("direct_prerequisites", nodes.map(summaries)))
    }

    /// Follow LEADS_TO from `role` along a single chain.
    ///
    /// At each step the first outgoing edge (merge order) whose target is
    /// not already on the path is taken. A role without successors yields
    /// `[role]`; an unknown role yields nothing.
    pub fn career_progression(&self, role: &str) -> Result<Vec<String>, GraphError> {
        require_id("role_name", role)?;
        Ok(self.or_empty("career_progression", self.progression(role)))
    }

    /// Every skill that must be learned before `skill`, nearest first.
    ///
    /// Reverse breadth-first search over PREREQUISITE_OF; ties within a hop
    /// distance are ordered by id. The target itself is never listed.
    pub fn transitive_prerequisites(&self, skill: &str) -> Result<Vec<SkillSummary>, GraphError> {
        require_id("skill_id", skill)?;
        Ok(self.or_empty("transitive_prerequisites", self.reverse_closure(skill)))
    }

    /// Names of tools a role USES, sorted
    pub fn role_tools(&self, role: &str) -> Result<Vec<String>, GraphError> {
        require_id("role_name", role)?;
        let tools = self
            .neighbors(EdgeLabel::Uses, role, Direction::Outgoing)
            .map(|nodes| {
                let mut names: Vec<String> = nodes.into_iter().map(|n| n.key).collect();
                names.sort();
                names.dedup();
                names
            });
        Ok(self.or_empty("role_tools", tools))
    }

    fn neighbors(&self, edge: EdgeLabel, key: &str, direction: Direction) -> Result<Vec<StoredNode>> {
        self.store.refresh()?;
        self.store.neighbors(edge, key, direction)
    }

    fn or_empty<T: Default>(&self, op: &str, result: Result<T>) -> T {
        result.unwrap_or_else(|e| {
            tracing::warn!(op, error = %e, "graph query failed, returning empty result");
            T::default()
        })
    }

    fn bfs_path(&self, start: &str, end: &str) -> Result<Vec<SkillSummary>> {
        self.store.refresh()?;
        let (Some(first), Some(last)) = (
            self.store.get_node(NodeLabel::Skill, start)?,
            self.store.get_node(NodeLabel::Skill, end)?,
        ) else {
            return Ok(Vec::new());
        };
        if start == end {
            return Ok(vec![summary(&first)]);
        }

        let mut seen: HashMap<String, StoredNode> = HashMap::new();
        let mut parent: HashMap<String, String> = HashMap::new();
        let mut queue = VecDeque::new();
        seen.insert(first.key.clone(), first);
        queue.push_back(start.to_string());

        while let Some(current) = queue.pop_front() {
            for next in self
                .store
                .neighbors(EdgeLabel::PrerequisiteOf, &current, Direction::Outgoing)?
            {
                if seen.contains_key(&next.key) {
                    continue;
                }
                parent.insert(next.key.clone(), current.clone());
                if next.key == last.key {
                    let mut chain = vec![summary(&next)];
                    let mut cursor = &next.key;
                    while let Some(prev) = parent.get(cursor) {
                        if let Some(node) = seen.get(prev) {
                            chain.push(summary(node));
                        }
                        cursor = prev;
                    }
                    chain.reverse();
                    return Ok(chain);
                }
                queue.push_back(next.key.clone());
                seen.insert(next.key.clone(), next);
            }
        }
        Ok(Vec::new())
    }

    fn progression(&self, role: &str) -> Result<Vec<String>> {
        self.store.refresh()?;
        if self.store.get_node(NodeLabel::Role, role)?.is_none() {
            return Ok(Vec::new());
        }

        let mut path = vec![role.to_string()];
        let mut on_path: HashSet<String> = HashSet::from([role.to_string()]);
        loop {
            let Some(current) = path.last() else { break };
            let next = self
                .store
                .neighbors(EdgeLabel::LeadsTo, current, Direction::Outgoing)?
                .into_iter()
                .find(|n| !on_path.contains(&n.key));
            match next {
                Some(node) => {
                    on_path.insert(node.key.clone());
                    path.push(node.key);
                }
                None => break,
            }
        }
        Ok(path)
    }

    fn reverse_closure(&self, skill: &str) -> Result<Vec<SkillSummary>> {
        self.store.refresh()?;
        let mut visited: HashSet<String> = HashSet::from([skill.to_string()]);
        let mut ordered = Vec::new();
        let mut frontier = vec![skill.to_string()];

        while !frontier.is_empty() {
            let mut level: BTreeMap<String, StoredNode> = BTreeMap::new();
            for key in &frontier {
                for node in self
                    .store
                    .neighbors(EdgeLabel::PrerequisiteOf, key, Direction::Incoming)?
                {
                    if !visited.contains(&node.key) {
                        level.insert(node.key.clone(), node);
                    }
                }
            }
            frontier = level.keys().cloned().collect();
            for (key, node) in level {
                visited.insert(key);
                ordered.push(summary(&node));
            }
        }
        Ok(ordered)
    }
}

/// Typed view of a Skill node. Bare or foreign payloads fall back to the key.
fn summary(node: &StoredNode) -> SkillSummary {
    match node.decode::<SkillNode>() {
        Ok(skill) => skill.into(),
        Err(e) => {
            tracing::debug!(key = %node.key, error = %e, "skill payload not decodable");
            SkillNode::bare(&node.key).into()
        }
    }
}

/// Deduplicated summaries ordered by id
fn summaries(nodes: Vec<StoredNode>) -> Vec<SkillSummary> {
    let unique: BTreeMap<String, SkillSummary> = nodes
        .iter()
        .map(|node| (node.key.clone(), summary(node)))
        .collect();
    unique.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::memory::MemoryGraphStore;
    use crate::graph::schema::RoleNode;
    use crate::graph::store::merge_payload;
    use serde_json::json;

    fn skill(store: &MemoryGraphStore, id: &str) {
        merge_payload(store, &SkillNode::bare(id)).unwrap();
    }

    fn prereq(store: &MemoryGraphStore, from: &str, to: &str) {
        store
            .merge_edge(EdgeLabel::PrerequisiteOf, from, to, json!({}))
            .unwrap();
    }

    fn role(store: &MemoryGraphStore, name: &str) {
        merge_payload(
            store,
            &RoleNode {
                name: name.to_string(),
                category: String::new(),
                experience_level: String::new(),
            },
        )
        .unwrap();
    }

    fn ids(skills: &[SkillSummary]) -> Vec<&str> {
        skills.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn test_shortest_path_prefers_shortcut() {
        let store = MemoryGraphStore::new();
        for id in ["a", "b", "c", "d"] {
            skill(&store, id);
        }
        prereq(&store, "a", "b");
        prereq(&store, "b", "c");
        prereq(&store, "c", "d");
        prereq(&store, "a", "d");

        let path = QueryEngine::new(&store).shortest_prerequisite_path("a", "d").unwrap();
        assert_eq!(ids(&path), vec!["a", "d"]);
    }

    #[test]
    fn test_shortest_path_on_cycle_terminates() {
        let store = MemoryGraphStore::new();
        skill(&store, "a");
        skill(&store, "b");
        prereq(&store, "a", "b");
        prereq(&store, "b", "a");

        let engine = QueryEngine::new(&store);
        assert_eq!(ids(&engine.shortest_prerequisite_path("a", "a").unwrap()), vec!["a"]);
        assert_eq!(ids(&engine.shortest_prerequisite_path("b", "a").unwrap()), vec!["b", "a"]);
    }

    #[test]
    fn test_shortest_path_absent_nodes_and_no_path() {
        let store = MemoryGraphStore::new();
        skill(&store, "x");
        skill(&store, "y");
        prereq(&store, "y", "x");

        let engine = QueryEngine::new(&store);
        assert!(engine.shortest_prerequisite_path("x", "y").unwrap().is_empty());
        assert!(engine.shortest_prerequisite_path("x", "ghost").unwrap().is_empty());
        assert!(engine.shortest_prerequisite_path("ghost", "ghost").unwrap().is_empty());
    }

    #[test]
    fn test_blank_ids_are_invalid_input() {
        let store = MemoryGraphStore::new();
        let engine = QueryEngine::new(&store);
        assert!(matches!(
            engine.shortest_prerequisite_path("", "b"),
            Err(GraphError::InvalidInput { .. })
        ));
        assert!(engine.direct_required_skills(" ").is_err());
        assert!(engine.career_progression("").is_err());
        assert!(engine.direct_prerequisites("").is_err());
        assert!(engine.transitive_prerequisites("").is_err());
        assert!(engine.role_tools("").is_err());
    }

    #[test]
    fn test_career_progression_takes_first_edge_and_stops_on_cycle() {
        let store = MemoryGraphStore::new();
        for name in ["Junior", "Mid", "Senior", "Manager"] {
            role(&store, name);
        }
        store.merge_edge(EdgeLabel::LeadsTo, "Junior", "Mid", json!({})).unwrap();
        store.merge_edge(EdgeLabel::LeadsTo, "Mid", "Senior", json!({})).unwrap();
        store.merge_edge(EdgeLabel::LeadsTo, "Mid", "Manager", json!({})).unwrap();
        store.merge_edge(EdgeLabel::LeadsTo, "Senior", "Junior", json!({})).unwrap();

        let engine = QueryEngine::new(&store);
        assert_eq!(
            engine.career_progression("Junior").unwrap(),
            vec!["Junior", "Mid", "Senior"]
        );
        assert_eq!(engine.career_progression("Manager").unwrap(), vec!["Manager"]);
        assert!(engine.career_progression("Astronaut").unwrap().is_empty());
    }

    #[test]
    fn test_transitive_prerequisites_by_distance_then_id() {
        let store = MemoryGraphStore::new();
        for id in ["spark", "python", "scala", "basics", "math"] {
            skill(&store, id);
        }
        prereq(&store, "python", "spark");
        prereq(&store, "scala", "spark");
        prereq(&store, "basics", "python");
        prereq(&store, "math", "scala");
        prereq(&store, "spark", "basics");

        let closure = QueryEngine::new(&store).transitive_prerequisites("spark").unwrap();
        assert_eq!(ids(&closure), vec!["python", "scala", "basics", "math"]);
    }
}
