//! Graph builder
//!
//! The only writer of the taxonomy part of the graph. A rebuild clears every
//! Skill/Role/Tool/Field node and repopulates them in a fixed order:
//!
//! 1. Skill nodes
//! 2. Role nodes
//! 3. REQUIRES edges (Role -> Skill)
//! 4. PREREQUISITE_OF edges (Skill -> Skill)
//! 5. Tool nodes and USES edges (Role -> Tool)
//! 6. LEADS_TO edges from the configured career paths
//!
//! Person nodes survive a rebuild; their HAS_SKILL edges are re-linked to
//! skills that still exist. An edge with a missing endpoint is logged,
//! recorded in the [`BuildReport`] and skipped. An unavailable store aborts
//! the pass and sets [`BuildReport::failure`].

use serde_json::json;
use std::collections::BTreeMap;

use super::schema::{EdgeLabel, NodeLabel, NodePayload, RequiredForEdge, SkillNode, ToolNode};
use super::store::{merge_payload, Direction, GraphStore, MergeOutcome};
use crate::config::CareerPath;
use crate::entity::{EntityStore, FieldRecord, RoleRecord, SkillRecord};
use crate::error::GraphError;

/// Labels cleared by a rebuild; Person nodes are kept
const REBUILT_LABELS: [NodeLabel; 4] = [
    NodeLabel::Skill,
    NodeLabel::Role,
    NodeLabel::Tool,
    NodeLabel::Field,
];

/// An edge the builder could not create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEdge {
    pub edge: EdgeLabel,
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// Outcome of a build pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Nodes created, per label
    pub nodes_created: BTreeMap<NodeLabel, usize>,
    /// Edges created, per type
    pub edges_created: BTreeMap<EdgeLabel, usize>,
    pub skipped_edges: Vec<SkippedEdge>,
    /// Records rejected by validation, with the reason
    pub rejected_records: Vec<String>,
    /// Set when the store failed; counts are then left empty
    pub failure: Option<String>,
}

impl BuildReport {
    pub fn failed(reason: impl Into<String>) -> Self {
        BuildReport {
            failure: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn nodes(&self, label: NodeLabel) -> usize {
        self.nodes_created.get(&label).copied().unwrap_or(0)
    }

    pub fn edges(&self, edge: EdgeLabel) -> usize {
        self.edges_created.get(&edge).copied().unwrap_or(0)
    }

    pub fn total_nodes(&self) -> usize {
        self.nodes_created.values().sum()
    }

    pub fn total_edges(&self) -> usize {
        self.edges_created.values().sum()
    }

    /// Fold another pass into this report
    pub fn absorb(&mut self, other: BuildReport) {
        for (label, count) in other.nodes_created {
            *self.nodes_created.entry(label).or_default() += count;
        }
        for (edge, count) in other.edges_created {
            *self.edges_created.entry(edge).or_default() += count;
        }
        self.skipped_edges.extend(other.skipped_edges);
        self.rejected_records.extend(other.rejected_records);
        if self.failure.is_none() {
            self.failure = other.failure;
        }
    }

    fn node_merged(&mut self, label: NodeLabel, outcome: MergeOutcome) {
        if outcome.is_created() {
            *self.nodes_created.entry(label).or_default() += 1;
        }
    }

    fn edge_merged(&mut self, edge: EdgeLabel, outcome: MergeOutcome) {
        if outcome.is_created() {
            *self.edges_created.entry(edge).or_default() += 1;
        }
    }
}

/// Translates entity records into graph nodes and edges
pub struct GraphBuilder<'g, S: GraphStore + ?Sized> {
    store: &'g S,
    career_paths: &'g [CareerPath],
}

impl<'g, S: GraphStore + ?Sized> GraphBuilder<'g, S> {
    pub fn new(store: &'g S, career_paths: &'g [CareerPath]) -> Self {
        Self {
            store,
            career_paths,
        }
    }

    /// Clear the taxonomy and rebuild it from `skills` and `roles`.
    ///
    /// A store failure at any step aborts the pass: the report carries the
    /// failure and no counts, and the graph may be left partially built.
    pub fn rebuild(&self, skills: &[SkillRecord], roles: &[RoleRecord]) -> BuildReport {
        match self.populate(skills, roles) {
            Ok(report) => {
                tracing::info!(
                    nodes = report.total_nodes(),
                    edges = report.total_edges(),
                    skipped = report.skipped_edges.len(),
                    "graph rebuild complete"
                );
                report
            }
            Err(e) => {
                tracing::error!(error = %e, "graph store unavailable, rebuild aborted");
                BuildReport::failed(e.to_string())
            }
        }
    }

    fn populate(
        &self,
        skills: &[SkillRecord],
        roles: &[RoleRecord],
    ) -> Result<BuildReport, GraphError> {
        self.store.refresh().map_err(GraphError::from_store)?;
        let person_links = self.snapshot_person_links()?;

        for label in REBUILT_LABELS {
            let count = self.store.delete_nodes(label).map_err(|e| {
                GraphError::StoreUnavailable(format!("failed to clear {} nodes: {:#}", label, e))
            })?;
            tracing::debug!(%label, count, "cleared nodes");
        }

        let mut report = BuildReport::default();

        let skills: Vec<&SkillRecord> = skills
            .iter()
            .filter(|s| self.accept(&mut report, "skill", &s.id, s.validate()))
            .collect();
        let roles: Vec<&RoleRecord> = roles
            .iter()
            .filter(|r| self.accept(&mut report, "role", &r.name, r.validate()))
            .collect();

        tracing::info!(count = skills.len(), "creating Skill nodes");
        for skill in &skills {
            self.merge_node(&mut report, &skill.to_node())?;
        }

        tracing::info!(count = roles.len(), "creating Role nodes");
        for role in &roles {
            self.merge_node(&mut report, &role.to_node())?;
        }

        tracing::info!("creating REQUIRES edges");
        for role in &roles {
            for required in &role.required_skills {
                self.merge_edge(&mut report, EdgeLabel::Requires, &role.name, &required.skill_id, json!({}))?;
            }
        }

        tracing::info!("creating PREREQUISITE_OF edges");
        for skill in &skills {
            for prerequisite in &skill.prerequisites {
                self.merge_edge(&mut report, EdgeLabel::PrerequisiteOf, prerequisite, &skill.id, json!({}))?;
            }
        }

        tracing::info!("creating USES edges");
        for role in &roles {
            for tool in &role.tools {
                self.merge_node(&mut report, &ToolNode { name: tool.clone() })?;
                self.merge_edge(&mut report, EdgeLabel::Uses, &role.name, tool, json!({}))?;
            }
        }

        tracing::info!(count = self.career_paths.len(), "creating LEADS_TO edges");
        for path in self.career_paths {
            self.merge_edge(&mut report, EdgeLabel::LeadsTo, &path.from, &path.to, json!({}))?;
        }

        for (person, skill_ids) in person_links {
            for skill_id in skill_ids {
                let exists = self
                    .store
                    .get_node(NodeLabel::Skill, &skill_id)
                    .map_err(GraphError::from_store)?
                    .is_some();
                if exists {
                    self.merge_edge(&mut report, EdgeLabel::HasSkill, &person, &skill_id, json!({}))?;
                } else {
                    tracing::debug!(person = %person, skill_id = %skill_id, "skill gone, profile link dropped");
                }
            }
        }

        Ok(report)
    }

    /// Merge Field nodes and their REQUIRED_FOR edges without clearing.
    ///
    /// A skill listed by a field but absent from the graph gets a bare Skill
    /// node first, so the edge always has both endpoints. A store failure
    /// aborts the pass like it does for [`GraphBuilder::rebuild`].
    pub fn load_fields(&self, fields: &[FieldRecord]) -> BuildReport {
        match self.populate_fields(fields) {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "graph store unavailable, field load aborted");
                BuildReport::failed(e.to_string())
            }
        }
    }

    fn populate_fields(&self, fields: &[FieldRecord]) -> Result<BuildReport, GraphError> {
        self.store.refresh().map_err(GraphError::from_store)?;
        let mut report = BuildReport::default();

        tracing::info!(count = fields.len(), "loading Field nodes");
        for field in fields {
            if !self.accept(&mut report, "field", &field.name, field.validate()) {
                continue;
            }
            self.merge_node(&mut report, &field.to_node())?;

            let level = match serde_json::to_value(RequiredForEdge { level: field.level }) {
                Ok(v) => v,
                Err(e) => {
                    report.rejected_records.push(format!("field '{}': {}", field.name, e));
                    continue;
                }
            };

            for skill_id in &field.skills {
                let exists = self
                    .store
                    .get_node(NodeLabel::Skill, skill_id)
                    .map_err(GraphError::from_store)?
                    .is_some();
                if !exists {
                    self.merge_node(&mut report, &SkillNode::bare(skill_id))?;
                }
                self.merge_edge(&mut report, EdgeLabel::RequiredFor, skill_id, &field.name, level.clone())?;
            }
        }
        Ok(report)
    }

    /// Rebuild from an entity store: skills and roles, then fields
    pub fn rebuild_from<E: EntityStore + ?Sized>(&self, entities: &E) -> BuildReport {
        let loaded = entities.list_all_skills().and_then(|skills| {
            let roles = entities.list_all_roles()?;
            let fields = entities.list_all_fields()?;
            Ok((skills, roles, fields))
        });

        let (skills, roles, fields) = match loaded {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "entity store unavailable, rebuild aborted");
                return BuildReport::failed(format!("entity store: {}", e));
            }
        };

        let mut report = self.rebuild(&skills, &roles);
        if report.is_success() {
            report.absorb(self.load_fields(&fields));
        }
        report
    }

    /// HAS_SKILL links of every person, read before the clear.
    ///
    /// Any read failure aborts the rebuild while the old graph is intact.
    fn snapshot_person_links(&self) -> Result<Vec<(String, Vec<String>)>, GraphError> {
        let snapshot_failed = |e: anyhow::Error| {
            GraphError::StoreUnavailable(format!("could not snapshot profiles: {:#}", e))
        };
        let people = self.store.nodes(NodeLabel::Person).map_err(snapshot_failed)?;

        let mut links = Vec::with_capacity(people.len());
        for person in people {
            let skills = self
                .store
                .neighbors(EdgeLabel::HasSkill, &person.key, Direction::Outgoing)
                .map_err(snapshot_failed)?
                .into_iter()
                .map(|n| n.key)
                .collect();
            links.push((person.key, skills));
        }
        tracing::debug!(people = links.len(), "profile links snapshotted");
        Ok(links)
    }

    fn accept(
        &self,
        report: &mut BuildReport,
        kind: &str,
        key: &str,
        validation: Result<(), GraphError>,
    ) -> bool {
        match validation {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(kind, key, error = %e, "rejected record");
                report.rejected_records.push(format!("{} '{}': {}", kind, key, e));
                false
            }
        }
    }

    /// Record a rejected node; only an unavailable store is returned
    fn merge_node<P: NodePayload>(
        &self,
        report: &mut BuildReport,
        payload: &P,
    ) -> Result<(), GraphError> {
        match merge_payload(self.store, payload).map_err(GraphError::from_store) {
            Ok(outcome) => {
                tracing::debug!(label = %P::LABEL, key = payload.key(), ?outcome, "merged node");
                report.node_merged(P::LABEL, outcome);
                Ok(())
            }
            Err(e @ GraphError::StoreUnavailable(_)) => Err(e),
            Err(e) => {
                tracing::warn!(label = %P::LABEL, key = payload.key(), error = %e, "could not merge node");
                report
                    .rejected_records
                    .push(format!("{} '{}': {}", P::LABEL, payload.key(), e));
                Ok(())
            }
        }
    }

    /// Record a skipped edge; only an unavailable store is returned
    fn merge_edge(
        &self,
        report: &mut BuildReport,
        edge: EdgeLabel,
        from: &str,
        to: &str,
        data: serde_json::Value,
    ) -> Result<(), GraphError> {
        match self
            .store
            .merge_edge(edge, from, to, data)
            .map_err(GraphError::from_store)
        {
            Ok(outcome) => {
                report.edge_merged(edge, outcome);
                Ok(())
            }
            Err(e @ GraphError::StoreUnavailable(_)) => Err(e),
            Err(e) => {
                self.skip(report, edge, from, to, e.to_string());
                Ok(())
            }
        }
    }

    fn skip(&self, report: &mut BuildReport, edge: EdgeLabel, from: &str, to: &str, reason: String) {
        tracing::warn!(%edge, from, to, %reason, "could not create edge");
        report.skipped_edges.push(SkippedEdge {
            edge,
            from: from.to_string(),
            to: to.to_string(),
            reason,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MemoryEntityStore;
    use crate::graph::memory::MemoryGraphStore;

    fn scenario() -> (Vec<SkillRecord>, Vec<RoleRecord>) {
        let skills = vec![
            SkillRecord::new("sql", "SQL"),
            SkillRecord::new("python", "Python"),
            SkillRecord::new("spark", "Spark").with_prerequisites(["python"]),
        ];
        let roles = vec![RoleRecord::new("Data Engineer")
            .requiring(["sql", "python"])
            .using(["Airflow", "dbt"])];
        (skills, roles)
    }

    #[test]
    fn test_rebuild_counts_nodes_and_edges() {
        let store = MemoryGraphStore::new();
        let (skills, roles) = scenario();
        let report = GraphBuilder::new(&store, &[]).rebuild(&skills, &roles);

        assert!(report.is_success());
        assert_eq!(report.nodes(NodeLabel::Skill), 3);
        assert_eq!(report.nodes(NodeLabel::Role), 1);
        assert_eq!(report.nodes(NodeLabel::Tool), 2);
        assert_eq!(report.edges(EdgeLabel::Requires), 2);
        assert_eq!(report.edges(EdgeLabel::PrerequisiteOf), 1);
        assert_eq!(report.edges(EdgeLabel::Uses), 2);
        assert!(report.skipped_edges.is_empty());
    }

    #[test]
    fn test_missing_endpoint_is_skipped_not_fatal() {
        let store = MemoryGraphStore::new();
        let skills = vec![SkillRecord::new("spark", "Spark").with_prerequisites(["scala"])];
        let roles = vec![RoleRecord::new("Analyst").requiring(["excel", "spark"])];
        let paths = vec![CareerPath::new("Analyst", "Data Scientist")];

        let report = GraphBuilder::new(&store, &paths).rebuild(&skills, &roles);

        assert!(report.is_success());
        assert_eq!(report.edges(EdgeLabel::Requires), 1);
        assert_eq!(report.skipped_edges.len(), 3);
        let skipped: Vec<(EdgeLabel, &str)> = report
            .skipped_edges
            .iter()
            .map(|s| (s.edge, s.to.as_str()))
            .collect();
        assert_eq!(
            skipped,
            vec![
                (EdgeLabel::Requires, "excel"),
                (EdgeLabel::PrerequisiteOf, "spark"),
                (EdgeLabel::LeadsTo, "Data Scientist"),
            ]
        );
        assert!(report.skipped_edges[0].reason.contains("excel"));
    }

    #[test]
    fn test_invalid_records_are_rejected() {
        let store = MemoryGraphStore::new();
        let skills = vec![
            SkillRecord::new("sql", "SQL"),
            SkillRecord::new("loop", "Loop").with_prerequisites(["loop"]),
        ];
        let report = GraphBuilder::new(&store, &[]).rebuild(&skills, &[RoleRecord::new("")]);

        assert_eq!(report.nodes(NodeLabel::Skill), 1);
        assert_eq!(report.nodes(NodeLabel::Role), 0);
        assert_eq!(report.rejected_records.len(), 2);
    }

    #[test]
    fn test_empty_input_produces_empty_graph() {
        let store = MemoryGraphStore::new();
        let (skills, roles) = scenario();
        let builder = GraphBuilder::new(&store, &[]);
        builder.rebuild(&skills, &roles);

        let report = builder.rebuild(&[], &[]);
        assert!(report.is_success());
        assert_eq!(report.total_nodes(), 0);
        for label in REBUILT_LABELS {
            assert_eq!(store.count_nodes(label).unwrap(), 0);
        }
    }

    #[test]
    fn test_load_fields_creates_bare_skills() {
        let store = MemoryGraphStore::new();
        let builder = GraphBuilder::new(&store, &[]);
        builder.rebuild(&[SkillRecord::new("python", "Python")], &[]);

        let mut field = FieldRecord::new("Software Development", ["python", "react"]);
        field.level = crate::graph::schema::Difficulty::Intermediate;
        let report = builder.load_fields(&[field]);

        assert_eq!(report.nodes(NodeLabel::Field), 1);
        assert_eq!(report.nodes(NodeLabel::Skill), 1);
        assert_eq!(report.edges(EdgeLabel::RequiredFor), 2);
        assert_eq!(store.count_nodes(NodeLabel::Skill).unwrap(), 2);
    }

    #[test]
    fn test_rebuild_from_entity_store() {
        let entities = MemoryEntityStore::new();
        let (skills, roles) = scenario();
        for skill in skills {
            entities.put_skill(skill).unwrap();
        }
        for role in roles {
            entities.put_role(role).unwrap();
        }
        entities.put_field(FieldRecord::new("Data", ["sql"])).unwrap();

        let store = MemoryGraphStore::new();
        let report = GraphBuilder::new(&store, &[]).rebuild_from(&entities);

        assert!(report.is_success());
        assert_eq!(report.nodes(NodeLabel::Skill), 3);
        assert_eq!(report.nodes(NodeLabel::Field), 1);
        assert_eq!(report.edges(EdgeLabel::RequiredFor), 1);
    }

    #[test]
    fn test_absorb_keeps_first_failure() {
        let mut report = BuildReport::failed("first");
        report.absorb(BuildReport::failed("second"));
        assert_eq!(report.failure.as_deref(), Some("first"));
    }
}
