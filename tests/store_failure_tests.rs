//! Store failures degrade to empty results on the read path and to a
//! failure flag on the write path.

use anyhow::Result;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

use skillgraph::{
    CareerGraph, Direction, EdgeLabel, FieldRecord, GraphBuilder, GraphConfig, GraphError, GraphStore,
    MemoryGraphStore, MergeOutcome, NodeLabel, ProfileOps, QueryEngine, RoleRecord,
    ScoringEngine, SkillProfile, SkillRecord, StoredNode,
};

/// Delegates to a memory store until switched offline.
///
/// `writes_offline` fails merges only, so deletes still go through.
/// `links_offline` fails HAS_SKILL traversals only.
struct FlakyStore {
    inner: MemoryGraphStore,
    offline: AtomicBool,
    writes_offline: AtomicBool,
    links_offline: AtomicBool,
}

impl FlakyStore {
    fn new() -> Self {
        FlakyStore {
            inner: MemoryGraphStore::new(),
            offline: AtomicBool::new(false),
            writes_offline: AtomicBool::new(false),
            links_offline: AtomicBool::new(false),
        }
    }

    fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    fn fail_writes(&self) {
        self.writes_offline.store(true, Ordering::SeqCst);
    }

    fn fail_profile_links(&self) {
        self.links_offline.store(true, Ordering::SeqCst);
    }

    fn go_online(&self) {
        for flag in [&self.offline, &self.writes_offline, &self.links_offline] {
            flag.store(false, Ordering::SeqCst);
        }
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(GraphError::StoreUnavailable("connection refused".to_string()).into());
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        self.check()?;
        if self.writes_offline.load(Ordering::SeqCst) {
            return Err(GraphError::StoreUnavailable("disk full".to_string()).into());
        }
        Ok(())
    }
}

impl GraphStore for FlakyStore {
    fn refresh(&self) -> Result<()> {
        self.check()
    }

    fn merge_node(&self, label: NodeLabel, key: &str, data: Value) -> Result<MergeOutcome> {
        self.check_write()?;
        self.inner.merge_node(label, key, data)
    }

    fn merge_edge(&self, edge: EdgeLabel, from: &str, to: &str, data: Value) -> Result<MergeOutcome> {
        self.check_write()?;
        self.inner.merge_edge(edge, from, to, data)
    }

    fn get_node(&self, label: NodeLabel, key: &str) -> Result<Option<StoredNode>> {
        self.check()?;
        self.inner.get_node(label, key)
    }

    fn nodes(&self, label: NodeLabel) -> Result<Vec<StoredNode>> {
        self.check()?;
        self.inner.nodes(label)
    }

    fn neighbors(&self, edge: EdgeLabel, key: &str, direction: Direction) -> Result<Vec<StoredNode>> {
        self.check()?;
        if edge == EdgeLabel::HasSkill && self.links_offline.load(Ordering::SeqCst) {
            anyhow::bail!("read timed out");
        }
        self.inner.neighbors(edge, key, direction)
    }

    fn delete_nodes(&self, label: NodeLabel) -> Result<usize> {
        self.check()?;
        self.inner.delete_nodes(label)
    }

    fn count_nodes(&self, label: NodeLabel) -> Result<usize> {
        self.check()?;
        self.inner.count_nodes(label)
    }

    fn count_edges(&self, edge: EdgeLabel) -> Result<usize> {
        self.check()?;
        self.inner.count_edges(edge)
    }
}

fn populated() -> FlakyStore {
    let store = FlakyStore::new();
    let report = GraphBuilder::new(&store, &[]).rebuild(
        &[
            SkillRecord::new("python", "Python"),
            SkillRecord::new("spark", "Spark").with_prerequisites(["python"]),
        ],
        &[RoleRecord::new("Data Engineer").requiring(["python", "spark"])],
    );
    assert!(report.is_success());
    store
}

#[test]
fn test_queries_return_empty_when_store_is_down() {
    let store = populated();
    let queries = QueryEngine::new(&store);
    assert_eq!(queries.direct_required_skills("Data Engineer").unwrap().len(), 2);

    store.go_offline();
    assert!(queries.direct_required_skills("Data Engineer").unwrap().is_empty());
    assert!(queries.shortest_prerequisite_path("python", "spark").unwrap().is_empty());
    assert!(queries.career_progression("Data Engineer").unwrap().is_empty());
    assert!(queries.direct_prerequisites("spark").unwrap().is_empty());
    assert!(queries.transitive_prerequisites("spark").unwrap().is_empty());
    assert!(queries.role_tools("Data Engineer").unwrap().is_empty());
}

#[test]
fn test_invalid_input_still_reported_when_store_is_down() {
    let store = populated();
    store.go_offline();
    let err = QueryEngine::new(&store)
        .shortest_prerequisite_path("python", "")
        .unwrap_err();
    assert_eq!(err.code(), "SKG-IN-001");
}

#[test]
fn test_scoring_returns_empty_when_store_is_down() {
    let store = populated();
    let profile = SkillProfile::from_ids(["python"]).unwrap();
    let scoring = ScoringEngine::new(&store);
    assert_eq!(scoring.evaluate(&profile).len(), 1);

    store.go_offline();
    assert!(scoring.evaluate(&profile).is_empty());
    assert!(scoring.top_recommendations(&profile, 3, 0.0).is_empty());
}

#[test]
fn test_rebuild_reports_failure_flag() {
    let store = populated();
    store.go_offline();

    let report = GraphBuilder::new(&store, &[]).rebuild(&[SkillRecord::new("sql", "SQL")], &[]);
    assert!(!report.is_success());
    assert_eq!(report.total_nodes(), 0);
    assert_eq!(report.total_edges(), 0);
    assert!(report.failure.unwrap().contains("connection refused"));
}

#[test]
fn test_rebuild_fails_when_writes_fail_after_clear() {
    let store = populated();
    store.fail_writes();

    let builder = GraphBuilder::new(&store, &[]);
    let report = builder.rebuild(
        &[SkillRecord::new("sql", "SQL")],
        &[RoleRecord::new("Analyst").requiring(["sql"])],
    );
    assert!(!report.is_success());
    assert_eq!(report.total_nodes(), 0);
    assert_eq!(report.total_edges(), 0);
    assert!(report.skipped_edges.is_empty());
    assert!(report.failure.unwrap().contains("disk full"));

    let fields = builder.load_fields(&[FieldRecord::new("Data", ["sql"])]);
    assert!(!fields.is_success());
    assert_eq!(fields.total_nodes(), 0);
}

#[test]
fn test_rebuild_keeps_graph_when_profile_snapshot_fails() {
    let store = populated();
    let profiles = ProfileOps::new(&store);
    profiles
        .create_profile("p1", "Ada", &SkillProfile::from_ids(["python"]).unwrap())
        .unwrap();
    store.fail_profile_links();

    let report = GraphBuilder::new(&store, &[]).rebuild(&[SkillRecord::new("sql", "SQL")], &[]);
    assert!(!report.is_success());
    assert!(report.failure.unwrap().contains("read timed out"));

    store.go_online();
    let queries = QueryEngine::new(&store);
    assert_eq!(queries.direct_required_skills("Data Engineer").unwrap().len(), 2);
    assert!(store.get_node(NodeLabel::Skill, "sql").unwrap().is_none());
    let linked: Vec<String> = profiles
        .profile_skills("p1")
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(linked, vec!["python"]);
}

#[test]
fn test_profile_writes_surface_store_errors() {
    let store = populated();
    store.go_offline();

    let err = ProfileOps::new(&store)
        .create_profile("p1", "Ada", &SkillProfile::from_ids(["python"]).unwrap())
        .unwrap_err();
    assert_eq!(err.code(), "SKG-ST-002");
    assert!(ProfileOps::new(&store).profile_skills("p1").unwrap().is_empty());
}

#[test]
fn test_facade_over_custom_store() {
    let graph = CareerGraph::with_store(populated(), GraphConfig::default());
    assert_eq!(graph.stats().unwrap().skills(), 2);

    graph.store().go_offline();
    assert!(graph.stats().is_err());
    assert!(graph.recommend(&SkillProfile::from_ids(["python"]).unwrap()).is_empty());
}
