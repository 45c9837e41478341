//! Skillgraph: a deterministic career-guidance graph
//!
//! Skillgraph turns occupational taxonomy records (skills, roles, fields)
//! into a property graph and answers questions over it:
//!
//! - shortest prerequisite chain between two skills
//! - skills a role requires, tools it uses, where it leads next
//! - which fields and roles best match a set of skills, and what is missing
//!
//! # Graph Model
//!
//! | Node   | Key  | Edges out                         |
//! |--------|------|-----------------------------------|
//! | Skill  | id   | PREREQUISITE_OF, REQUIRED_FOR     |
//! | Role   | name | REQUIRES, USES, LEADS_TO          |
//! | Tool   | name |                                   |
//! | Field  | name |                                   |
//! | Person | id   | HAS_SKILL                         |
//!
//! # Failure Semantics
//!
//! Queries reject blank identifiers with [`GraphError::InvalidInput`].
//! Unknown nodes and store failures are not errors: they are logged through
//! `tracing` and answered with an empty result. Builds record edges with a
//! missing endpoint in their [`BuildReport`] and keep going; an unavailable
//! store stops the build and sets [`BuildReport::failure`].
//!
//! # Feature Flags
//!
//! - **`sqlite-backend`** (default): sqlitegraph SQLite storage
//! - **`native-v3`**: sqlitegraph native binary storage
//!
//! # Example
//!
//! ```no_run
//! use skillgraph::{CareerGraph, GraphConfig, RoleRecord, SkillProfile, SkillRecord};
//!
//! let graph = CareerGraph::in_memory(GraphConfig::default())?;
//! graph.rebuild(
//!     &[
//!         SkillRecord::new("python", "Python"),
//!         SkillRecord::new("spark", "Spark").with_prerequisites(["python"]),
//!     ],
//!     &[RoleRecord::new("Data Engineer").requiring(["python", "spark"])],
//! );
//!
//! let path = graph.queries().shortest_prerequisite_path("python", "spark")?;
//! assert_eq!(path.len(), 2);
//!
//! let profile = SkillProfile::from_ids(["python"])?;
//! for rec in graph.recommend(&profile) {
//!     println!("{} {}% learn next: {:?}", rec.node_name, rec.score_percent, rec.skills_to_learn);
//! }
//! # Ok::<(), skillgraph::GraphError>(())
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod error_codes;
pub mod graph;

pub use config::{CareerPath, GraphConfig, RecommendationConfig};
pub use entity::{
    EntityStore, FieldRecord, LearningResource, MemoryEntityStore, RequiredSkill, RoleRecord,
    SkillRecord,
};
pub use error::GraphError;
pub use graph::{
    graph_stats, BuildReport, CareerGraph, CoverageScore, CoverageTarget, DemandLevel, Difficulty,
    Direction, EdgeLabel, GraphBuilder, GraphStats, GraphStore, MemoryGraphStore, MergeOutcome,
    NodeLabel, ProfileOps, ProfileReport, QueryEngine, Recommendation, ScoringEngine,
    SimilarProfile, SkillProfile, SkillSummary, SkippedEdge, SqliteGraphStore, StoredNode,
};
