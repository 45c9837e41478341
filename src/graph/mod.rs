//! Career graph: model, builder, queries and coverage scoring
//!
//! One fixed node/edge vocabulary (see [`schema`]) over a pluggable
//! [`GraphStore`]. The builder is the only writer of the taxonomy; queries
//! and scoring are read-only views borrowing the same store.
pub mod builder;
pub mod count;
pub mod memory;
pub mod profiles;
pub mod query;
pub mod schema;
pub mod scoring;
pub mod sqlite;
pub mod store;

use anyhow::Result;

use crate::config::GraphConfig;
use crate::entity::{EntityStore, FieldRecord, RoleRecord, SkillRecord};
use crate::error::GraphError;

pub use builder::{BuildReport, GraphBuilder, SkippedEdge};
pub use count::{graph_stats, GraphStats};
pub use memory::MemoryGraphStore;
pub use profiles::{ProfileOps, ProfileReport, SimilarProfile};
pub use query::QueryEngine;
pub use schema::{
    DemandLevel, Difficulty, EdgeLabel, FieldNode, NodeLabel, NodePayload, PersonNode, RoleNode,
    SkillNode, SkillSummary, ToolNode,
};
pub use scoring::{
    CoverageScore, CoverageTarget, Recommendation, ScoringEngine, SkillProfile,
    MAX_MISSING_PREVIEW,
};
pub use sqlite::SqliteGraphStore;
pub use store::{Direction, GraphStore, MergeOutcome, StoredNode};

/// Career graph handle
///
/// Owns the store and configuration. Engines are cheap borrowing views,
/// created per call; there is no global instance.
pub struct CareerGraph<S: GraphStore> {
    store: S,
    config: GraphConfig,
}

impl CareerGraph<MemoryGraphStore> {
    /// Empty in-process graph, safe to share across reader threads
    pub fn in_memory(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        Ok(Self::with_store(MemoryGraphStore::new(), config))
    }
}

impl CareerGraph<SqliteGraphStore> {
    /// Open the sqlitegraph database at `config.database_path`
    pub fn open(config: GraphConfig) -> Result<Self, GraphError> {
        config.validate()?;
        let store = SqliteGraphStore::open(&config.database_path).map_err(GraphError::from_store)?;
        tracing::info!(path = %config.database_path.display(), "opened career graph");
        Ok(Self::with_store(store, config))
    }
}

impl<S: GraphStore> CareerGraph<S> {
    pub fn with_store(store: S, config: GraphConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn builder(&self) -> GraphBuilder<'_, S> {
        GraphBuilder::new(&self.store, &self.config.career_paths)
    }

    pub fn queries(&self) -> QueryEngine<'_, S> {
        QueryEngine::new(&self.store)
    }

    /// Scoring over Fields and Roles; narrow with [`ScoringEngine::with_target`]
    pub fn scoring(&self) -> ScoringEngine<'_, S> {
        ScoringEngine::new(&self.store)
    }

    pub fn profiles(&self) -> ProfileOps<'_, S> {
        ProfileOps::new(&self.store)
    }

    /// Clear and rebuild the taxonomy from records
    pub fn rebuild(&self, skills: &[SkillRecord], roles: &[RoleRecord]) -> BuildReport {
        self.builder().rebuild(skills, roles)
    }

    pub fn rebuild_from<E: EntityStore + ?Sized>(&self, entities: &E) -> BuildReport {
        self.builder().rebuild_from(entities)
    }

    pub fn load_fields(&self, fields: &[FieldRecord]) -> BuildReport {
        self.builder().load_fields(fields)
    }

    /// `top_recommendations` with the configured limit and threshold
    pub fn recommend(&self, profile: &SkillProfile) -> Vec<Recommendation> {
        let defaults = &self.config.recommendations;
        self.scoring()
            .top_recommendations(profile, defaults.limit, defaults.min_score_percent)
    }

    pub fn stats(&self) -> Result<GraphStats> {
        graph_stats(&self.store)
    }
}
