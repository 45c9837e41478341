//! Graph store abstraction
//!
//! The builder, query engine and scoring engine talk to the property graph
//! only through [`GraphStore`]. Backends: [`super::MemoryGraphStore`]
//! (in-process) and [`super::SqliteGraphStore`] (sqlitegraph).

use anyhow::Result;
use serde_json::Value;

use super::schema::{EdgeLabel, NodeLabel, NodePayload};

/// Traversal direction relative to the queried node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    /// Label of the node a traversal over `edge` starts from
    pub fn origin_label(self, edge: EdgeLabel) -> NodeLabel {
        match self {
            Direction::Outgoing => edge.from_label(),
            Direction::Incoming => edge.to_label(),
        }
    }
}

/// Result of a merge (upsert) operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
    Unchanged,
}

impl MergeOutcome {
    pub fn is_created(self) -> bool {
        matches!(self, MergeOutcome::Created)
    }
}

/// A node as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    /// Backend-assigned entity id, not stable across rebuilds
    pub id: i64,
    pub label: NodeLabel,
    pub key: String,
    pub data: Value,
}

impl StoredNode {
    /// Decode the JSON payload into its typed record
    pub fn decode<P: NodePayload>(&self) -> Result<P> {
        if self.label != P::LABEL {
            anyhow::bail!(
                "node '{}' is a {}, not a {}",
                self.key,
                self.label,
                P::LABEL
            );
        }
        serde_json::from_value(self.data.clone())
            .map_err(|e| anyhow::anyhow!("failed to decode {} '{}': {}", self.label, self.key, e))
    }
}

/// Property-graph collaborator.
///
/// All methods take `&self`; a backend that is `Sync` can serve concurrent
/// readers. Keys are unique per label, and every edge type is
/// merge-idempotent on `(edge, from_key, to_key)`.
pub trait GraphStore {
    /// Pick up writes made through other handles on the same database.
    ///
    /// Called by the engines at the start of every operation. Stores that
    /// cache nothing keep the default no-op.
    fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Insert the node, or replace its payload if the key already exists
    fn merge_node(&self, label: NodeLabel, key: &str, data: Value) -> Result<MergeOutcome>;

    /// Insert the edge, or replace its payload if it already exists.
    ///
    /// Fails with [`crate::GraphError::MissingEndpoint`] if either endpoint is
    /// absent; endpoints are never created implicitly.
    fn merge_edge(&self, edge: EdgeLabel, from_key: &str, to_key: &str, data: Value)
        -> Result<MergeOutcome>;

    fn get_node(&self, label: NodeLabel, key: &str) -> Result<Option<StoredNode>>;

    /// All nodes with `label`, ordered by key
    fn nodes(&self, label: NodeLabel) -> Result<Vec<StoredNode>>;

    /// One-hop neighbors of the node `key` over `edge`.
    ///
    /// The origin node's label is implied by `edge` and `direction`. Results
    /// come back in edge merge order. A missing origin yields an empty list.
    fn neighbors(&self, edge: EdgeLabel, key: &str, direction: Direction)
        -> Result<Vec<StoredNode>>;

    /// Delete every node with `label` together with its incident edges
    fn delete_nodes(&self, label: NodeLabel) -> Result<usize>;

    fn count_nodes(&self, label: NodeLabel) -> Result<usize>;

    fn count_edges(&self, edge: EdgeLabel) -> Result<usize>;
}

/// Merge a typed payload under its own label and key
pub fn merge_payload<S, P>(store: &S, payload: &P) -> Result<MergeOutcome>
where
    S: GraphStore + ?Sized,
    P: NodePayload,
{
    let data = serde_json::to_value(payload)?;
    store.merge_node(P::LABEL, payload.key(), data)
}

/// Fetch and decode a typed node
pub fn get_payload<S, P>(store: &S, key: &str) -> Result<Option<P>>
where
    S: GraphStore + ?Sized,
    P: NodePayload,
{
    store
        .get_node(P::LABEL, key)?
        .map(|node| node.decode::<P>())
        .transpose()
}
