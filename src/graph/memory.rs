//! In-process graph store
//!
//! Holds the whole property graph behind one `RwLock`, so it is `Send + Sync`
//! and serves concurrent readers. Used by tests and as the fake store for
//! callers that do not need persistence.

use anyhow::Result;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::schema::{EdgeLabel, NodeLabel};
use super::store::{Direction, GraphStore, MergeOutcome, StoredNode};
use crate::error::GraphError;

#[derive(Debug, Default)]
struct MemoryGraph {
    next_id: i64,
    nodes: BTreeMap<i64, StoredNode>,
    keys: HashMap<(NodeLabel, String), i64>,
    edges: HashMap<(EdgeLabel, i64, i64), Value>,
    /// Adjacency in merge order, per node id
    outgoing: HashMap<i64, Vec<(EdgeLabel, i64)>>,
    incoming: HashMap<i64, Vec<(EdgeLabel, i64)>>,
}

impl MemoryGraph {
    fn lookup(&self, label: NodeLabel, key: &str) -> Option<i64> {
        self.keys.get(&(label, key.to_string())).copied()
    }

    fn endpoint(&self, label: NodeLabel, key: &str) -> Result<i64> {
        self.lookup(label, key).ok_or_else(|| {
            GraphError::MissingEndpoint {
                label: label.to_string(),
                key: key.to_string(),
            }
            .into()
        })
    }

    fn remove_node(&mut self, id: i64) {
        if let Some(node) = self.nodes.remove(&id) {
            self.keys.remove(&(node.label, node.key));
        }

        for (edge, to) in self.outgoing.remove(&id).unwrap_or_default() {
            self.edges.remove(&(edge, id, to));
            if let Some(list) = self.incoming.get_mut(&to) {
                list.retain(|&(e, from)| !(e == edge && from == id));
            }
        }

        for (edge, from) in self.incoming.remove(&id).unwrap_or_default() {
            self.edges.remove(&(edge, from, id));
            if let Some(list) = self.outgoing.get_mut(&from) {
                list.retain(|&(e, to)| !(e == edge && to == id));
            }
        }
    }
}

/// Property graph kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    inner: RwLock<MemoryGraph>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryGraph>> {
        self.inner
            .read()
            .map_err(|_| GraphError::StoreUnavailable("graph lock poisoned".to_string()).into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryGraph>> {
        self.inner
            .write()
            .map_err(|_| GraphError::StoreUnavailable("graph lock poisoned".to_string()).into())
    }
}

impl GraphStore for MemoryGraphStore {
    fn merge_node(&self, label: NodeLabel, key: &str, data: Value) -> Result<MergeOutcome> {
        let mut graph = self.write()?;

        if let Some(id) = graph.lookup(label, key) {
            let node = graph
                .nodes
                .get_mut(&id)
                .ok_or_else(|| anyhow::anyhow!("key index points at missing node {}", id))?;
            if node.data == data {
                return Ok(MergeOutcome::Unchanged);
            }
            node.data = data;
            return Ok(MergeOutcome::Updated);
        }

        graph.next_id += 1;
        let id = graph.next_id;
        graph.nodes.insert(
            id,
            StoredNode {
                id,
                label,
                key: key.to_string(),
                data,
            },
        );
        graph.keys.insert((label, key.to_string()), id);
        Ok(MergeOutcome::Created)
    }

    fn merge_edge(
        &self,
        edge: EdgeLabel,
        from_key: &str,
        to_key: &str,
        data: Value,
    ) -> Result<MergeOutcome> {
        if !edge.allows_self_loop() && from_key == to_key {
            return Err(GraphError::invalid(
                edge.as_str(),
                format!("'{}' cannot point at itself", from_key),
            )
            .into());
        }

        let mut graph = self.write()?;
        let from = graph.endpoint(edge.from_label(), from_key)?;
        let to = graph.endpoint(edge.to_label(), to_key)?;

        if let Some(existing) = graph.edges.get_mut(&(edge, from, to)) {
            if *existing == data {
                return Ok(MergeOutcome::Unchanged);
            }
            *existing = data;
            return Ok(MergeOutcome::Updated);
        }

        graph.edges.insert((edge, from, to), data);
        graph.outgoing.entry(from).or_default().push((edge, to));
        graph.incoming.entry(to).or_default().push((edge, from));
        Ok(MergeOutcome::Created)
    }

    fn get_node(&self, label: NodeLabel, key: &str) -> Result<Option<StoredNode>> {
        let graph = self.read()?;
        Ok(graph
            .lookup(label, key)
            .and_then(|id| graph.nodes.get(&id))
            .cloned())
    }

    fn nodes(&self, label: NodeLabel) -> Result<Vec<StoredNode>> {
        let graph = self.read()?;
        let mut nodes: Vec<StoredNode> = graph
            .nodes
            .values()
            .filter(|n| n.label == label)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(nodes)
    }

    fn neighbors(
        &self,
        edge: EdgeLabel,
        key: &str,
        direction: Direction,
    ) -> Result<Vec<StoredNode>> {
        let graph = self.read()?;
        let Some(id) = graph.lookup(direction.origin_label(edge), key) else {
            return Ok(Vec::new());
        };

        let adjacency = match direction {
            Direction::Outgoing => graph.outgoing.get(&id),
            Direction::Incoming => graph.incoming.get(&id),
        };

        Ok(adjacency
            .into_iter()
            .flatten()
            .filter(|(e, _)| *e == edge)
            .filter_map(|(_, other)| graph.nodes.get(other).cloned())
            .collect())
    }

    fn delete_nodes(&self, label: NodeLabel) -> Result<usize> {
        let mut graph = self.write()?;
        let ids: Vec<i64> = graph
            .nodes
            .values()
            .filter(|n| n.label == label)
            .map(|n| n.id)
            .collect();

        for id in &ids {
            graph.remove_node(*id);
        }
        Ok(ids.len())
    }

    fn count_nodes(&self, label: NodeLabel) -> Result<usize> {
        let graph = self.read()?;
        Ok(graph.nodes.values().filter(|n| n.label == label).count())
    }

    fn count_edges(&self, edge: EdgeLabel) -> Result<usize> {
        let graph = self.read()?;
        Ok(graph.edges.keys().filter(|(e, _, _)| *e == edge).count())
    }
}
