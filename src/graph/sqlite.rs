//! Persistent graph store on sqlitegraph
//!
//! Node kind = label, node name = unique key, node data = typed JSON payload.
//! A key index (label, key) -> entity id is kept in memory, built on open
//! and reloaded by [`GraphStore::refresh`] whenever the set of entity ids in
//! the database no longer matches the one the index was built from.
//! Entity ids are never reused (AUTOINCREMENT), so any insert or delete made
//! through another handle changes that set.
//!
//! # Thread Safety
//!
//! **This store is NOT thread-safe.** It holds an `Rc` backend and a
//! `RefCell` index. Concurrent readers open their own handle on the same
//! database path; the query, scoring and builder engines refresh the handle
//! at the start of every operation, so a reader that waits for a rebuild on
//! another handle to finish sees the rebuilt graph.

use anyhow::Result;
use serde_json::Value;
use sqlitegraph::{
    BackendDirection, EdgeSpec, GraphBackend, NeighborQuery, NodeSpec, SnapshotId,
    SqliteGraphBackend,
};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::rc::Rc;

use super::schema::{EdgeLabel, NodeLabel};
use super::store::{Direction, GraphStore, MergeOutcome, StoredNode};
use crate::error::GraphError;

/// Graph store backed by a sqlitegraph database
pub struct SqliteGraphStore {
    backend: Rc<dyn GraphBackend>,
    index: RefCell<HashMap<(NodeLabel, String), i64>>,
    /// Entity ids the index was built from, kept current by local writes
    known_ids: RefCell<BTreeSet<i64>>,
}

impl SqliteGraphStore {
    /// Open a graph database at the given path (`:memory:` for a scratch db)
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let sqlite_graph = sqlitegraph::SqliteGraph::open(db_path.as_ref()).map_err(|e| {
            GraphError::StoreUnavailable(format!(
                "cannot open {}: {}",
                db_path.as_ref().display(),
                e
            ))
        })?;
        let backend: Rc<dyn GraphBackend> = Rc::new(SqliteGraphBackend::from_graph(sqlite_graph));

        let store = Self {
            backend,
            index: RefCell::new(HashMap::new()),
            known_ids: RefCell::new(BTreeSet::new()),
        };
        store.rebuild_index()?;
        Ok(store)
    }

    /// Rebuild the in-memory key index by scanning all entities
    pub fn rebuild_index(&self) -> Result<()> {
        let ids: BTreeSet<i64> = self.backend.entity_ids()?.into_iter().collect();
        self.load_index(ids)
    }

    fn load_index(&self, ids: BTreeSet<i64>) -> Result<()> {
        let snapshot = SnapshotId::current();
        let mut index = HashMap::new();

        for &id in &ids {
            let node = match self.backend.get_node(snapshot, id) {
                Ok(n) => n,
                Err(_) => continue,
            };
            if let Ok(label) = node.kind.parse::<NodeLabel>() {
                index.insert((label, node.name.clone()), id);
            }
        }

        tracing::debug!(entities = index.len(), "rebuilt graph key index");
        *self.index.borrow_mut() = index;
        *self.known_ids.borrow_mut() = ids;
        Ok(())
    }

    fn delete_entity(&self, id: i64) -> Result<()> {
        self.backend.delete_entity(id)?;
        self.known_ids.borrow_mut().remove(&id);
        Ok(())
    }

    fn lookup(&self, label: NodeLabel, key: &str) -> Option<i64> {
        self.index.borrow().get(&(label, key.to_string())).copied()
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

    fn load(&self, id: i64) -> Result<Option<StoredNode>> {
        let node = self.backend.get_node(SnapshotId::current(), id)?;
        let label = match node.kind.parse::<NodeLabel>() {
            Ok(label) => label,
            Err(_) => return Ok(None),
        };
        Ok(Some(StoredNode {
            id,
            label,
            key: node.name,
            data: node.data,
        }))
    }

    fn neighbor_ids(&self, id: i64, edge: EdgeLabel, direction: Direction) -> Result<Vec<i64>> {
        let direction = match direction {
            Direction::Outgoing => BackendDirection::Outgoing,
            Direction::Incoming => BackendDirection::Incoming,
        };
        let ids = self.backend.neighbors(
            SnapshotId::current(),
            id,
            NeighborQuery {
                direction,
                edge_type: Some(edge.as_str().to_string()),
            },
        )?;
        Ok(ids)
    }

    fn insert_node(&self, label: NodeLabel, key: &str, data: Value) -> Result<i64> {
        let node_spec = NodeSpec {
            kind: label.as_str().to_string(),
            name: key.to_string(),
            file_path: None,
            data,
        };
        let id = self.backend.insert_node(node_spec)?;
        self.index.borrow_mut().insert((label, key.to_string()), id);
        self.known_ids.borrow_mut().insert(id);
        Ok(id)
    }

    fn insert_edge(&self, edge: EdgeLabel, from: i64, to: i64, data: Value) -> Result<()> {
        let edge_spec = EdgeSpec {
            from,
            to,
            edge_type: edge.as_str().to_string(),
            data,
        };
        self.backend.insert_edge(edge_spec)?;
        Ok(())
    }

    /// Replace a node whose payload changed.
    ///
    /// sqlitegraph has no in-place update, so the node is deleted, re-inserted
    /// and its edges re-linked. Edge payloads are not readable through the
    /// backend and come back empty.
    fn replace_node(&self, label: NodeLabel, key: &str, old_id: i64, data: Value) -> Result<()> {
        let mut links: Vec<(EdgeLabel, Direction, i64)> = Vec::new();
        for edge in EdgeLabel::ALL {
            if edge.from_label() == label {
                for other in self.neighbor_ids(old_id, edge, Direction::Outgoing)? {
                    links.push((edge, Direction::Outgoing, other));
                }
            }
            if edge.to_label() == label {
                for other in self.neighbor_ids(old_id, edge, Direction::Incoming)? {
                    links.push((edge, Direction::Incoming, other));
                }
            }
        }

        self.delete_entity(old_id)?;
        let new_id = self.insert_node(label, key, data)?;

        for (edge, direction, other) in links {
            let (from, to) = match direction {
                Direction::Outgoing => (new_id, other),
                Direction::Incoming => (other, new_id),
            };
            self.insert_edge(edge, from, to, serde_json::json!({}))?;
        }
        Ok(())
    }
}

impl GraphStore for SqliteGraphStore {
    fn refresh(&self) -> Result<()> {
        let current: BTreeSet<i64> = self.backend.entity_ids()?.into_iter().collect();
        if *self.known_ids.borrow() != current {
            tracing::debug!(
                known = self.known_ids.borrow().len(),
                current = current.len(),
                "graph changed through another handle, reloading key index"
            );
            self.load_index(current)?;
        }
        Ok(())
    }

    fn merge_node(&self, label: NodeLabel, key: &str, data: Value) -> Result<MergeOutcome> {
        match self.lookup(label, key) {
            Some(id) => {
                let existing = self.backend.get_node(SnapshotId::current(), id)?;
                if existing.data == data {
                    return Ok(MergeOutcome::Unchanged);
                }
                self.replace_node(label, key, id, data)?;
                Ok(MergeOutcome::Updated)
            }
            None => {
                self.insert_node(label, key, data)?;
                Ok(MergeOutcome::Created)
            }
        }
    }

    /// Edge payloads are write-once on this backend: re-merging an existing
    /// edge is reported as `Unchanged`.
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

        let from = self.endpoint(edge.from_label(), from_key)?;
        let to = self.endpoint(edge.to_label(), to_key)?;

        if self
            .neighbor_ids(from, edge, Direction::Outgoing)?
            .contains(&to)
        {
            return Ok(MergeOutcome::Unchanged);
        }

        self.insert_edge(edge, from, to, data)?;
        Ok(MergeOutcome::Created)
    }

    fn get_node(&self, label: NodeLabel, key: &str) -> Result<Option<StoredNode>> {
        match self.lookup(label, key) {
            Some(id) => self.load(id),
            None => Ok(None),
        }
    }

    fn nodes(&self, label: NodeLabel) -> Result<Vec<StoredNode>> {
        let mut ids: Vec<i64> = self
            .index
            .borrow()
            .iter()
            .filter(|((l, _), _)| *l == label)
            .map(|(_, id)| *id)
            .collect();
        ids.sort_unstable();

        let mut nodes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.load(id)? {
                nodes.push(node);
            }
        }
        nodes.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(nodes)
    }

    fn neighbors(
        &self,
        edge: EdgeLabel,
        key: &str,
        direction: Direction,
    ) -> Result<Vec<StoredNode>> {
        let Some(id) = self.lookup(direction.origin_label(edge), key) else {
            return Ok(Vec::new());
        };

        let mut nodes = Vec::new();
        for other in self.neighbor_ids(id, edge, direction)? {
            // Dangling ids (deleted entities) are skipped
            if let Ok(Some(node)) = self.load(other) {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }

    fn delete_nodes(&self, label: NodeLabel) -> Result<usize> {
        let mut to_delete: Vec<(i64, String)> = self
            .index
            .borrow()
            .iter()
            .filter(|((l, _), _)| *l == label)
            .map(|((_, key), id)| (*id, key.clone()))
            .collect();

        // Determinism: delete in ascending entity id order
        to_delete.sort_unstable();

        for (id, key) in &to_delete {
            self.delete_entity(*id)?;
            self.index.borrow_mut().remove(&(label, key.clone()));
        }
        Ok(to_delete.len())
    }

    fn count_nodes(&self, label: NodeLabel) -> Result<usize> {
        Ok(self
            .index
            .borrow()
            .keys()
            .filter(|(l, _)| *l == label)
            .count())
    }

    fn count_edges(&self, edge: EdgeLabel) -> Result<usize> {
        let origins: Vec<i64> = self
            .index
            .borrow()
            .iter()
            .filter(|((l, _), _)| *l == edge.from_label())
            .map(|(_, id)| *id)
            .collect();

        let mut total = 0;
        for id in origins {
            total += self.neighbor_ids(id, edge, Direction::Outgoing)?.len();
        }
        Ok(total)
    }
}
