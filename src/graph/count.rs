//! Count operations for the career graph
//!
//! Node counts per label and edge counts per type.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::schema::{EdgeLabel, NodeLabel};
use super::store::GraphStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: BTreeMap<NodeLabel, usize>,
    pub edges: BTreeMap<EdgeLabel, usize>,
}

impl GraphStats {
    pub fn node_count(&self, label: NodeLabel) -> usize {
        self.nodes.get(&label).copied().unwrap_or(0)
    }

    pub fn edge_count(&self, edge: EdgeLabel) -> usize {
        self.edges.get(&edge).copied().unwrap_or(0)
    }

    pub fn skills(&self) -> usize {
        self.node_count(NodeLabel::Skill)
    }

    pub fn roles(&self) -> usize {
        self.node_count(NodeLabel::Role)
    }

    pub fn tools(&self) -> usize {
        self.node_count(NodeLabel::Tool)
    }

    pub fn fields(&self) -> usize {
        self.node_count(NodeLabel::Field)
    }

    pub fn people(&self) -> usize {
        self.node_count(NodeLabel::Person)
    }

    pub fn total_edges(&self) -> usize {
        self.edges.values().sum()
    }
}

/// Count every node label and edge type in the store
pub fn graph_stats<S: GraphStore + ?Sized>(store: &S) -> Result<GraphStats> {
    store.refresh()?;
    let mut stats = GraphStats::default();
    for label in NodeLabel::ALL {
        stats.nodes.insert(label, store.count_nodes(label)?);
    }
    for edge in EdgeLabel::ALL {
        stats.edges.insert(edge, store.count_edges(edge)?);
    }
    Ok(stats)
}
