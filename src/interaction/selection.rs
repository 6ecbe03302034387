//! Selected nodes and connections.

use crate::graph::{ConnectionId, Graph, NodeId};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub nodes: BTreeSet<NodeId>,
    pub connections: BTreeSet<ConnectionId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }

    pub fn select_only_node(&mut self, id: NodeId) {
        self.clear();
        self.nodes.insert(id);
    }

    pub fn select_only_connection(&mut self, id: ConnectionId) {
        self.clear();
        self.connections.insert(id);
    }

    pub fn toggle_node(&mut self, id: NodeId) {
        if !self.nodes.remove(&id) {
            self.nodes.insert(id);
        }
    }

    pub fn toggle_connection(&mut self, id: ConnectionId) {
        if !self.connections.remove(&id) {
            self.connections.insert(id);
        }
    }

    /// The single selected node, if exactly one node is selected.
    pub fn single_node(&self) -> Option<NodeId> {
        match self.nodes.len() {
            1 => self.nodes.iter().next().copied(),
            _ => None,
        }
    }

    /// Select every node and connection in `graph`.
    pub fn select_all(&mut self, graph: &Graph) {
        self.nodes = graph.nodes().map(|n| n.id).collect();
        self.connections = graph.connections().map(|c| c.id).collect();
    }

    /// Drop ids that no longer exist in `graph`.
    pub fn retain_existing(&mut self, graph: &Graph) {
        self.nodes.retain(|id| graph.contains_node(*id));
        self.connections.retain(|id| graph.connection(*id).is_some());
    }
}
