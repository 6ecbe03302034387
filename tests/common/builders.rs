//! Test data builders for creating test graphs

use celebrimbor::graph::Parameters;
use celebrimbor::{ConnectionId, Graph, KindRegistry, NodeId, PortRef};
use egui::Pos2;

/// Horizontal gap between nodes placed by [`GraphBuilder::add`]
pub const COLUMN_WIDTH: f32 = 320.0;

/// Builder for graphs of built-in kinds laid out left to right
pub struct GraphBuilder {
    graph: Graph,
    next_x: f32,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(KindRegistry::with_builtins()),
            next_x: 0.0,
        }
    }

    /// Add a node in the next free column
    pub fn add(&mut self, kind: &str) -> NodeId {
        let x = self.next_x;
        self.next_x += COLUMN_WIDTH;
        self.add_at(kind, x, 0.0)
    }

    pub fn add_at(&mut self, kind: &str, x: f32, y: f32) -> NodeId {
        self.graph
            .create_node(kind, Pos2::new(x, y), &Parameters::new())
            .unwrap()
    }

    pub fn link(&mut self, from: NodeId, out_slot: &str, to: NodeId, in_slot: &str) -> ConnectionId {
        self.graph
            .connect(&PortRef::new(from, out_slot), &PortRef::new(to, in_slot))
            .unwrap()
    }

    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_builder() {
        let mut builder = GraphBuilder::new();
        let a = builder.add("action_execution");
        let b = builder.add("if");
        builder.link(a, "out", b, "condition");
        let graph = builder.build();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 1);
        assert_eq!(graph.node(b).unwrap().position, Pos2::new(COLUMN_WIDTH, 0.0));
    }
}
