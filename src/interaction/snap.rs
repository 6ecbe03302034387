//! Port hit testing.
//!
//! The nearest visible port within a radius wins, compared by squared
//! distance to the port centre. Candidates are visited in node-id order and
//! then in each node's port order; on an exact tie the first visited port is
//! kept, so the result is deterministic for a given graph.

use crate::graph::{Graph, Port, PortDirection, PortRef};
use egui::Pos2;

/// A port found under the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct PortHit {
    pub port: PortRef,
    pub direction: PortDirection,
    pub position: Pos2,
    pub distance_sq: f32,
}

/// Nearest visible port to `point` within `radius` (world units) for which
/// `accept` returns true.
pub fn nearest_port(
    graph: &Graph,
    point: Pos2,
    radius: f32,
    mut accept: impl FnMut(&PortRef, &Port) -> bool,
) -> Option<PortHit> {
    let radius_sq = radius * radius;
    let mut best: Option<PortHit> = None;

    for node in graph.nodes() {
        for port in node.ports().iter().filter(|p| p.visible) {
            let position = node.position + port.offset;
            let distance_sq = (position - point).length_sq();
            if distance_sq > radius_sq {
                continue;
            }
            if best.as_ref().is_some_and(|b| distance_sq >= b.distance_sq) {
                continue;
            }
            let port_ref = PortRef::new(node.id, port.slot.clone());
            if !accept(&port_ref, port) {
                continue;
            }
            best = Some(PortHit {
                port: port_ref,
                direction: port.direction,
                position,
                distance_sq,
            });
        }
    }

    best
}

/// Drop target for a dragged connection end: the nearest visible port other
/// than `exclude`, regardless of direction. The caller decides whether the
/// direction is compatible so a same-direction drop can be reported.
pub fn drop_target(graph: &Graph, point: Pos2, radius: f32, exclude: &PortRef) -> Option<PortHit> {
    nearest_port(graph, point, radius, |port, _| port != exclude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Parameters;

    fn two_actions() -> (Graph, crate::graph::NodeId, crate::graph::NodeId) {
        let mut graph = Graph::default();
        let a = graph
            .create_node("action_execution", Pos2::new(0.0, 0.0), &Parameters::new())
            .unwrap();
        let b = graph
            .create_node("action_execution", Pos2::new(300.0, 0.0), &Parameters::new())
            .unwrap();
        (graph, a, b)
    }

    #[test]
    fn test_nearest_within_radius() {
        let (graph, a, _) = two_actions();
        let out = PortRef::new(a, "out");
        let pos = graph.port_position(&out).unwrap();

        let hit = nearest_port(&graph, pos + egui::vec2(3.0, 4.0), 14.0, |_, _| true).unwrap();
        assert_eq!(hit.port, out);
        assert_eq!(hit.distance_sq, 25.0);

        assert!(nearest_port(&graph, pos + egui::vec2(30.0, 0.0), 14.0, |_, _| true).is_none());
    }

    #[test]
    fn test_drop_target_excludes_origin() {
        let (graph, a, b) = two_actions();
        let out = PortRef::new(a, "out");
        let pos = graph.port_position(&out).unwrap();
        assert!(drop_target(&graph, pos, 14.0, &out).is_none());

        let target = PortRef::new(b, "in");
        let target_pos = graph.port_position(&target).unwrap();
        let hit = drop_target(&graph, target_pos, 14.0, &out).unwrap();
        assert_eq!(hit.port, target);
        assert_eq!(hit.direction, PortDirection::Input);
    }

    #[test]
    fn test_hidden_ports_ignored() {
        let mut graph = Graph::default();
        let id = graph
            .create_node("while_loop", Pos2::ZERO, &Parameters::new())
            .unwrap();
        // `for_start` exists but is hidden in while mode
        let node = graph.node(id).unwrap();
        let hidden = node.port("for_start").unwrap();
        assert!(!hidden.visible);
        let pos = node.position + hidden.offset;
        let hit = nearest_port(&graph, pos, 1.0, |_, _| true);
        assert!(hit.map_or(true, |h| h.port.slot != "for_start"));
    }
}
