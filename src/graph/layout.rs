//! Layout engine.
//!
//! A node's geometry is a pure function of its kind and current parameters
//! (sub-mode, dynamic branch count): the kind returns a `NodeLayout` holding
//! the node size and the offset of every port relative to the node's top-left
//! corner. Inputs sit on the left edge, outputs on the right edge, at a
//! fraction of the node height.
//!
//! The graph applies layouts lazily. Structural edits mark a node dirty and
//! `Graph::flush_layout` recomputes only dirty nodes, so several edits within
//! one change cost a single pass.

use super::port::{PortDescriptor, PortDirection};
use egui::{vec2, Vec2};

/// Radius of a port circle in world units.
pub const PORT_RADIUS: f32 = 6.0;

/// Size of the plain single-row node kinds.
pub const DEFAULT_NODE_SIZE: Vec2 = vec2(180.0, 110.0);

/// Extra height per dynamic row (elif branch, custom port row).
pub const ROW_HEIGHT: f32 = 24.0;

/// Height of the header strip holding the node title.
pub const HEADER_HEIGHT: f32 = 28.0;

/// Where one port sits on its node.
#[derive(Debug, Clone, PartialEq)]
pub struct PortPlacement {
    pub slot: String,
    pub offset: Vec2,
}

/// Result of laying out a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub size: Vec2,
    pub ports: Vec<PortPlacement>,
}

impl NodeLayout {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ports: Vec::new(),
        }
    }

    /// Place a port on its direction's edge at `fraction` of the node height.
    pub fn place(mut self, slot: impl Into<String>, direction: PortDirection, fraction: f32) -> Self {
        let x = match direction {
            PortDirection::Input => 0.0,
            PortDirection::Output => self.size.x,
        };
        self.ports.push(PortPlacement {
            slot: slot.into(),
            offset: vec2(x, self.size.y * fraction),
        });
        self
    }

    pub fn input(self, slot: impl Into<String>, fraction: f32) -> Self {
        self.place(slot, PortDirection::Input, fraction)
    }

    pub fn output(self, slot: impl Into<String>, fraction: f32) -> Self {
        self.place(slot, PortDirection::Output, fraction)
    }

    pub fn offset_of(&self, slot: &str) -> Option<Vec2> {
        self.ports.iter().find(|p| p.slot == slot).map(|p| p.offset)
    }
}

/// Fraction of `index` among `count` rows spread evenly over `[from, to]`.
pub fn spread(index: usize, count: usize, from: f32, to: f32) -> f32 {
    if count == 0 {
        return (from + to) / 2.0;
    }
    from + (to - from) * (index as f32 + 1.0) / (count as f32 + 1.0)
}

/// Generic layout: inputs and outputs each spread evenly down their edge,
/// height growing with the longer side.
pub fn even_layout(width: f32, ports: &[PortDescriptor]) -> NodeLayout {
    let inputs: Vec<_> = ports
        .iter()
        .filter(|p| p.direction == PortDirection::Input)
        .collect();
    let outputs: Vec<_> = ports
        .iter()
        .filter(|p| p.direction == PortDirection::Output)
        .collect();
    let rows = inputs.len().max(outputs.len()).max(1);
    let height = (HEADER_HEIGHT + 42.0 + ROW_HEIGHT * rows as f32).max(DEFAULT_NODE_SIZE.y);

    let mut layout = NodeLayout::new(vec2(width, height));
    for side in [&inputs, &outputs] {
        for (i, port) in side.iter().enumerate() {
            let fraction = spread(i, side.len(), 0.0, 1.0);
            layout = layout.place(port.slot.clone(), port.direction, fraction);
        }
    }
    layout
}
