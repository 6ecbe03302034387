//! Port descriptors and port state.
//!
//! Each node kind declares its ports through `PortDescriptor`s computed from
//! the node's current parameters (the slot list of an `if` node grows with its
//! elif branches). The graph materializes those descriptors into `Port`s that
//! carry layout offsets and the ids of attached connections.

use super::id::ConnectionId;
use super::value::ParamValue;
use egui::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "in"),
            PortDirection::Output => write!(f, "out"),
        }
    }
}

/// Descriptor for a node's port, as declared by its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PortDescriptor {
    pub slot: String,
    pub direction: PortDirection,
    /// Hidden ports keep their connections but are neither drawn nor snap targets.
    pub visible: bool,
}

impl PortDescriptor {
    pub fn input(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            direction: PortDirection::Input,
            visible: true,
        }
    }

    pub fn output(slot: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            direction: PortDirection::Output,
            visible: true,
        }
    }

    pub fn visible_if(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// A materialized port on a node.
#[derive(Debug, Clone)]
pub struct Port {
    pub slot: String,
    pub direction: PortDirection,
    pub visible: bool,
    /// Centre of the port relative to the node's top-left corner.
    pub offset: Vec2,
    /// Attached connections in attachment order. For input ports the last
    /// complete one is the active producer.
    pub connections: Vec<ConnectionId>,
    /// Value of the bound parameter before the first connection was attached.
    pub(crate) saved_value: Option<ParamValue>,
}

impl Port {
    pub fn from_descriptor(desc: &PortDescriptor) -> Self {
        Self {
            slot: desc.slot.clone(),
            direction: desc.direction,
            visible: desc.visible,
            offset: Vec2::ZERO,
            connections: Vec::new(),
            saved_value: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    pub(crate) fn attach(&mut self, id: ConnectionId) {
        if !self.connections.contains(&id) {
            self.connections.push(id);
        }
    }

    pub(crate) fn detach(&mut self, id: ConnectionId) {
        self.connections.retain(|c| *c != id);
    }
}
