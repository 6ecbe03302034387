//! Nodes on the canvas.

use super::id::{ConnectionId, NodeId};
use super::kind::{NodeKind, FEATURES_KEY, SELECTION_KEY};
use super::layout::NodeLayout;
use super::port::{Port, PortDescriptor, PortDirection};
use super::value::{ParamValue, Parameters};
use egui::{Pos2, Rect, Vec2};
use std::sync::Arc;

/// A node instance: identity, title, kind, geometry, parameters and ports.
#[derive(Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    kind: Arc<dyn NodeKind>,
    /// Top-left corner in world coordinates.
    pub position: Pos2,
    size: Vec2,
    params: Parameters,
    ports: Vec<Port>,
    /// Gradient colours (start, end) chosen at creation.
    pub gradient: Option<(String, String)>,
    layout_dirty: bool,
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind.name())
            .field("position", &self.position)
            .field("params", &self.params)
            .finish()
    }
}

impl Node {
    /// Instantiate a node of `kind` with default parameters and the kind's
    /// default feature selected. Layout is left dirty.
    pub fn new(id: NodeId, kind: Arc<dyn NodeKind>, position: Pos2) -> Self {
        let mut params = kind.default_parameters();
        let features = kind.features();
        params.set(
            FEATURES_KEY,
            ParamValue::List(features.iter().cloned().map(ParamValue::Text).collect()),
        );
        if let Some(feature) = kind.default_feature() {
            kind.apply_feature(&mut params, &feature);
            params.set(SELECTION_KEY, feature);
        }
        let ports = kind.ports(&params).iter().map(Port::from_descriptor).collect();

        Self {
            id,
            name: kind.display_name().to_string(),
            kind,
            position,
            size: Vec2::ZERO,
            params,
            ports,
            gradient: None,
            layout_dirty: true,
        }
    }

    pub fn kind(&self) -> &Arc<dyn NodeKind> {
        &self.kind
    }

    pub fn kind_name(&self) -> &str {
        self.kind.name()
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    pub(crate) fn params_mut(&mut self) -> &mut Parameters {
        &mut self.params
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn port(&self, slot: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.slot == slot)
    }

    pub(crate) fn port_mut(&mut self, slot: &str) -> Option<&mut Port> {
        self.ports.iter_mut().find(|p| p.slot == slot)
    }

    /// Currently selected palette feature, if any.
    pub fn selection(&self) -> Option<&str> {
        self.params
            .get(SELECTION_KEY)
            .and_then(ParamValue::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn features(&self) -> Vec<String> {
        self.params
            .list(FEATURES_KEY)
            .iter()
            .map(|f| f.to_string())
            .collect()
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    /// World position of a port centre.
    pub fn port_position(&self, slot: &str) -> Option<Pos2> {
        self.port(slot).map(|p| self.position + p.offset)
    }

    pub fn is_layout_dirty(&self) -> bool {
        self.layout_dirty
    }

    pub(crate) fn mark_layout_dirty(&mut self) {
        self.layout_dirty = true;
    }

    /// Compute the kind's layout for the current parameters.
    pub fn compute_layout(&self) -> NodeLayout {
        self.kind.layout(&self.params)
    }

    /// Store size and port offsets from `layout`. Ports the layout does not
    /// mention keep their previous offset.
    pub(crate) fn apply_layout(&mut self, layout: &NodeLayout) {
        self.size = layout.size;
        for port in &mut self.ports {
            if let Some(offset) = layout.offset_of(&port.slot) {
                port.offset = offset;
            }
        }
        self.layout_dirty = false;
    }

    /// Descriptors the kind declares for the current parameters.
    pub fn port_descriptors(&self) -> Vec<PortDescriptor> {
        self.kind.ports(&self.params)
    }

    /// Bring the port list in line with the kind's descriptors. Existing ports
    /// keep their connections; returns connections attached to ports that no
    /// longer exist so the graph can remove them.
    pub(crate) fn sync_ports(&mut self) -> Vec<ConnectionId> {
        let descriptors = self.port_descriptors();
        let mut old = std::mem::take(&mut self.ports);
        let mut ports = Vec::with_capacity(descriptors.len());
        for desc in &descriptors {
            match old.iter().position(|p| p.slot == desc.slot && p.direction == desc.direction) {
                Some(i) => {
                    let mut port = old.swap_remove(i);
                    port.visible = desc.visible;
                    ports.push(port);
                }
                None => ports.push(Port::from_descriptor(desc)),
            }
        }
        self.ports = ports;
        self.layout_dirty = true;
        old.into_iter().flat_map(|p| p.connections).collect()
    }

    /// Ports of one direction that can currently accept a drop.
    pub fn visible_ports(&self, direction: PortDirection) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(move |p| p.visible && p.direction == direction)
    }
}
