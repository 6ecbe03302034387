//! The graph arena: nodes, ports and connections.
//!
//! Nodes and connections live in ordered maps keyed by their ids; ports live
//! inside their node and refer to attached connections by id only. A
//! connection names its endpoints by `PortRef`. Nothing owns anything
//! cyclically, and every cross-reference is resolved through the graph.
//!
//! Invariants maintained by every public operation:
//! - node and connection ids are issued once and never reused;
//! - every endpoint of every connection resolves to a port in the node set,
//!   and that port lists the connection;
//! - no connection joins two ports of the same direction;
//! - a connection has both endpoints except while one end is detached by
//!   `detach_endpoint` during a reconnect gesture.

use super::id::{ConnectionId, IdSequence, NodeId, PortRef};
use super::kind::{ParamBinding, SlotValues, SELECTION_KEY};
use super::kinds::{IfKind, LoopType};
use super::node::Node;
use super::port::{Port, PortDirection};
use super::registry::KindRegistry;
use super::value::{ParamValue, Parameters};
use crate::error::{EditorError, Result};
use crate::robot::RobotModel;
use egui::{Pos2, Vec2};
use std::collections::BTreeMap;

/// Which end of a connection an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The producing (output) end.
    Out,
    /// The consuming (input) end.
    In,
}

impl Endpoint {
    pub fn direction(self) -> PortDirection {
        match self {
            Endpoint::Out => PortDirection::Output,
            Endpoint::In => PortDirection::Input,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Endpoint::Out => Endpoint::In,
            Endpoint::In => Endpoint::Out,
        }
    }
}

/// Directed link from an output port to an input port.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: ConnectionId,
    pub out_port: Option<PortRef>,
    pub in_port: Option<PortRef>,
}

impl Connection {
    pub fn is_complete(&self) -> bool {
        self.out_port.is_some() && self.in_port.is_some()
    }

    pub fn endpoint(&self, which: Endpoint) -> Option<&PortRef> {
        match which {
            Endpoint::Out => self.out_port.as_ref(),
            Endpoint::In => self.in_port.as_ref(),
        }
    }

    fn endpoint_mut(&mut self, which: Endpoint) -> &mut Option<PortRef> {
        match which {
            Endpoint::Out => &mut self.out_port,
            Endpoint::In => &mut self.in_port,
        }
    }

    /// Whether either endpoint sits on `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.out_port.as_ref().map(|p| p.node) == Some(node)
            || self.in_port.as_ref().map(|p| p.node) == Some(node)
    }
}

/// All nodes and connections on the canvas.
#[derive(Debug, Clone)]
pub struct Graph {
    registry: KindRegistry,
    nodes: BTreeMap<NodeId, Node>,
    connections: BTreeMap<ConnectionId, Connection>,
    node_ids: IdSequence,
    connection_ids: IdSequence,
    /// Bumped by every mutation that can change generated code.
    revision: u64,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(KindRegistry::with_builtins())
    }
}

impl Graph {
    pub fn new(registry: KindRegistry) -> Self {
        Self {
            registry,
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            node_ids: IdSequence::new(),
            connection_ids: IdSequence::new(),
            revision: 0,
        }
    }

    // ==================== Accessors ====================

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    /// Registry access for registering kinds before the palette is built.
    pub fn registry_mut(&mut self) -> &mut KindRegistry {
        &mut self.registry
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn resolve_port(&self, port: &PortRef) -> Option<&Port> {
        self.nodes.get(&port.node).and_then(|n| n.port(&port.slot))
    }

    /// World position of a port centre.
    pub fn port_position(&self, port: &PortRef) -> Option<Pos2> {
        self.nodes
            .get(&port.node)
            .and_then(|n| n.port_position(&port.slot))
    }

    /// Every connection with an endpoint on `node`.
    pub fn connections_of(&self, node: NodeId) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|c| c.touches(node))
            .map(|c| c.id)
            .collect()
    }

    /// Human-readable `"<node name>.<slot>"` label of an output port.
    pub fn port_label(&self, port: &PortRef) -> String {
        match self.nodes.get(&port.node) {
            Some(node) => format!("{}.{}", node.name, port.slot),
            None => port.slot.clone(),
        }
    }

    /// The connection currently feeding an input port: the most recently
    /// attached complete one.
    pub fn active_connection(&self, input: &PortRef) -> Option<&Connection> {
        let port = self.resolve_port(input)?;
        port.connections
            .iter()
            .rev()
            .filter_map(|id| self.connections.get(id))
            .find(|c| c.is_complete())
    }

    // ==================== Nodes ====================

    /// Create a node of `kind` with its top-left corner at `position`.
    /// `overrides` replace default parameters; a `selection` override picks
    /// the initial feature.
    pub fn create_node(&mut self, kind: &str, position: Pos2, overrides: &Parameters) -> Result<NodeId> {
        if !self.registry.contains(kind) {
            return Err(EditorError::UnknownKind(kind.to_string()));
        }
        let id = NodeId(
            self.node_ids
                .next_raw()
                .ok_or(EditorError::IdsExhausted("node"))?,
        );
        let mut node = self.registry.create(kind, id, position)?;

        for (key, value) in overrides.iter() {
            if key == SELECTION_KEY {
                let feature = value.to_string();
                if node.features().contains(&feature) {
                    node.kind().clone().apply_feature(node.params_mut(), &feature);
                    node.params_mut().set(SELECTION_KEY, feature);
                } else {
                    tracing::warn!("Ignoring unknown feature '{}' for {}", feature, node.kind_name());
                }
            } else if node.kind().accepts(key, value) {
                node.params_mut().set(key, value.clone());
            } else {
                tracing::warn!("Ignoring invalid override {}={} for {}", key, value, node.kind_name());
            }
        }

        node.sync_ports();
        let layout = node.compute_layout();
        node.apply_layout(&layout);

        tracing::info!("Node created: {} (ID: {})", node.name, id);
        self.nodes.insert(id, node);
        self.revision += 1;
        Ok(id)
    }

    /// Delete nodes, removing every incident connection first. Unknown ids
    /// are skipped. Returns how many nodes were removed.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> usize {
        let mut deleted = 0;
        for &id in ids {
            if !self.nodes.contains_key(&id) {
                continue;
            }
            for conn in self.connections_of(id) {
                self.remove_connection(conn);
            }
            if let Some(node) = self.nodes.remove(&id) {
                tracing::info!("Node deleted: {} (ID: {})", node.name, id);
                deleted += 1;
            }
        }
        if deleted > 0 {
            self.revision += 1;
        }
        deleted
    }

    pub fn move_node(&mut self, id: NodeId, delta: Vec2) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        node.position += delta;
        Ok(())
    }

    pub fn set_node_position(&mut self, id: NodeId, position: Pos2) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        node.position = position;
        Ok(())
    }

    pub fn set_node_gradient(&mut self, id: NodeId, gradient: (String, String)) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        node.gradient = Some(gradient);
        Ok(())
    }

    /// Change a node's title. Labels already propagated downstream keep the
    /// old name until their connection is remade.
    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        node.name = name.into();
        self.revision += 1;
        Ok(())
    }

    /// Edit one parameter. The key must already exist and the kind must
    /// accept the value. Editing `selection`, or a key the features derive,
    /// selects the matching feature so the two never disagree.
    pub fn set_parameter(&mut self, id: NodeId, key: &str, value: ParamValue) -> Result<()> {
        if key == SELECTION_KEY {
            return self.select_feature(id, &value.to_string());
        }
        let node = self.nodes.get(&id).ok_or(EditorError::UnknownNode(id))?;
        match derived_edit(node, key, &value) {
            DerivedEdit::Plain => {}
            DerivedEdit::Feature(feature) => return self.select_feature(id, &feature),
            DerivedEdit::Rejected => {
                return Err(EditorError::InvalidParameter {
                    node: id,
                    key: key.to_string(),
                })
            }
        }
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        if !node.params().contains(key) || !node.kind().accepts(key, &value) {
            return Err(EditorError::InvalidParameter {
                node: id,
                key: key.to_string(),
            });
        }
        node.params_mut().set(key, value);
        if node.kind().affects_layout(key) {
            self.resync_ports(id);
        }
        self.revision += 1;
        Ok(())
    }

    /// Select one of the node's palette features and update derived parameters.
    pub fn select_feature(&mut self, id: NodeId, feature: &str) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        if !node.features().iter().any(|f| f == feature) {
            return Err(EditorError::InvalidParameter {
                node: id,
                key: SELECTION_KEY.to_string(),
            });
        }
        let kind = node.kind().clone();
        let layout_changed = kind.apply_feature(node.params_mut(), feature);
        node.params_mut().set(SELECTION_KEY, feature);
        if layout_changed {
            self.resync_ports(id);
        }
        self.revision += 1;
        Ok(())
    }

    /// Switch a `while_loop` node between its sub-modes.
    pub fn set_loop_type(&mut self, id: NodeId, mode: LoopType) -> Result<()> {
        let node = self.nodes.get(&id).ok_or(EditorError::UnknownNode(id))?;
        if node.kind_name() != "while_loop" {
            return Err(EditorError::InvalidParameter {
                node: id,
                key: "loop_type".to_string(),
            });
        }
        self.select_feature(id, mode.label())
    }

    /// Append an elif branch to an `if` node. Returns the new branch index.
    pub fn add_elif(&mut self, id: NodeId) -> Result<usize> {
        let node = self.if_node_mut(id)?;
        let mut list = node.params().list(IfKind::ELIF_KEY).to_vec();
        list.push(ParamValue::text(""));
        let index = list.len() - 1;
        node.params_mut().set(IfKind::ELIF_KEY, ParamValue::List(list));
        self.resync_ports(id);
        self.revision += 1;
        tracing::debug!("Added elif_{} to node {}", index, id);
        Ok(index)
    }

    /// Remove the last elif branch of an `if` node, deleting connections on
    /// its two ports first. Returns `false` when there was none.
    pub fn remove_elif(&mut self, id: NodeId) -> Result<bool> {
        let count = IfKind::elif_count(self.if_node_mut(id)?.params());
        if count == 0 {
            return Ok(false);
        }
        let index = count - 1;
        for slot in [format!("elif_{index}"), format!("out_elif_{index}")] {
            let attached = self
                .resolve_port(&PortRef::new(id, slot))
                .map(|p| p.connections.clone())
                .unwrap_or_default();
            for conn in attached {
                self.remove_connection(conn);
            }
        }

        let node = self.if_node_mut(id)?;
        let mut list = node.params().list(IfKind::ELIF_KEY).to_vec();
        list.pop();
        node.params_mut().set(IfKind::ELIF_KEY, ParamValue::List(list));
        self.resync_ports(id);
        self.revision += 1;
        tracing::debug!("Removed elif_{} from node {}", index, id);
        Ok(true)
    }

    fn if_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        let node = self.nodes.get_mut(&id).ok_or(EditorError::UnknownNode(id))?;
        if node.kind_name() != "if" {
            return Err(EditorError::InvalidParameter {
                node: id,
                key: IfKind::ELIF_KEY.to_string(),
            });
        }
        Ok(node)
    }

    /// Rebuild a node's ports after a structural parameter change, dropping
    /// connections whose port disappeared.
    fn resync_ports(&mut self, id: NodeId) {
        let orphans = match self.nodes.get_mut(&id) {
            Some(node) => node.sync_ports(),
            None => return,
        };
        for conn in orphans {
            self.remove_connection(conn);
        }
    }

    /// Evaluate one node's `execute` transform.
    pub fn execute_node(
        &self,
        id: NodeId,
        inputs: &SlotValues,
        robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let node = self.nodes.get(&id).ok_or(EditorError::UnknownNode(id))?;
        node.kind().execute(node.params(), inputs, robot)
    }

    // ==================== Layout ====================

    /// Recompute layout for every dirty node. Returns how many were laid out.
    pub fn flush_layout(&mut self) -> usize {
        let mut count = 0;
        for node in self.nodes.values_mut().filter(|n| n.is_layout_dirty()) {
            let layout = node.compute_layout();
            node.apply_layout(&layout);
            count += 1;
        }
        if count > 0 {
            tracing::debug!("Layout pass: {} node(s)", count);
        }
        count
    }

    pub fn has_dirty_layout(&self) -> bool {
        self.nodes.values().any(|n| n.is_layout_dirty())
    }

    // ==================== Connections ====================

    /// Connect two ports of opposite direction. The arguments may be given in
    /// either order. Connecting an already connected pair returns the
    /// existing connection.
    pub fn connect(&mut self, a: &PortRef, b: &PortRef) -> Result<ConnectionId> {
        let dir_a = self.port_direction(a)?;
        let dir_b = self.port_direction(b)?;
        if dir_a == dir_b {
            return Err(EditorError::DirectionMismatch {
                from: a.clone(),
                to: b.clone(),
            });
        }
        let (out_ref, in_ref) = match dir_a {
            PortDirection::Output => (a.clone(), b.clone()),
            PortDirection::Input => (b.clone(), a.clone()),
        };

        if let Some(existing) = self.connections.values().find(|c| {
            c.out_port.as_ref() == Some(&out_ref) && c.in_port.as_ref() == Some(&in_ref)
        }) {
            return Ok(existing.id);
        }

        let id = ConnectionId(
            self.connection_ids
                .next_raw()
                .ok_or(EditorError::IdsExhausted("connection"))?,
        );
        self.attach(&out_ref, id);
        self.attach(&in_ref, id);
        self.connections.insert(
            id,
            Connection {
                id,
                out_port: Some(out_ref.clone()),
                in_port: Some(in_ref.clone()),
            },
        );
        self.propagate(&in_ref);
        self.revision += 1;
        tracing::info!("Connected {} -> {} ({})", out_ref, in_ref, id);
        Ok(id)
    }

    /// Remove a connection, restoring the destination parameter.
    pub fn disconnect(&mut self, id: ConnectionId) -> Result<()> {
        if !self.connections.contains_key(&id) {
            return Err(EditorError::UnknownConnection(id));
        }
        self.remove_connection(id);
        self.revision += 1;
        tracing::info!("Disconnected {}", id);
        Ok(())
    }

    /// Detach one endpoint of a connection, leaving it half-open. Used while
    /// a reconnect gesture is in flight. Returns the port that was detached.
    pub fn detach_endpoint(&mut self, id: ConnectionId, which: Endpoint) -> Result<PortRef> {
        let conn = self
            .connections
            .get_mut(&id)
            .ok_or(EditorError::UnknownConnection(id))?;
        if conn.endpoint(which.other()).is_none() {
            // Never leave a connection with no endpoint at all.
            return Err(EditorError::UnknownConnection(id));
        }
        let port = conn
            .endpoint_mut(which)
            .take()
            .ok_or(EditorError::UnknownConnection(id))?;
        let input = match which {
            Endpoint::In => Some(port.clone()),
            Endpoint::Out => conn.in_port.clone(),
        };
        self.detach(&port, id);
        if let Some(input) = input {
            self.propagate(&input);
        }
        self.revision += 1;
        tracing::debug!("Detached {:?} end of {} from {}", which, id, port);
        Ok(port)
    }

    /// Rebind one endpoint of a connection. Rejected with the graph untouched
    /// when the new port has the wrong direction, the fixed end is gone, or
    /// another connection already links the resulting port pair.
    pub fn reconnect(&mut self, id: ConnectionId, new_port: &PortRef, which: Endpoint) -> Result<()> {
        let conn = self
            .connections
            .get(&id)
            .ok_or(EditorError::UnknownConnection(id))?
            .clone();
        let new_dir = self.port_direction(new_port)?;
        let fixed = conn.endpoint(which.other()).cloned();
        if let Some(fixed) = &fixed {
            self.port_direction(fixed)?;
        }
        if new_dir != which.direction() {
            return Err(EditorError::DirectionMismatch {
                from: fixed.unwrap_or_else(|| new_port.clone()),
                to: new_port.clone(),
            });
        }

        let pair = match which {
            Endpoint::In => (fixed.as_ref(), Some(new_port)),
            Endpoint::Out => (Some(new_port), fixed.as_ref()),
        };
        if let (Some(out_ref), Some(in_ref)) = pair {
            if let Some(existing) = self.connections.values().find(|c| {
                c.id != id
                    && c.out_port.as_ref() == Some(out_ref)
                    && c.in_port.as_ref() == Some(in_ref)
            }) {
                return Err(EditorError::DuplicateConnection(existing.id));
            }
        }

        if let Some(old) = conn.endpoint(which).cloned() {
            self.detach(&old, id);
            if which == Endpoint::In {
                self.propagate(&old);
            }
        }
        self.attach(new_port, id);
        if let Some(c) = self.connections.get_mut(&id) {
            *c.endpoint_mut(which) = Some(new_port.clone());
        }
        let in_ref = match which {
            Endpoint::In => Some(new_port.clone()),
            Endpoint::Out => fixed,
        };
        if let Some(in_ref) = in_ref {
            self.propagate(&in_ref);
        }
        self.revision += 1;
        tracing::info!("Reconnected {:?} end of {} to {}", which, id, new_port);
        Ok(())
    }

    fn port_direction(&self, port: &PortRef) -> Result<PortDirection> {
        self.resolve_port(port)
            .map(|p| p.direction)
            .ok_or_else(|| EditorError::DanglingPort(port.clone()))
    }

    fn attach(&mut self, port: &PortRef, id: ConnectionId) {
        if let Some(p) = self
            .nodes
            .get_mut(&port.node)
            .and_then(|n| n.port_mut(&port.slot))
        {
            p.attach(id);
        }
    }

    fn detach(&mut self, port: &PortRef, id: ConnectionId) {
        if let Some(p) = self
            .nodes
            .get_mut(&port.node)
            .and_then(|n| n.port_mut(&port.slot))
        {
            p.detach(id);
        }
    }

    /// Drop a connection from the arena and both ports, then re-propagate its
    /// input end.
    fn remove_connection(&mut self, id: ConnectionId) {
        let Some(conn) = self.connections.remove(&id) else {
            return;
        };
        if let Some(out) = &conn.out_port {
            self.detach(out, id);
        }
        if let Some(input) = &conn.in_port {
            self.detach(input, id);
            self.propagate(input);
        }
    }

    /// Write the active producer's label into the parameter bound to an input
    /// port, or restore the pre-connect value once nothing feeds it.
    fn propagate(&mut self, input: &PortRef) {
        let label = self
            .active_connection(input)
            .and_then(|c| c.out_port.clone())
            .map(|out| self.port_label(&out));

        let Some(node) = self.nodes.get_mut(&input.node) else {
            return;
        };
        let Some(binding) = node.kind().binding(&input.slot) else {
            return;
        };
        let current = read_binding(node.params(), &binding);
        let Some(port) = node.port_mut(&input.slot) else {
            return;
        };

        let value = match label {
            Some(label) => {
                if port.saved_value.is_none() {
                    port.saved_value = current;
                }
                Some(ParamValue::Text(label))
            }
            None => port.saved_value.take(),
        };
        if let Some(value) = value {
            write_binding(node.params_mut(), &binding, value);
        }
    }

    // ==================== Invariants ====================

    /// Verify the arena's cross-references. Returns the first broken one.
    pub fn check_invariants(&self) -> Result<()> {
        for conn in self.connections.values() {
            if conn.out_port.is_none() && conn.in_port.is_none() {
                return Err(EditorError::UnknownConnection(conn.id));
            }
            for (which, port) in [(Endpoint::Out, &conn.out_port), (Endpoint::In, &conn.in_port)] {
                let Some(port_ref) = port else { continue };
                let port = self
                    .resolve_port(port_ref)
                    .ok_or_else(|| EditorError::DanglingPort(port_ref.clone()))?;
                if port.direction != which.direction() || !port.connections.contains(&conn.id) {
                    return Err(EditorError::DanglingPort(port_ref.clone()));
                }
            }
        }
        for node in self.nodes.values() {
            for port in node.ports() {
                for conn in &port.connections {
                    if !self.connections.contains_key(conn) {
                        return Err(EditorError::UnknownConnection(*conn));
                    }
                }
            }
        }
        Ok(())
    }
}

fn read_binding(params: &Parameters, binding: &ParamBinding) -> Option<ParamValue> {
    match binding {
        ParamBinding::Field(key) => Some(params.get(key).cloned().unwrap_or_else(|| ParamValue::text(""))),
        ParamBinding::ListItem(key, index) => params.list(key).get(*index).cloned(),
    }
}

fn write_binding(params: &mut Parameters, binding: &ParamBinding, value: ParamValue) {
    match binding {
        ParamBinding::Field(key) => params.set(key, value),
        ParamBinding::ListItem(key, index) => {
            if let Some(slot) = params
                .get_mut(key)
                .and_then(ParamValue::as_list_mut)
                .and_then(|list| list.get_mut(*index))
            {
                *slot = value;
            }
        }
    }
}

/// How `set_parameter` treats a key with respect to the node's features.
enum DerivedEdit {
    /// No feature derives the key.
    Plain,
    /// Selecting this feature produces the requested value.
    Feature(String),
    /// The features derive the key but none produces the value.
    Rejected,
}

fn derived_edit(node: &Node, key: &str, value: &ParamValue) -> DerivedEdit {
    let kind = node.kind();
    let outcomes: Vec<(String, Option<ParamValue>)> = node
        .features()
        .into_iter()
        .map(|feature| {
            let mut params = node.params().clone();
            kind.apply_feature(&mut params, &feature);
            let derived = params.get(key).cloned();
            (feature, derived)
        })
        .collect();

    let derives_key = outcomes
        .windows(2)
        .any(|pair| pair[0].1 != pair[1].1);
    if !derives_key {
        return DerivedEdit::Plain;
    }
    outcomes
        .into_iter()
        .find(|(_, derived)| derived.as_ref() == Some(value))
        .map_or(DerivedEdit::Rejected, |(feature, _)| DerivedEdit::Feature(feature))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::default()
    }

    fn add(g: &mut Graph, kind: &str) -> NodeId {
        g.create_node(kind, Pos2::ZERO, &Parameters::new()).unwrap()
    }

    #[test]
    fn test_ids_are_monotonic_and_never_reused() {
        let mut g = graph();
        let a = add(&mut g, "stop");
        let b = add(&mut g, "stop");
        g.delete_nodes(&[b]);
        let c = add(&mut g, "stop");
        assert!(a < b && b < c);
        assert_eq!(c, NodeId(2));
    }

    #[test]
    fn test_create_unknown_kind() {
        let mut g = graph();
        let err = g.create_node("teleport", Pos2::ZERO, &Parameters::new()).unwrap_err();
        assert!(matches!(err, EditorError::UnknownKind(_)));
        assert_eq!(g.node_count(), 0);
    }

    #[test]
    fn test_create_with_overrides_and_selection() {
        let mut g = graph();
        let overrides = Parameters::new()
            .with(SELECTION_KEY, "Walk")
            .with("bogus_is_fine", 1i64);
        let id = g.create_node("action_execution", Pos2::ZERO, &overrides).unwrap();
        let node = g.node(id).unwrap();
        assert_eq!(node.selection(), Some("Walk"));
        assert_eq!(node.params().text("action"), "walk");
        assert!(!node.is_layout_dirty());
    }

    #[test]
    fn test_connect_propagates_label() {
        let mut g = graph();
        let action = add(&mut g, "action_execution");
        let cond = add(&mut g, "if");
        let conn = g
            .connect(&PortRef::new(action, "out"), &PortRef::new(cond, "condition"))
            .unwrap();
        assert_eq!(
            g.node(cond).unwrap().params().text("condition_expr"),
            "Action Execution.out"
        );
        assert!(g.resolve_port(&PortRef::new(action, "out")).unwrap().connections.contains(&conn));
        g.check_invariants().unwrap();
    }

    #[test]
    fn test_connect_accepts_reversed_arguments() {
        let mut g = graph();
        let a = add(&mut g, "stop");
        let b = add(&mut g, "stop");
        let conn = g.connect(&PortRef::new(b, "in"), &PortRef::new(a, "out")).unwrap();
        let c = g.connection(conn).unwrap();
        assert_eq!(c.out_port, Some(PortRef::new(a, "out")));
        assert_eq!(c.in_port, Some(PortRef::new(b, "in")));
    }

    #[test]
    fn test_connect_same_direction_fails_without_change() {
        let mut g = graph();
        let a = add(&mut g, "stop");
        let b = add(&mut g, "stop");
        let before = g.revision();
        let err = g
            .connect(&PortRef::new(a, "out"), &PortRef::new(b, "out"))
            .unwrap_err();
        assert!(matches!(err, EditorError::DirectionMismatch { .. }));
        assert_eq!(g.connection_count(), 0);
        assert_eq!(g.revision(), before);
    }

    #[test]
    fn test_connect_dangling_port() {
        let mut g = graph();
        let a = add(&mut g, "stop");
        let err = g
            .connect(&PortRef::new(a, "out"), &PortRef::new(NodeId(99), "in"))
            .unwrap_err();
        assert!(matches!(err, EditorError::DanglingPort(_)));
    }

    #[test]
    fn test_disconnect_restores_pre_connect_value() {
        let mut g = graph();
        let src = add(&mut g, "sensor_input");
        let cmp = add(&mut g, "comparison");
        g.set_parameter(cmp, "left", ParamValue::text("distance")).unwrap();
        let conn = g
            .connect(&PortRef::new(src, "out"), &PortRef::new(cmp, "left"))
            .unwrap();
        assert_eq!(g.node(cmp).unwrap().params().text("left"), "Sensor Input.out");
        g.disconnect(conn).unwrap();
        assert_eq!(g.node(cmp).unwrap().params().text("left"), "distance");
    }

    #[test]
    fn test_second_connection_becomes_active() {
        let mut g = graph();
        let a = add(&mut g, "sensor_input");
        let b = add(&mut g, "action_execution");
        let cond = add(&mut g, "if");
        let input = PortRef::new(cond, "condition");
        let first = g.connect(&PortRef::new(a, "out"), &input).unwrap();
        let second = g.connect(&PortRef::new(b, "out"), &input).unwrap();
        assert_eq!(g.active_connection(&input).unwrap().id, second);
        assert_eq!(g.node(cond).unwrap().params().text("condition_expr"), "Action Execution.out");

        g.disconnect(second).unwrap();
        assert_eq!(g.active_connection(&input).unwrap().id, first);
        assert_eq!(g.node(cond).unwrap().params().text("condition_expr"), "Sensor Input.out");

        g.disconnect(first).unwrap();
        assert_eq!(g.node(cond).unwrap().params().text("condition_expr"), "");
    }

    #[test]
    fn test_delete_node_cascades_connections() {
        let mut g = graph();
        let a = add(&mut g, "action_execution");
        let cond = add(&mut g, "if");
        let b = add(&mut g, "stop");
        g.connect(&PortRef::new(a, "out"), &PortRef::new(cond, "condition")).unwrap();
        g.connect(&PortRef::new(cond, "out_true"), &PortRef::new(b, "in")).unwrap();

        assert_eq!(g.delete_nodes(&[a]), 1);
        assert_eq!(g.connection_count(), 1);
        assert_eq!(g.node(cond).unwrap().params().text("condition_expr"), "");
        assert!(g.connections().all(|c| !c.touches(a)));
        g.check_invariants().unwrap();
    }

    #[test]
    fn test_reconnect_moves_input_end() {
        let mut g = graph();
        let src = add(&mut g, "sensor_input");
        let cmp = add(&mut g, "comparison");
        let conn = g
            .connect(&PortRef::new(src, "out"), &PortRef::new(cmp, "left"))
            .unwrap();
        g.reconnect(conn, &PortRef::new(cmp, "right"), Endpoint::In).unwrap();
        let params = g.node(cmp).unwrap().params();
        assert_eq!(params.text("left"), "");
        assert_eq!(params.text("right"), "Sensor Input.out");
        g.check_invariants().unwrap();
    }

    #[test]
    fn test_reconnect_wrong_direction_leaves_state_intact() {
        let mut g = graph();
        let src = add(&mut g, "sensor_input");
        let cmp = add(&mut g, "comparison");
        let conn = g
            .connect(&PortRef::new(src, "out"), &PortRef::new(cmp, "left"))
            .unwrap();
        let before = g.connection(conn).cloned();
        let err = g
            .reconnect(conn, &PortRef::new(cmp, "result"), Endpoint::In)
            .unwrap_err();
        assert!(matches!(err, EditorError::DirectionMismatch { .. }));
        assert_eq!(g.connection(conn).cloned(), before);
        assert_eq!(g.node(cmp).unwrap().params().text("left"), "Sensor Input.out");
    }

    #[test]
    fn test_reconnect_onto_linked_pair_is_rejected() {
        let mut g = graph();
        let a = add(&mut g, "action_execution");
        let b = add(&mut g, "stop");
        let c = add(&mut g, "stop");
        let first = g
            .connect(&PortRef::new(a, "out"), &PortRef::new(b, "in"))
            .unwrap();
        let second = g
            .connect(&PortRef::new(a, "out"), &PortRef::new(c, "in"))
            .unwrap();
        let rev = g.revision();

        let err = g
            .reconnect(second, &PortRef::new(b, "in"), Endpoint::In)
            .unwrap_err();
        assert!(matches!(err, EditorError::DuplicateConnection(id) if id == first));
        assert_eq!(g.connection_count(), 2);
        assert_eq!(
            g.connection(second).and_then(|conn| conn.in_port.clone()),
            Some(PortRef::new(c, "in"))
        );
        assert_eq!(g.revision(), rev);
        g.check_invariants().unwrap();
    }

    #[test]
    fn test_detach_then_reconnect_out_end() {
        let mut g = graph();
        let a = add(&mut g, "sensor_input");
        let b = add(&mut g, "action_execution");
        let cond = add(&mut g, "if");
        let conn = g
            .connect(&PortRef::new(a, "out"), &PortRef::new(cond, "condition"))
            .unwrap();
        let detached = g.detach_endpoint(conn, Endpoint::Out).unwrap();
        assert_eq!(detached, PortRef::new(a, "out"));
        assert!(!g.connection(conn).unwrap().is_complete());
        assert_eq!(g.node(cond).unwrap().params().text("condition_expr"), "");
        g.check_invariants().unwrap();

        g.reconnect(conn, &PortRef::new(b, "out"), Endpoint::Out).unwrap();
        assert_eq!(g.node(cond).unwrap().params().text("condition_expr"), "Action Execution.out");
        g.check_invariants().unwrap();
    }

    #[test]
    fn test_elif_branches() {
        let mut g = graph();
        let src = add(&mut g, "sensor_input");
        let cond = add(&mut g, "if");
        assert_eq!(g.add_elif(cond).unwrap(), 0);
        assert_eq!(g.add_elif(cond).unwrap(), 1);
        assert!(g.has_dirty_layout());
        assert_eq!(g.flush_layout(), 1);
        assert_eq!(g.node(cond).unwrap().size().y, 140.0 + 48.0);

        g.connect(&PortRef::new(src, "out"), &PortRef::new(cond, "elif_1")).unwrap();
        assert_eq!(
            g.node(cond).unwrap().params().list(IfKind::ELIF_KEY)[1],
            ParamValue::text("Sensor Input.out")
        );

        assert!(g.remove_elif(cond).unwrap());
        assert_eq!(g.connection_count(), 0);
        assert!(g.node(cond).unwrap().port("elif_1").is_none());
        assert!(g.remove_elif(cond).unwrap());
        assert!(!g.remove_elif(cond).unwrap());
        g.check_invariants().unwrap();
    }

    #[test]
    fn test_add_elif_on_wrong_kind() {
        let mut g = graph();
        let stop = add(&mut g, "stop");
        assert!(matches!(
            g.add_elif(stop),
            Err(EditorError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_loop_type_toggle_marks_layout_dirty() {
        let mut g = graph();
        let lp = add(&mut g, "while_loop");
        g.set_loop_type(lp, LoopType::For).unwrap();
        assert!(g.node(lp).unwrap().is_layout_dirty());
        g.flush_layout();
        let node = g.node(lp).unwrap();
        assert_eq!(node.size().y, 170.0);
        assert!(node.port("for_start").unwrap().visible);
        assert!(!node.port("condition").unwrap().visible);
        assert_eq!(node.selection(), Some("For"));
    }

    #[test]
    fn test_set_parameter_validation() {
        let mut g = graph();
        let lp = add(&mut g, "while_loop");
        assert!(g.set_parameter(lp, "missing", ParamValue::Int(1)).is_err());
        assert!(g.set_parameter(lp, "loop_type", ParamValue::text("until")).is_err());
        g.set_parameter(lp, "for_end", ParamValue::Int(5)).unwrap();
        assert_eq!(g.node(lp).unwrap().params().get("for_end"), Some(&ParamValue::Int(5)));
    }

    #[test]
    fn test_derived_parameter_edit_selects_feature() {
        let mut g = graph();
        let lp = add(&mut g, "while_loop");
        g.set_parameter(lp, "loop_type", ParamValue::text("for")).unwrap();
        g.flush_layout();
        let node = g.node(lp).unwrap();
        assert_eq!(node.selection(), Some("For"));
        assert!(node.port("for_end").unwrap().visible);

        let cmp = add(&mut g, "comparison");
        g.set_parameter(cmp, "operator", ParamValue::text(">")).unwrap();
        assert_eq!(g.node(cmp).unwrap().selection(), Some("Greater Than"));

        let act = add(&mut g, "action_execution");
        let rev = g.revision();
        assert!(g.set_parameter(act, "action", ParamValue::text("moonwalk")).is_err());
        assert_eq!(g.node(act).unwrap().params().text("action"), "stand");
        assert_eq!(g.revision(), rev);
        g.set_parameter(act, "action", ParamValue::text("walk")).unwrap();
        assert_eq!(g.node(act).unwrap().selection(), Some("Walk"));
    }

    #[test]
    fn test_move_does_not_bump_revision() {
        let mut g = graph();
        let a = add(&mut g, "stop");
        let rev = g.revision();
        g.move_node(a, egui::vec2(5.0, 5.0)).unwrap();
        assert_eq!(g.revision(), rev);
        assert_eq!(g.node(a).unwrap().position, Pos2::new(5.0, 5.0));
    }
}
