//! Pointer-driven interaction state machine.
//!
//! The host translates its raw input into [`PointerEvent`]s in canvas screen
//! coordinates and feeds them to [`Interaction::handle`], which mutates the
//! graph, selection and viewport and reports what happened as
//! [`Outcome`]s. Every recoverable graph error is absorbed here and turned
//! into an outcome; nothing propagates to the caller.
//!
//! ```text
//!                 press port            release (snap / miss)
//!   Idle ───────────────────────► DraggingConnection ──────────► Idle
//!    │ press marker                release (snap / miss)
//!    ├──────────────────────────► Reconnecting ────────────────► Idle
//!    │ press node                  release
//!    ├──────────────────────────► DraggingNodes ───────────────► Idle
//!    │ press empty                 release
//!    ├──────────────────────────► BoxSelecting ────────────────► Idle
//!    │ press middle/secondary      release
//!    └──────────────────────────► PanningView ─────────────────► Idle
//! ```

use super::curve::ConnectionCurve;
use super::selection::Selection;
use super::snap;
use super::viewport::Viewport;
use crate::config::CanvasSettings;
use crate::error::EditorError;
use crate::graph::{ConnectionId, Endpoint, Graph, NodeId, PortDirection, PortRef};
use egui::{Pos2, Rect};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
}

/// Input event in canvas screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press {
        pos: Pos2,
        button: PointerButton,
        /// Additive selection (shift held)
        additive: bool,
    },
    Move {
        pos: Pos2,
    },
    Release {
        pos: Pos2,
        button: PointerButton,
    },
    /// Wheel input; positive `delta` zooms in.
    Scroll {
        pos: Pos2,
        delta: f32,
    },
    Key(Key),
}

/// Current gesture. Positions are in world coordinates unless noted.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    Idle,
    /// A fresh connection from `from`; the free end follows the pointer.
    DraggingConnection {
        from: PortRef,
        direction: PortDirection,
        pointer: Pos2,
    },
    /// `connection` has its `moving` end detached; `fixed` stays attached.
    Reconnecting {
        connection: ConnectionId,
        fixed: PortRef,
        moving: Endpoint,
        pointer: Pos2,
    },
    /// `last` is in screen coordinates.
    PanningView {
        button: PointerButton,
        last: Pos2,
    },
    BoxSelecting {
        origin: Pos2,
        current: Pos2,
    },
    DraggingNodes {
        last: Pos2,
        moved: bool,
    },
}

impl InteractionState {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "Idle",
            InteractionState::DraggingConnection { .. } => "DraggingConnection",
            InteractionState::Reconnecting { .. } => "Reconnecting",
            InteractionState::PanningView { .. } => "PanningView",
            InteractionState::BoxSelecting { .. } => "BoxSelecting",
            InteractionState::DraggingNodes { .. } => "DraggingNodes",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a handled event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Connected(ConnectionId),
    Reconnected(ConnectionId),
    Disconnected(ConnectionId),
    Deleted { nodes: usize, connections: usize },
    NodesMoved(usize),
    SelectionChanged,
    ViewChanged,
    /// A connection gesture ended without a target.
    Discarded,
    /// Recovered failure worth showing to the user.
    Warning(String),
}

/// Endpoint marker of a hovered or selected connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointMarker {
    pub connection: ConnectionId,
    pub endpoint: Endpoint,
    pub position: Pos2,
}

#[derive(Debug, Clone)]
pub struct Interaction {
    state: InteractionState,
    pub viewport: Viewport,
    pub selection: Selection,
    hovered_connection: Option<ConnectionId>,
}

impl Default for Interaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Interaction {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            viewport: Viewport::default(),
            selection: Selection::default(),
            hovered_connection: None,
        }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn hovered_connection(&self) -> Option<ConnectionId> {
        self.hovered_connection
    }

    /// Rubber-band rectangle while box selecting.
    pub fn selection_rect(&self) -> Option<Rect> {
        match &self.state {
            InteractionState::BoxSelecting { origin, current } => {
                Some(Rect::from_two_pos(*origin, *current))
            }
            _ => None,
        }
    }

    /// Temporary link of an in-flight connection gesture, drawn from the
    /// output side to the input side.
    pub fn temp_link(&self, graph: &Graph) -> Option<ConnectionCurve> {
        let (fixed, fixed_dir, pointer) = match &self.state {
            InteractionState::DraggingConnection {
                from,
                direction,
                pointer,
            } => (from, *direction, *pointer),
            InteractionState::Reconnecting {
                fixed,
                moving,
                pointer,
                ..
            } => (fixed, moving.other().direction(), *pointer),
            _ => return None,
        };
        let anchor = graph.port_position(fixed)?;
        Some(match fixed_dir {
            PortDirection::Output => ConnectionCurve::new(anchor, pointer),
            PortDirection::Input => ConnectionCurve::new(pointer, anchor),
        })
    }

    /// Curve of a complete connection in world coordinates.
    pub fn connection_curve(graph: &Graph, id: ConnectionId) -> Option<ConnectionCurve> {
        let conn = graph.connection(id)?;
        let from = graph.port_position(conn.out_port.as_ref()?)?;
        let to = graph.port_position(conn.in_port.as_ref()?)?;
        Some(ConnectionCurve::new(from, to))
    }

    /// Markers shown on hovered and selected connections.
    pub fn endpoint_markers(&self, graph: &Graph) -> Vec<EndpointMarker> {
        let mut ids: Vec<ConnectionId> = self.selection.connections.iter().copied().collect();
        if let Some(hovered) = self.hovered_connection {
            if !ids.contains(&hovered) {
                ids.push(hovered);
            }
        }
        let mut markers = Vec::new();
        for id in ids {
            let Some(conn) = graph.connection(id).filter(|c| c.is_complete()) else {
                continue;
            };
            for endpoint in [Endpoint::Out, Endpoint::In] {
                if let Some(position) = conn.endpoint(endpoint).and_then(|p| graph.port_position(p)) {
                    markers.push(EndpointMarker {
                        connection: id,
                        endpoint,
                        position,
                    });
                }
            }
        }
        markers
    }

    /// Feed one event. Layout is flushed first so hit tests see current
    /// port positions.
    pub fn handle(
        &mut self,
        graph: &mut Graph,
        settings: &CanvasSettings,
        event: PointerEvent,
    ) -> Vec<Outcome> {
        graph.flush_layout();
        let outcomes = match event {
            PointerEvent::Press {
                pos,
                button,
                additive,
            } => self.on_press(graph, settings, pos, button, additive),
            PointerEvent::Move { pos } => self.on_move(graph, settings, pos),
            PointerEvent::Release { pos, button } => self.on_release(graph, settings, pos, button),
            PointerEvent::Scroll { pos, delta } => self.on_scroll(settings, pos, delta),
            PointerEvent::Key(key) => self.on_key(graph, key),
        };
        self.selection.retain_existing(graph);
        if self
            .hovered_connection
            .is_some_and(|id| graph.connection(id).is_none())
        {
            self.hovered_connection = None;
        }
        outcomes
    }

    fn transition(&mut self, next: InteractionState) {
        if self.state.name() != next.name() {
            tracing::debug!("Interaction: {} -> {}", self.state, next);
        }
        self.state = next;
    }

    // ==================== Press ====================

    fn on_press(
        &mut self,
        graph: &mut Graph,
        settings: &CanvasSettings,
        screen: Pos2,
        button: PointerButton,
        additive: bool,
    ) -> Vec<Outcome> {
        if !self.state.is_idle() {
            return Vec::new();
        }
        if button != PointerButton::Primary {
            self.transition(InteractionState::PanningView {
                button,
                last: screen,
            });
            return Vec::new();
        }

        let world = self.viewport.screen_to_world(screen);

        if let Some(marker) = self.marker_at(graph, settings, world) {
            return self.begin_reconnect(graph, marker, world);
        }

        let snap_radius = self.viewport.screen_len_to_world(settings.snap_radius);
        if let Some(hit) = snap::nearest_port(graph, world, snap_radius, |_, _| true) {
            self.transition(InteractionState::DraggingConnection {
                from: hit.port,
                direction: hit.direction,
                pointer: world,
            });
            return Vec::new();
        }

        if let Some(node) = node_at(graph, world) {
            if additive {
                self.selection.toggle_node(node);
            } else if !self.selection.nodes.contains(&node) {
                self.selection.select_only_node(node);
            }
            if self.selection.nodes.contains(&node) {
                self.transition(InteractionState::DraggingNodes {
                    last: world,
                    moved: false,
                });
            }
            return vec![Outcome::SelectionChanged];
        }

        if let Some(conn) = self.connection_at(graph, settings, world) {
            if additive {
                self.selection.toggle_connection(conn);
            } else {
                self.selection.select_only_connection(conn);
            }
            return vec![Outcome::SelectionChanged];
        }

        let had_selection = !self.selection.is_empty();
        if !additive {
            self.selection.clear();
        }
        self.transition(InteractionState::BoxSelecting {
            origin: world,
            current: world,
        });
        if had_selection && !additive {
            vec![Outcome::SelectionChanged]
        } else {
            Vec::new()
        }
    }

    fn begin_reconnect(&mut self, graph: &mut Graph, marker: EndpointMarker, world: Pos2) -> Vec<Outcome> {
        let fixed = graph
            .connection(marker.connection)
            .and_then(|c| c.endpoint(marker.endpoint.other()).cloned());
        let Some(fixed) = fixed else {
            return Vec::new();
        };
        match graph.detach_endpoint(marker.connection, marker.endpoint) {
            Ok(_) => {
                self.transition(InteractionState::Reconnecting {
                    connection: marker.connection,
                    fixed,
                    moving: marker.endpoint,
                    pointer: world,
                });
            }
            Err(e) => tracing::warn!("Cannot grab connection endpoint: {}", e),
        }
        Vec::new()
    }

    // ==================== Move ====================

    fn on_move(&mut self, graph: &mut Graph, settings: &CanvasSettings, screen: Pos2) -> Vec<Outcome> {
        let world = self.viewport.screen_to_world(screen);
        if self.state.is_idle() {
            let hovered = self.connection_at(graph, settings, world);
            if hovered != self.hovered_connection {
                tracing::trace!("Hovered connection: {:?}", hovered);
                self.hovered_connection = hovered;
            }
            return Vec::new();
        }
        match &mut self.state {
            InteractionState::Idle => Vec::new(),
            InteractionState::DraggingConnection { pointer, .. }
            | InteractionState::Reconnecting { pointer, .. } => {
                *pointer = world;
                Vec::new()
            }
            InteractionState::PanningView { last, .. } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan_by(delta);
                vec![Outcome::ViewChanged]
            }
            InteractionState::BoxSelecting { current, .. } => {
                *current = world;
                Vec::new()
            }
            InteractionState::DraggingNodes { last, moved } => {
                let delta = world - *last;
                *last = world;
                if delta == egui::Vec2::ZERO {
                    return Vec::new();
                }
                *moved = true;
                for id in &self.selection.nodes {
                    if let Err(e) = graph.move_node(*id, delta) {
                        tracing::debug!("Skipping move: {}", e);
                    }
                }
                Vec::new()
            }
        }
    }

    // ==================== Release ====================

    fn on_release(
        &mut self,
        graph: &mut Graph,
        settings: &CanvasSettings,
        screen: Pos2,
        button: PointerButton,
    ) -> Vec<Outcome> {
        let world = self.viewport.screen_to_world(screen);
        let snap_radius = self.viewport.screen_len_to_world(settings.snap_radius);
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let released = state.name();

        let outcomes = match state {
            InteractionState::Idle => Vec::new(),
            InteractionState::DraggingConnection { from, direction, .. } => {
                finish_connection(graph, &from, direction, world, snap_radius)
            }
            InteractionState::Reconnecting {
                connection,
                fixed,
                moving,
                ..
            } => finish_reconnect(graph, connection, &fixed, moving, world, snap_radius),
            InteractionState::PanningView { button: held, last } => {
                if held != button {
                    // Another button let go mid-pan; keep panning.
                    self.state = InteractionState::PanningView { button: held, last };
                    return Vec::new();
                }
                Vec::new()
            }
            InteractionState::BoxSelecting { origin, .. } => {
                let rect = Rect::from_two_pos(origin, world);
                let before = self.selection.nodes.len();
                self.selection.nodes.extend(
                    graph
                        .nodes()
                        .filter(|n| rect.intersects(n.bounds()))
                        .map(|n| n.id),
                );
                if self.selection.nodes.len() != before {
                    vec![Outcome::SelectionChanged]
                } else {
                    Vec::new()
                }
            }
            InteractionState::DraggingNodes { moved, .. } => {
                if moved {
                    vec![Outcome::NodesMoved(self.selection.nodes.len())]
                } else {
                    Vec::new()
                }
            }
        };
        if released != "Idle" {
            tracing::debug!("Interaction: {} -> Idle", released);
        }
        outcomes
    }

    // ==================== Scroll / keys ====================

    fn on_scroll(&mut self, settings: &CanvasSettings, screen: Pos2, delta: f32) -> Vec<Outcome> {
        if matches!(self.state, InteractionState::PanningView { .. }) || delta == 0.0 {
            return Vec::new();
        }
        let factor = if delta > 0.0 {
            settings.zoom_in_step
        } else {
            settings.zoom_out_step
        };
        if self.viewport.zoom_about(screen, factor, settings) {
            vec![Outcome::ViewChanged]
        } else {
            Vec::new()
        }
    }

    fn on_key(&mut self, graph: &mut Graph, key: Key) -> Vec<Outcome> {
        match key {
            Key::Delete | Key::Backspace => {
                if !self.state.is_idle() || self.selection.is_empty() {
                    return Vec::new();
                }
                self.delete_selection(graph)
            }
            Key::Escape => self.cancel(graph),
        }
    }

    /// Delete every selected node (with its connections) and every selected
    /// connection that survived the node deletion.
    pub fn delete_selection(&mut self, graph: &mut Graph) -> Vec<Outcome> {
        let nodes: Vec<NodeId> = self.selection.nodes.iter().copied().collect();
        let before = graph.connection_count();
        let deleted_nodes = graph.delete_nodes(&nodes);
        let mut deleted_connections = before - graph.connection_count();
        for id in std::mem::take(&mut self.selection.connections) {
            if graph.connection(id).is_some() && graph.disconnect(id).is_ok() {
                deleted_connections += 1;
            }
        }
        self.selection.clear();
        if deleted_nodes == 0 && deleted_connections == 0 {
            return Vec::new();
        }
        vec![Outcome::Deleted {
            nodes: deleted_nodes,
            connections: deleted_connections,
        }]
    }

    /// Abort the current gesture. A half-detached connection is discarded.
    pub fn cancel(&mut self, graph: &mut Graph) -> Vec<Outcome> {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        match state {
            InteractionState::DraggingConnection { .. } => vec![Outcome::Discarded],
            InteractionState::Reconnecting { connection, .. } => discard_connection(graph, connection),
            _ => Vec::new(),
        }
    }

    // ==================== Hit testing ====================

    fn marker_at(&self, graph: &Graph, settings: &CanvasSettings, world: Pos2) -> Option<EndpointMarker> {
        let radius = self.viewport.screen_len_to_world(settings.endpoint_marker_radius + 2.0);
        self.endpoint_markers(graph)
            .into_iter()
            .filter(|m| (m.position - world).length() <= radius)
            .min_by(|a, b| {
                let da = (a.position - world).length_sq();
                let db = (b.position - world).length_sq();
                da.total_cmp(&db)
            })
    }

    fn connection_at(&self, graph: &Graph, settings: &CanvasSettings, world: Pos2) -> Option<ConnectionId> {
        let tolerance = self.viewport.screen_len_to_world(settings.connection_hit_tolerance);
        let mut best: Option<(ConnectionId, f32)> = None;
        for conn in graph.connections() {
            let Some(curve) = Self::connection_curve(graph, conn.id) else {
                continue;
            };
            let d = curve.distance_to(world, settings.curve_segments);
            if d <= tolerance && best.map_or(true, |(_, bd)| d < bd) {
                best = Some((conn.id, d));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Topmost node under `world`: the newest one, since newer nodes paint last.
fn node_at(graph: &Graph, world: Pos2) -> Option<NodeId> {
    graph
        .nodes()
        .filter(|n| n.bounds().contains(world))
        .last()
        .map(|n| n.id)
}

fn mismatch_warning(a: &PortRef, b: &PortRef) -> Outcome {
    let msg = EditorError::DirectionMismatch {
        from: a.clone(),
        to: b.clone(),
    }
    .to_string();
    tracing::warn!("{}", msg);
    Outcome::Warning(msg)
}

fn finish_connection(
    graph: &mut Graph,
    from: &PortRef,
    direction: PortDirection,
    world: Pos2,
    snap_radius: f32,
) -> Vec<Outcome> {
    let Some(hit) = snap::drop_target(graph, world, snap_radius, from) else {
        tracing::debug!("Connection from {} dropped on empty canvas", from);
        return vec![Outcome::Discarded];
    };
    if hit.direction == direction {
        return vec![mismatch_warning(from, &hit.port), Outcome::Discarded];
    }
    match graph.connect(from, &hit.port) {
        Ok(id) => vec![Outcome::Connected(id)],
        Err(e @ EditorError::DirectionMismatch { .. }) => {
            tracing::warn!("{}", e);
            vec![Outcome::Warning(e.to_string()), Outcome::Discarded]
        }
        Err(e) => {
            tracing::warn!("Connection gesture aborted: {}", e);
            vec![Outcome::Discarded]
        }
    }
}

fn finish_reconnect(
    graph: &mut Graph,
    connection: ConnectionId,
    fixed: &PortRef,
    moving: Endpoint,
    world: Pos2,
    snap_radius: f32,
) -> Vec<Outcome> {
    let Some(hit) = snap::drop_target(graph, world, snap_radius, fixed) else {
        tracing::debug!("Reconnect of {} dropped on empty canvas", connection);
        return discard_connection(graph, connection);
    };
    if hit.direction != moving.direction() {
        let mut outcomes = vec![mismatch_warning(fixed, &hit.port)];
        outcomes.extend(discard_connection(graph, connection));
        return outcomes;
    }
    match graph.reconnect(connection, &hit.port, moving) {
        Ok(()) => vec![Outcome::Reconnected(connection)],
        Err(e) => {
            tracing::warn!("Reconnect aborted: {}", e);
            discard_connection(graph, connection)
        }
    }
}

/// A half-detached connection that found no target is removed.
fn discard_connection(graph: &mut Graph, connection: ConnectionId) -> Vec<Outcome> {
    match graph.disconnect(connection) {
        Ok(()) => vec![Outcome::Disconnected(connection)],
        Err(e) => {
            tracing::debug!("Nothing to discard: {}", e);
            vec![Outcome::Discarded]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Parameters;
    use egui::vec2;

    struct Fixture {
        graph: Graph,
        settings: CanvasSettings,
        ix: Interaction,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                graph: Graph::default(),
                settings: CanvasSettings::default(),
                ix: Interaction::new(),
            }
        }

        fn node(&mut self, kind: &str, x: f32, y: f32) -> NodeId {
            self.graph
                .create_node(kind, Pos2::new(x, y), &Parameters::new())
                .unwrap()
        }

        fn port(&self, node: NodeId, slot: &str) -> Pos2 {
            let world = self.graph.port_position(&PortRef::new(node, slot)).unwrap();
            self.ix.viewport.world_to_screen(world)
        }

        fn send(&mut self, event: PointerEvent) -> Vec<Outcome> {
            self.ix.handle(&mut self.graph, &self.settings, event)
        }

        fn drag(&mut self, from: Pos2, to: Pos2) -> Vec<Outcome> {
            self.send(PointerEvent::Press {
                pos: from,
                button: PointerButton::Primary,
                additive: false,
            });
            self.send(PointerEvent::Move { pos: to });
            self.send(PointerEvent::Release {
                pos: to,
                button: PointerButton::Primary,
            })
        }
    }

    #[test]
    fn test_drag_port_to_port_connects() {
        let mut fx = Fixture::new();
        let a = fx.node("action_execution", 0.0, 0.0);
        let b = fx.node("if", 400.0, 0.0);
        let out = fx.port(a, "out");
        let cond = fx.port(b, "condition");

        let outcomes = fx.drag(out, cond + vec2(5.0, 5.0));
        assert!(matches!(outcomes.as_slice(), [Outcome::Connected(_)]));
        assert_eq!(fx.graph.connection_count(), 1);
        assert!(fx.ix.state().is_idle());
    }

    #[test]
    fn test_drag_to_empty_canvas_discards() {
        let mut fx = Fixture::new();
        let a = fx.node("action_execution", 0.0, 0.0);
        let out = fx.port(a, "out");
        let revision = fx.graph.revision();

        fx.send(PointerEvent::Press {
            pos: out,
            button: PointerButton::Primary,
            additive: false,
        });
        assert_eq!(fx.ix.state().name(), "DraggingConnection");
        fx.send(PointerEvent::Move {
            pos: Pos2::new(900.0, 900.0),
        });
        assert!(fx.ix.temp_link(&fx.graph).is_some());
        let outcomes = fx.send(PointerEvent::Release {
            pos: Pos2::new(900.0, 900.0),
            button: PointerButton::Primary,
        });
        assert_eq!(outcomes, vec![Outcome::Discarded]);
        assert_eq!(fx.graph.connection_count(), 0);
        assert_eq!(fx.graph.revision(), revision);
    }

    #[test]
    fn test_same_direction_drop_warns() {
        let mut fx = Fixture::new();
        let a = fx.node("action_execution", 0.0, 0.0);
        let b = fx.node("action_execution", 400.0, 0.0);
        let outcomes = fx.drag(fx.port(a, "out"), fx.port(b, "out"));
        assert!(matches!(outcomes.first(), Some(Outcome::Warning(_))));
        assert_eq!(fx.graph.connection_count(), 0);
    }

    #[test]
    fn test_reconnect_via_marker() {
        let mut fx = Fixture::new();
        let a = fx.node("action_execution", 0.0, 0.0);
        let b = fx.node("action_execution", 400.0, 0.0);
        let c = fx.node("action_execution", 400.0, 300.0);
        let id = fx
            .graph
            .connect(&PortRef::new(a, "out"), &PortRef::new(b, "in"))
            .unwrap();
        fx.ix.selection.select_only_connection(id);

        let outcomes = fx.drag(fx.port(b, "in"), fx.port(c, "in"));
        assert_eq!(outcomes, vec![Outcome::Reconnected(id)]);
        let conn = fx.graph.connection(id).unwrap();
        assert_eq!(conn.in_port, Some(PortRef::new(c, "in")));
        fx.graph.check_invariants().unwrap();
    }

    #[test]
    fn test_missed_reconnect_discards_connection() {
        let mut fx = Fixture::new();
        let a = fx.node("action_execution", 0.0, 0.0);
        let b = fx.node("action_execution", 400.0, 0.0);
        let id = fx
            .graph
            .connect(&PortRef::new(a, "out"), &PortRef::new(b, "in"))
            .unwrap();
        fx.ix.selection.select_only_connection(id);

        let outcomes = fx.drag(fx.port(b, "in"), Pos2::new(1000.0, 1000.0));
        assert_eq!(outcomes, vec![Outcome::Disconnected(id)]);
        assert_eq!(fx.graph.connection_count(), 0);
        assert!(fx.ix.selection.is_empty());
    }

    #[test]
    fn test_drag_nodes_moves_selection() {
        let mut fx = Fixture::new();
        let a = fx.node("stop", 0.0, 0.0);
        let centre = fx.graph.node(a).unwrap().bounds().center();
        let outcomes = fx.drag(centre, centre + vec2(50.0, 20.0));
        assert_eq!(outcomes, vec![Outcome::NodesMoved(1)]);
        assert_eq!(fx.graph.node(a).unwrap().position, Pos2::new(50.0, 20.0));
    }

    #[test]
    fn test_box_select_and_delete() {
        let mut fx = Fixture::new();
        let a = fx.node("action_execution", 0.0, 0.0);
        let b = fx.node("action_execution", 400.0, 0.0);
        fx.graph
            .connect(&PortRef::new(a, "out"), &PortRef::new(b, "in"))
            .unwrap();

        fx.drag(Pos2::new(-20.0, -20.0), Pos2::new(250.0, 200.0));
        assert_eq!(fx.ix.selection.nodes.len(), 1);

        let outcomes = fx.send(PointerEvent::Key(Key::Delete));
        assert_eq!(
            outcomes,
            vec![Outcome::Deleted {
                nodes: 1,
                connections: 1
            }]
        );
        assert_eq!(fx.graph.node_count(), 1);
        assert_eq!(fx.graph.connection_count(), 0);
    }

    #[test]
    fn test_delete_with_empty_selection_is_noop() {
        let mut fx = Fixture::new();
        fx.node("stop", 0.0, 0.0);
        assert!(fx.send(PointerEvent::Key(Key::Backspace)).is_empty());
        assert_eq!(fx.graph.node_count(), 1);
    }

    #[test]
    fn test_pan_with_middle_button() {
        let mut fx = Fixture::new();
        fx.send(PointerEvent::Press {
            pos: Pos2::new(10.0, 10.0),
            button: PointerButton::Middle,
            additive: false,
        });
        fx.send(PointerEvent::Move {
            pos: Pos2::new(40.0, 25.0),
        });
        // no zoom mid-pan
        assert!(fx
            .send(PointerEvent::Scroll {
                pos: Pos2::ZERO,
                delta: 1.0
            })
            .is_empty());
        fx.send(PointerEvent::Release {
            pos: Pos2::new(40.0, 25.0),
            button: PointerButton::Middle,
        });
        assert_eq!(fx.ix.viewport.pan, vec2(30.0, 15.0));
        assert!(fx.ix.state().is_idle());
    }

    #[test]
    fn test_scroll_zooms_about_pointer() {
        let mut fx = Fixture::new();
        let outcomes = fx.send(PointerEvent::Scroll {
            pos: Pos2::new(100.0, 100.0),
            delta: 1.0,
        });
        assert_eq!(outcomes, vec![Outcome::ViewChanged]);
        assert!((fx.ix.viewport.zoom - 1.15).abs() < 1e-6);
        let world = fx.ix.viewport.screen_to_world(Pos2::new(100.0, 100.0));
        assert!((world - Pos2::new(100.0, 100.0)).length() < 1e-3);
    }
}
