//! Editor facade.
//!
//! Owns the graph, the interaction state machine and the style resolver, and
//! is the single entry point a host uses: pointer events, palette drops and
//! inspector edits all go through here. After every call that mutated the
//! graph the code is regenerated once and pushed to the [`CodeSink`];
//! recoverable failures become log lines and [`EditorEvent::Warning`]s.

use crate::codegen;
use crate::config::{EditorConfig, StyleResolver};
use crate::drop_payload::{DropPayload, DropPlan, DEFAULT_GRADIENT};
use crate::error::Result;
use crate::graph::{
    ConnectionId, Graph, LoopType, NodeId, ParamValue, Parameters, SlotValues, FEATURES_KEY,
    SELECTION_KEY,
};
use crate::interaction::{
    ConnectionCurve, EndpointMarker, Interaction, Outcome, PointerEvent, Selection, Viewport,
};
use crate::robot::RobotModel;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use egui::{Pos2, Rect, Vec2};

/// Receiver of regenerated program text. Gets the full text, never a diff.
pub trait CodeSink {
    fn set_text(&mut self, code: &str);
}

/// Code sink that forwards each regeneration over a bounded channel.
///
/// Every message is a full replacement, so when the channel is full the
/// pending texts are discarded in favour of the newest one.
pub struct ChannelSink {
    tx: Sender<String>,
    /// Clone of the host's receiver, used to evict superseded texts
    stale: Receiver<String>,
    dropped: u64,
}

impl ChannelSink {
    /// Create a sink and the receiver the host drains.
    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        let sink = Self {
            tx,
            stale: rx.clone(),
            dropped: 0,
        };
        (sink, rx)
    }

    /// Number of texts superseded before the host read them.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl CodeSink for ChannelSink {
    fn set_text(&mut self, code: &str) {
        match self.tx.try_send(code.to_string()) {
            Ok(()) => {}
            Err(TrySendError::Full(code)) => {
                while self.stale.try_recv().is_ok() {
                    self.dropped += 1;
                }
                if self.tx.try_send(code).is_err() {
                    self.dropped += 1;
                    tracing::warn!("Code sink dropped an update ({} total)", self.dropped);
                } else {
                    tracing::debug!("Code sink replaced stale updates ({} total)", self.dropped);
                }
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                tracing::warn!("Code sink receiver is gone ({} dropped)", self.dropped);
            }
        }
    }
}

/// Notifications for the host's status line and dialogs.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    NodeCreated { id: NodeId, kind: String },
    NodesDeleted { nodes: usize, connections: usize },
    Connected(ConnectionId),
    Disconnected(ConnectionId),
    Reconnected(ConnectionId),
    /// Recovered failure, shown as transient status text.
    Warning(String),
    Status(String),
    /// Failure from collaborator code that deserves a blocking notice.
    Alert(String),
}

pub struct Editor {
    graph: Graph,
    config: EditorConfig,
    style: Box<dyn StyleResolver>,
    interaction: Interaction,
    sink: Option<Box<dyn CodeSink>>,
    events: Option<Sender<EditorEvent>>,
    code: String,
    generated_revision: Option<u64>,
}

impl Editor {
    pub fn new(graph: Graph, config: EditorConfig, style: Box<dyn StyleResolver>) -> Self {
        let mut editor = Self {
            graph,
            config,
            style,
            interaction: Interaction::new(),
            sink: None,
            events: None,
            code: String::new(),
            generated_revision: None,
        };
        editor.sync_code();
        editor
    }

    /// Attach a code sink; it receives the current text immediately.
    pub fn with_sink(mut self, sink: Box<dyn CodeSink>) -> Self {
        self.sink = Some(sink);
        self.generated_revision = None;
        self.sync_code();
        self
    }

    pub fn with_events(mut self, tx: Sender<EditorEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    // ==================== Accessors ====================

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn style(&self) -> &dyn StyleResolver {
        self.style.as_ref()
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn selection(&self) -> &Selection {
        &self.interaction.selection
    }

    pub fn viewport(&self) -> &Viewport {
        &self.interaction.viewport
    }

    /// Most recently generated program text.
    pub fn code(&self) -> &str {
        &self.code
    }

    // ==================== Code ====================

    /// Regenerate and publish if the graph changed since the last run.
    fn sync_code(&mut self) {
        let revision = self.graph.revision();
        if self.generated_revision == Some(revision) {
            return;
        }
        self.code = codegen::generate(&self.graph);
        self.generated_revision = Some(revision);
        tracing::trace!("Regenerated code at revision {}", revision);
        if let Some(sink) = self.sink.as_mut() {
            sink.set_text(&self.code);
        }
    }

    fn publish(&self, event: EditorEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.try_send(event);
        }
    }

    fn warn(&self, message: String) {
        tracing::warn!("{}", message);
        self.publish(EditorEvent::Warning(message));
    }

    /// Finish a mutating call: regenerate on success, report on failure.
    fn settle<T>(&mut self, action: &str, result: Result<T>) -> Option<T> {
        self.sync_code();
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.warn(format!("{action}: {e}"));
                None
            }
        }
    }

    // ==================== Pointer input ====================

    /// Feed one pointer or key event through the state machine.
    pub fn handle_event(&mut self, event: PointerEvent) -> Vec<Outcome> {
        let outcomes = self
            .interaction
            .handle(&mut self.graph, &self.config.canvas, event);
        for outcome in &outcomes {
            match outcome {
                Outcome::Connected(id) => self.publish(EditorEvent::Connected(*id)),
                Outcome::Reconnected(id) => self.publish(EditorEvent::Reconnected(*id)),
                Outcome::Disconnected(id) => self.publish(EditorEvent::Disconnected(*id)),
                Outcome::Deleted { nodes, connections } => {
                    self.publish(EditorEvent::NodesDeleted {
                        nodes: *nodes,
                        connections: *connections,
                    })
                }
                Outcome::Warning(msg) => self.publish(EditorEvent::Warning(msg.clone())),
                Outcome::NodesMoved(_)
                | Outcome::SelectionChanged
                | Outcome::ViewChanged
                | Outcome::Discarded => {}
            }
        }
        self.sync_code();
        outcomes
    }

    // ==================== Node creation ====================

    /// Create a node of `kind` centred on `screen` (canvas coordinates),
    /// coloured from the theme.
    pub fn create_node_at(&mut self, kind: &str, screen: Pos2) -> Option<NodeId> {
        let kind = match self.graph.registry().get(kind) {
            Ok(kind) => kind,
            Err(e) => {
                self.warn(format!("Cannot create node: {e}"));
                return None;
            }
        };
        let gradient = self.style.gradient_pair(kind.category(), DEFAULT_GRADIENT);
        let plan = DropPlan {
            kind,
            overrides: Parameters::new(),
            gradient,
        };
        self.create_from_plan(plan, screen)
    }

    /// Handle raw drop bytes from the palette. Malformed payloads are logged
    /// and ignored.
    pub fn handle_drop(&mut self, bytes: &[u8], screen: Pos2) -> Option<NodeId> {
        match DropPayload::parse_lenient(bytes) {
            Ok(payload) => self.drop_payload(&payload, screen),
            Err(e) => {
                self.warn(format!("Drop ignored: {e}"));
                None
            }
        }
    }

    pub fn drop_payload(&mut self, payload: &DropPayload, screen: Pos2) -> Option<NodeId> {
        match payload.plan(self.graph.registry(), self.style.as_ref()) {
            Ok(plan) => self.create_from_plan(plan, screen),
            Err(e) => {
                self.warn(format!("Drop ignored: {e}"));
                None
            }
        }
    }

    fn create_from_plan(&mut self, plan: DropPlan, screen: Pos2) -> Option<NodeId> {
        let world = self.interaction.viewport.screen_to_world(screen);
        let result = self
            .graph
            .create_node(plan.kind.name(), world, &plan.overrides)
            .and_then(|id| {
                let size = self.graph.node(id).map(|n| n.size()).unwrap_or(Vec2::ZERO);
                self.graph.set_node_position(id, world - size * 0.5)?;
                self.graph.set_node_gradient(id, plan.gradient.clone())?;
                Ok(id)
            });
        let id = self.settle("Cannot create node", result)?;
        let name = self
            .graph
            .node(id)
            .map(|n| n.name.clone())
            .unwrap_or_default();
        self.interaction.selection.select_only_node(id);
        self.publish(EditorEvent::NodeCreated {
            id,
            kind: plan.kind.name().to_string(),
        });
        self.publish(EditorEvent::Status(format!(
            "Created {} at ({:.0}, {:.0})",
            name, world.x, world.y
        )));
        Some(id)
    }

    // ==================== Selection ====================

    pub fn select_all(&mut self) {
        self.interaction.selection.select_all(&self.graph);
    }

    pub fn clear_selection(&mut self) {
        self.interaction.selection.clear();
    }

    pub fn select_node(&mut self, id: NodeId) {
        if self.graph.contains_node(id) {
            self.interaction.selection.select_only_node(id);
        }
    }

    /// Delete the current selection, as the Delete key does.
    pub fn delete_selected(&mut self) -> bool {
        let outcomes = self.interaction.delete_selection(&mut self.graph);
        let mut deleted = false;
        for outcome in outcomes {
            if let Outcome::Deleted { nodes, connections } = outcome {
                self.publish(EditorEvent::NodesDeleted { nodes, connections });
                deleted = true;
            }
        }
        self.sync_code();
        deleted
    }

    // ==================== Node edits ====================

    pub fn rename_node(&mut self, id: NodeId, name: &str) -> bool {
        let result = self.graph.rename_node(id, name);
        self.settle("Rename failed", result).is_some()
    }

    pub fn set_parameter(&mut self, id: NodeId, key: &str, value: ParamValue) -> bool {
        let result = self.graph.set_parameter(id, key, value);
        self.settle("Parameter rejected", result).is_some()
    }

    pub fn select_feature(&mut self, id: NodeId, feature: &str) -> bool {
        let result = self.graph.select_feature(id, feature);
        self.settle("Feature rejected", result).is_some()
    }

    pub fn set_loop_type(&mut self, id: NodeId, mode: LoopType) -> bool {
        let result = self.graph.set_loop_type(id, mode);
        self.settle("Loop mode rejected", result).is_some()
    }

    pub fn add_elif(&mut self, id: NodeId) -> Option<usize> {
        let result = self.graph.add_elif(id);
        self.settle("Cannot add elif", result)
    }

    pub fn remove_elif(&mut self, id: NodeId) -> bool {
        let result = self.graph.remove_elif(id);
        self.settle("Cannot remove elif", result).unwrap_or(false)
    }

    /// Disconnect a connection directly (inspector or context action).
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let result = self.graph.disconnect(id);
        let ok = self.settle("Disconnect failed", result).is_some();
        if ok {
            self.publish(EditorEvent::Disconnected(id));
        }
        ok
    }

    /// Run one node's `execute` once. A missing robot or a robot failure is
    /// raised as an [`EditorEvent::Alert`].
    pub fn execute_node(
        &mut self,
        id: NodeId,
        robot: Option<&mut dyn RobotModel>,
    ) -> Option<SlotValues> {
        let inputs = SlotValues::new();
        match self.graph.execute_node(id, &inputs, robot) {
            Ok(outputs) => {
                let failed = outputs.values().find_map(|v| {
                    (v.get("status").and_then(|s| s.as_str()) == Some("error"))
                        .then(|| v.get("message").and_then(|m| m.as_str()).unwrap_or("error"))
                });
                if let Some(message) = failed {
                    tracing::error!("Node {} execution failed: {}", id, message);
                    self.publish(EditorEvent::Alert(message.to_string()));
                } else {
                    self.publish(EditorEvent::Status(format!("Node {id} executed")));
                }
                Some(outputs)
            }
            Err(e) => {
                tracing::error!("Node {} execution failed: {}", id, e);
                self.publish(EditorEvent::Alert(e.to_string()));
                None
            }
        }
    }

    // ==================== View ====================

    pub fn reset_view(&mut self) {
        self.interaction.viewport.reset();
        tracing::info!("View reset");
    }

    /// Zoom and pan so every node fits in a view of `view_size` pixels.
    pub fn fit_to_contents(&mut self, view_size: Vec2) {
        let bounds = self
            .graph
            .nodes()
            .map(|n| n.bounds())
            .reduce(|a, b| a.union(b));
        self.interaction
            .viewport
            .fit_to(bounds, view_size, &self.config.canvas);
        tracing::info!("View fitted to contents");
    }

    // ==================== Per-frame visuals ====================

    /// Recompute visuals for one frame: flush pending layout, then derive
    /// every connection curve in screen space from current port positions.
    pub fn frame(&mut self) -> FrameVisuals {
        self.graph.flush_layout();
        let viewport = self.interaction.viewport;
        let to_screen = |p: Pos2| viewport.world_to_screen(p);

        let curves = self
            .graph
            .connections()
            .filter_map(|c| {
                Interaction::connection_curve(&self.graph, c.id).map(|curve| (c.id, curve.map(to_screen)))
            })
            .collect::<Vec<_>>();
        let markers = self
            .interaction
            .endpoint_markers(&self.graph)
            .into_iter()
            .map(|m| EndpointMarker {
                position: to_screen(m.position),
                ..m
            })
            .collect();
        let temp_link = self
            .interaction
            .temp_link(&self.graph)
            .map(|c| c.map(to_screen));
        let selection_rect = self
            .interaction
            .selection_rect()
            .map(|r| viewport.world_rect_to_screen(r));

        tracing::trace!("Frame: {} curve(s)", curves.len());
        FrameVisuals {
            curves,
            markers,
            temp_link,
            selection_rect,
        }
    }
}

/// Screen-space geometry derived for one frame. Read-only view of the model.
#[derive(Debug, Clone, Default)]
pub struct FrameVisuals {
    pub curves: Vec<(ConnectionId, ConnectionCurve)>,
    pub markers: Vec<EndpointMarker>,
    pub temp_link: Option<ConnectionCurve>,
    pub selection_rect: Option<Rect>,
}

/// Parameters shown in the inspector: everything except bookkeeping keys.
pub fn editable_parameters(graph: &Graph, id: NodeId) -> Vec<(String, ParamValue)> {
    graph
        .node(id)
        .map(|node| {
            node.params()
                .iter()
                .filter(|(k, _)| k.as_str() != SELECTION_KEY && k.as_str() != FEATURES_KEY)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::graph::PortRef;
    use crate::interaction::{Key, PointerButton};
    use crate::robot::RecordingRobot;
    use crossbeam_channel::unbounded;

    fn editor() -> (Editor, crossbeam_channel::Receiver<EditorEvent>) {
        let (tx, rx) = unbounded();
        let editor = Editor::new(
            Graph::default(),
            EditorConfig::default(),
            Box::new(Theme::default()),
        )
        .with_events(tx);
        (editor, rx)
    }

    #[test]
    fn test_initial_code_is_skeleton() {
        let (editor, _) = editor();
        assert!(editor.code().contains("    pass"));
    }

    #[test]
    fn test_drop_creates_centred_node() {
        let (mut editor, rx) = editor();
        let payload = br##"{"title":"Action Execution","features":["Stand","Walk"],"grad":["#010101","#020202"],"preset":"Walk"}"##;
        let id = editor.handle_drop(payload, Pos2::new(300.0, 200.0)).unwrap();
        let node = editor.graph().node(id).unwrap();
        assert_eq!(node.bounds().center(), Pos2::new(300.0, 200.0));
        assert_eq!(node.selection(), Some("Walk"));
        assert_eq!(node.params().text("action"), "walk");
        assert_eq!(
            node.gradient,
            Some(("#010101".to_string(), "#020202".to_string()))
        );
        assert!(editor.code().contains("robot.run_action('walk')"));
        assert!(rx
            .try_iter()
            .any(|e| matches!(e, EditorEvent::NodeCreated { kind, .. } if kind == "action_execution")));
    }

    #[test]
    fn test_malformed_drop_warns() {
        let (mut editor, rx) = editor();
        assert!(editor.handle_drop(b"{", Pos2::ZERO).is_none());
        assert_eq!(editor.graph().node_count(), 0);
        assert!(rx.try_iter().any(|e| matches!(e, EditorEvent::Warning(_))));
    }

    #[test]
    fn test_invalid_edit_reports_warning() {
        let (mut editor, rx) = editor();
        let id = editor.create_node_at("stop", Pos2::ZERO).unwrap();
        assert!(!editor.set_parameter(id, "missing", ParamValue::Int(1)));
        assert!(!editor.set_loop_type(id, LoopType::For));
        let warnings = rx
            .try_iter()
            .filter(|e| matches!(e, EditorEvent::Warning(_)))
            .count();
        assert_eq!(warnings, 2);
    }

    #[test]
    fn test_delete_key_regenerates() {
        let (mut editor, _) = editor();
        let id = editor.create_node_at("if", Pos2::new(100.0, 100.0)).unwrap();
        assert!(editor.code().contains("# If (ID: 0)"));
        editor.select_node(id);
        editor.handle_event(PointerEvent::Key(Key::Delete));
        assert_eq!(editor.graph().node_count(), 0);
        assert!(!editor.code().contains("# If (ID: 0)"));
    }

    #[test]
    fn test_execute_without_robot_alerts() {
        let (mut editor, rx) = editor();
        let id = editor.create_node_at("action_execution", Pos2::ZERO).unwrap();
        editor.execute_node(id, None);
        assert!(rx.try_iter().any(|e| matches!(e, EditorEvent::Alert(msg) if msg == "Robot model not set")));

        let mut robot = RecordingRobot::new();
        editor.execute_node(id, Some(&mut robot));
        assert_eq!(robot.actions, vec!["stand".to_string()]);
    }

    #[test]
    fn test_frame_curves_follow_ports() {
        let (mut editor, _) = editor();
        let a = editor.create_node_at("action_execution", Pos2::new(100.0, 100.0)).unwrap();
        let b = editor.create_node_at("action_execution", Pos2::new(500.0, 100.0)).unwrap();
        let out = PortRef::new(a, "out");
        let input = PortRef::new(b, "in");
        let from = editor.graph().port_position(&out).unwrap();
        let to = editor.graph().port_position(&input).unwrap();

        editor.handle_event(PointerEvent::Press {
            pos: from,
            button: PointerButton::Primary,
            additive: false,
        });
        editor.handle_event(PointerEvent::Move { pos: to });
        assert!(editor.frame().temp_link.is_some());
        editor.handle_event(PointerEvent::Release {
            pos: to,
            button: PointerButton::Primary,
        });

        let visuals = editor.frame();
        assert_eq!(visuals.curves.len(), 1);
        assert_eq!(visuals.curves[0].1.from, from);
        assert_eq!(visuals.curves[0].1.to, to);
    }

    #[test]
    fn test_fit_and_reset_view() {
        let (mut editor, _) = editor();
        editor.create_node_at("stop", Pos2::new(2000.0, 2000.0));
        editor.fit_to_contents(Vec2::new(800.0, 600.0));
        assert!(editor.viewport().zoom <= editor.config().canvas.zoom_max);
        editor.reset_view();
        assert_eq!(*editor.viewport(), Viewport::default());
    }

    #[test]
    fn test_channel_sink_keeps_latest_text_when_full() {
        let (mut sink, rx) = ChannelSink::bounded(1);
        sink.set_text("old");
        sink.set_text("new");

        let received: Vec<String> = rx.try_iter().collect();
        assert_eq!(received, vec!["new".to_string()]);
        assert_eq!(sink.dropped(), 1);

        sink.set_text("newer");
        assert_eq!(rx.try_recv().unwrap(), "newer");
        assert_eq!(sink.dropped(), 1);
    }
}
