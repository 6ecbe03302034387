//! Frontend module for egui UI
//!
//! A thin host around [`Editor`]: it forwards canvas input, palette drops and
//! inspector edits to the editor and renders what the editor exposes. The
//! generated program and editor notifications arrive over crossbeam channels
//! and are drained once per frame.
//!
//! # Main Types
//!
//! - [`CelebrimborApp`] - Main application state implementing [`eframe::App`]
//!
//! # Submodules
//!
//! - `canvas` - Graph painting and input translation
//! - `panels` - Palette, inspector and code view
//! - `status_bar` - Bottom status line

pub mod canvas;
mod panels;
pub mod status_bar;

pub use panels::*;
pub use status_bar::StatusLine;

use crate::config::{EditorConfig, Theme};
use crate::editor::{ChannelSink, Editor, EditorEvent};
use crate::graph::Graph;
use crate::robot::{RecordingRobot, RobotModel};
use crossbeam_channel::{unbounded, Receiver};
use egui::{Pos2, Vec2};
use status_bar::{render_status_bar, StatusBarContext};

/// Pending code updates kept before the sink replaces stale ones.
const CODE_CHANNEL_CAPACITY: usize = 16;

/// Main application state
pub struct CelebrimborApp {
    editor: Editor,
    code_rx: Receiver<String>,
    events_rx: Receiver<EditorEvent>,
    /// Latest generated program shown in the code panel
    code: String,
    status: Option<StatusLine>,
    /// Blocking notice raised by a failed node execution
    alert: Option<String>,
    /// Robot used by "Execute node"; `None` until dry-run is enabled
    robot: Option<Box<dyn RobotModel>>,
    /// Canvas size in the last frame, for placing palette creations
    canvas_size: Vec2,
}

impl CelebrimborApp {
    pub fn new(cc: &eframe::CreationContext<'_>, graph: Graph, config: EditorConfig, theme: Theme) -> Self {
        let mut style = (*cc.egui_ctx.style()).clone();
        style.text_styles.iter_mut().for_each(|(_, font_id)| {
            font_id.size *= config.ui.font_scale;
        });
        cc.egui_ctx.set_style(style);

        let (code_sink, code_rx) = ChannelSink::bounded(CODE_CHANNEL_CAPACITY);
        let (events_tx, events_rx) = unbounded();
        let editor = Editor::new(graph, config, Box::new(theme))
            .with_events(events_tx)
            .with_sink(Box::new(code_sink));

        Self {
            code: editor.code().to_string(),
            editor,
            code_rx,
            events_rx,
            status: None,
            alert: None,
            robot: None,
            canvas_size: Vec2::new(800.0, 600.0),
        }
    }

    /// Drain code updates and editor events. Returns true if anything arrived.
    fn process_editor_messages(&mut self) -> bool {
        let mut had_messages = false;
        while let Ok(code) = self.code_rx.try_recv() {
            self.code = code;
            had_messages = true;
        }
        while let Ok(event) = self.events_rx.try_recv() {
            had_messages = true;
            match event {
                EditorEvent::Warning(msg) => self.status = Some(StatusLine::Warning(msg)),
                EditorEvent::Status(msg) => self.status = Some(StatusLine::Info(msg)),
                EditorEvent::Alert(msg) => self.alert = Some(msg),
                EditorEvent::NodesDeleted { nodes, connections } => {
                    self.status = Some(StatusLine::Info(format!(
                        "Deleted {} node(s), {} connection(s)",
                        nodes, connections
                    )));
                }
                EditorEvent::Connected(id) => {
                    self.status = Some(StatusLine::Info(format!("Connection {} created", id)));
                }
                EditorEvent::Reconnected(id) => {
                    self.status = Some(StatusLine::Info(format!("Connection {} moved", id)));
                }
                EditorEvent::Disconnected(id) => {
                    self.status = Some(StatusLine::Info(format!("Connection {} removed", id)));
                }
                EditorEvent::NodeCreated { .. } => {}
            }
        }
        had_messages
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::Key;

        if ctx.wants_keyboard_input() {
            return;
        }

        let mut select_all = false;
        let mut reset_view = false;
        ctx.input(|i| {
            if i.key_pressed(Key::A) && i.modifiers.command_only() {
                select_all = true;
            }
            if i.key_pressed(Key::Num0) && i.modifiers.command_only() {
                reset_view = true;
            }
        });

        if select_all {
            self.editor.select_all();
        }
        if reset_view {
            self.editor.reset_view();
        }
    }

    fn set_dry_run(&mut self, enabled: bool) {
        if enabled {
            self.robot = Some(Box::new(RecordingRobot::new()));
            tracing::info!("Dry-run robot enabled");
        } else {
            self.robot = None;
            tracing::info!("Dry-run robot disabled");
        }
    }

    fn render_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.alert.clone() else {
            return;
        };
        egui::Window::new("Execution failed")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(8.0);
                if ui.button("OK").clicked() {
                    self.alert = None;
                }
            });
    }
}

/// Reborrow the boxed robot for one frame.
fn robot_mut(robot: &mut Option<Box<dyn RobotModel>>) -> Option<&mut dyn RobotModel> {
    match robot.as_mut() {
        Some(robot) => Some(robot.as_mut()),
        None => None,
    }
}

impl eframe::App for CelebrimborApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.process_editor_messages() {
            ctx.request_repaint();
        }
        self.handle_keyboard_shortcuts(ctx);

        // Menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("Edit", |ui| {
                    if ui.button("Select All").clicked() {
                        self.editor.select_all();
                        ui.close();
                    }
                    if ui.button("Clear Selection").clicked() {
                        self.editor.clear_selection();
                        ui.close();
                    }
                    if ui.button("Delete Selected").clicked() {
                        self.editor.delete_selected();
                        ui.close();
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui.button("Reset View").clicked() {
                        self.editor.reset_view();
                        ui.close();
                    }
                    if ui.button("Fit to Contents").clicked() {
                        self.editor.fit_to_contents(self.canvas_size);
                        ui.close();
                    }
                });

                ui.menu_button("Robot", |ui| {
                    let mut dry_run = self.robot.is_some();
                    if ui.checkbox(&mut dry_run, "Dry-run robot").changed() {
                        self.set_dry_run(dry_run);
                    }
                });
            });
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            let status_ctx = StatusBarContext {
                status: self.status.as_ref(),
                nodes: self.editor.graph().node_count(),
                connections: self.editor.graph().connection_count(),
                zoom: self.editor.viewport().zoom,
                interaction: self.editor.interaction().state().name(),
            };
            render_status_bar(ui, &status_ctx);
        });

        egui::TopBottomPanel::bottom("code_panel")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| CodePanel::render(ui, &self.code));

        let mut create = None;
        egui::SidePanel::left("palette")
            .resizable(true)
            .default_width(180.0)
            .show(ctx, |ui| {
                create = PalettePanel::render(ui, self.editor.graph().registry(), self.editor.style());
            });
        if let Some(payload) = create {
            let centre = Pos2::new(self.canvas_size.x * 0.5, self.canvas_size.y * 0.5);
            self.editor.drop_payload(&payload, centre);
        }

        egui::SidePanel::right("inspector")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                InspectorPanel::render(ui, &mut self.editor, robot_mut(&mut self.robot));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                self.canvas_size = ui.available_size();
                canvas::render(&mut self.editor, ui);
            });

        self.render_alert(ctx);

        if !self.editor.interaction().state().is_idle() {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.editor.config().save() {
            tracing::warn!("Failed to save editor config: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::KindRegistry;

    #[test]
    fn test_inspector_renders_with_dry_run_robot() {
        let mut editor = Editor::new(
            Graph::new(KindRegistry::with_builtins()),
            EditorConfig::default(),
            Box::new(Theme::default()),
        );
        let id = editor.create_node_at("action_execution", Pos2::ZERO).unwrap();
        editor.select_node(id);
        let mut robot: Option<Box<dyn RobotModel>> = Some(Box::new(RecordingRobot::new()));

        let ctx = egui::Context::default();
        for _ in 0..2 {
            let _ = ctx.run(egui::RawInput::default(), |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    InspectorPanel::render(ui, &mut editor, robot_mut(&mut robot));
                });
            });
        }
        assert!(robot_mut(&mut robot).is_some());
        assert!(robot_mut(&mut None).is_none());
        assert_eq!(editor.selection().single_node(), Some(id));
    }
}
