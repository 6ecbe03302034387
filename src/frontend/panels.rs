//! Side and bottom panels around the canvas
//!
//! # Panels
//!
//! - [`PalettePanel`] - Registered node kinds, grouped by category; drag onto
//!   the canvas or double-click to create
//! - [`InspectorPanel`] - Title, feature, loop mode, elif branches and
//!   parameters of the selected node
//! - [`CodePanel`] - Read-only view of the generated program

use crate::config::StyleResolver;
use crate::drop_payload::DropPayload;
use crate::editor::{editable_parameters, Editor};
use crate::graph::{KindRegistry, LoopType, NodeId, ParamValue};
use crate::robot::RobotModel;
use egui::{RichText, ScrollArea, Sense, Ui};
use std::collections::BTreeMap;

/// Renders the node palette
pub struct PalettePanel;

impl PalettePanel {
    /// Render the palette. Returns the drop payload of an entry that was
    /// double-clicked, for creation at the view centre.
    pub fn render(ui: &mut Ui, registry: &KindRegistry, style: &dyn StyleResolver) -> Option<DropPayload> {
        let mut create = None;
        let mut groups: BTreeMap<&str, Vec<_>> = BTreeMap::new();
        for kind in registry.iter() {
            groups.entry(kind.category()).or_default().push(kind);
        }

        ui.heading("Modules");
        ui.separator();
        ScrollArea::vertical().show(ui, |ui| {
            for (category, kinds) in groups {
                egui::CollapsingHeader::new(RichText::new(category).strong())
                    .default_open(true)
                    .show(ui, |ui| {
                        for kind in kinds {
                            let response = ui
                                .add(
                                    egui::Button::new(kind.display_name())
                                        .sense(Sense::click_and_drag())
                                        .min_size(egui::vec2(ui.available_width(), 0.0)),
                                )
                                .on_hover_text(kind.description());
                            if response.drag_started() {
                                let payload = DropPayload::for_kind(kind.as_ref(), style);
                                response.dnd_set_drag_payload(payload.to_bytes());
                            }
                            if response.double_clicked() {
                                create = Some(DropPayload::for_kind(kind.as_ref(), style));
                            }
                        }
                    });
            }
        });
        create
    }
}

/// Renders the selected node's properties
pub struct InspectorPanel;

impl InspectorPanel {
    pub fn render(ui: &mut Ui, editor: &mut Editor, robot: Option<&mut dyn RobotModel>) {
        ui.heading("Inspector");
        ui.separator();

        let Some(id) = editor.selection().single_node() else {
            let count = editor.selection().nodes.len();
            if count > 1 {
                ui.label(format!("{} nodes selected", count));
            } else {
                ui.label(RichText::new("Select a node to edit it").weak());
            }
            return;
        };
        let Some(node) = editor.graph().node(id) else {
            return;
        };

        let mut name = node.name.clone();
        let kind_name = node.kind_name().to_string();
        let description = node.kind().description().to_string();
        let features = node.features();
        let selection = node.selection().map(str::to_string);

        ui.label(RichText::new(format!("{} (ID: {})", kind_name, id)).small());
        ui.label(RichText::new(description).weak());
        ui.horizontal(|ui| {
            ui.label("Title:");
            if ui.text_edit_singleline(&mut name).changed() {
                editor.rename_node(id, &name);
            }
        });

        if !features.is_empty() {
            let mut chosen = selection.clone().unwrap_or_default();
            egui::ComboBox::from_label("Feature")
                .selected_text(chosen.clone())
                .show_ui(ui, |ui| {
                    for feature in &features {
                        ui.selectable_value(&mut chosen, feature.clone(), feature);
                    }
                });
            if Some(&chosen) != selection.as_ref() && !chosen.is_empty() {
                editor.select_feature(id, &chosen);
            }
        }

        match kind_name.as_str() {
            "while_loop" => Self::loop_controls(ui, editor, id),
            "if" => Self::elif_controls(ui, editor, id),
            _ => {}
        }

        ui.separator();
        Self::parameters(ui, editor, id);

        ui.separator();
        if ui.button("▶ Execute node").clicked() {
            editor.execute_node(id, robot);
        }
    }

    fn loop_controls(ui: &mut Ui, editor: &mut Editor, id: NodeId) {
        let Some(node) = editor.graph().node(id) else {
            return;
        };
        let current = LoopType::of(node.params());
        let mut mode = current;
        ui.horizontal(|ui| {
            ui.label("Loop:");
            ui.radio_value(&mut mode, LoopType::While, LoopType::While.label());
            ui.radio_value(&mut mode, LoopType::For, LoopType::For.label());
        });
        if mode != current {
            editor.set_loop_type(id, mode);
        }
    }

    fn elif_controls(ui: &mut Ui, editor: &mut Editor, id: NodeId) {
        ui.horizontal(|ui| {
            if ui.button("+ elif").clicked() {
                editor.add_elif(id);
            }
            if ui.button("- elif").clicked() {
                editor.remove_elif(id);
            }
        });
    }

    fn parameters(ui: &mut Ui, editor: &mut Editor, id: NodeId) {
        let hidden = hidden_parameters(editor, id);
        egui::Grid::new("inspector_params")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                for (key, value) in editable_parameters(editor.graph(), id) {
                    if hidden.contains(&key) {
                        continue;
                    }
                    ui.label(&key);
                    if let Some(edited) = value_editor(ui, &value) {
                        editor.set_parameter(id, &key, edited);
                    }
                    ui.end_row();
                }
            });
    }
}

/// Parameters whose port is hidden in the node's current mode.
fn hidden_parameters(editor: &Editor, id: NodeId) -> Vec<String> {
    editor
        .graph()
        .node(id)
        .map(|node| {
            node.ports()
                .iter()
                .filter(|p| !p.visible && node.params().contains(&p.slot))
                .map(|p| p.slot.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Edit widget for one value. Returns the new value when it changed.
fn value_editor(ui: &mut Ui, value: &ParamValue) -> Option<ParamValue> {
    match value {
        ParamValue::Bool(b) => {
            let mut b = *b;
            ui.checkbox(&mut b, "").changed().then_some(ParamValue::Bool(b))
        }
        ParamValue::Int(i) => {
            let mut i = *i;
            ui.add(egui::DragValue::new(&mut i))
                .changed()
                .then_some(ParamValue::Int(i))
        }
        ParamValue::Float(f) => {
            let mut f = *f;
            ui.add(egui::DragValue::new(&mut f).speed(0.1))
                .changed()
                .then_some(ParamValue::Float(f))
        }
        ParamValue::Text(s) => {
            let mut s = s.clone();
            ui.text_edit_singleline(&mut s)
                .changed()
                .then_some(ParamValue::Text(s))
        }
        ParamValue::List(items) => {
            let mut items = items.clone();
            let mut changed = false;
            ui.vertical(|ui| {
                for item in items.iter_mut() {
                    if let Some(edited) = value_editor(ui, item) {
                        *item = edited;
                        changed = true;
                    }
                }
                if items.is_empty() {
                    ui.label(RichText::new("(empty)").weak());
                }
            });
            changed.then_some(ParamValue::List(items))
        }
    }
}

/// Renders the generated program
pub struct CodePanel;

impl CodePanel {
    pub fn render(ui: &mut Ui, code: &str) {
        ui.horizontal(|ui| {
            ui.strong("Generated code");
            if ui.small_button("Copy").clicked() {
                ui.ctx().copy_text(code.to_string());
            }
        });
        ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            let mut text = code;
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .code_editor()
                    .desired_width(f32::INFINITY),
            );
        });
    }
}
