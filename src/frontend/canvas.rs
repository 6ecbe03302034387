//! Canvas pane: paints the graph and turns egui input into editor events.
//!
//! Painting reads only model state plus the per-frame visuals the editor
//! derives; every mutation goes through [`Editor::handle_event`] or
//! [`Editor::handle_drop`].

use crate::config::theme::{parse_hex_color, resolve_color, StyleResolver};
use crate::editor::{Editor, FrameVisuals};
use crate::graph::layout::{HEADER_HEIGHT, PORT_RADIUS};
use crate::graph::{Node, PortDirection};
use crate::interaction::{ConnectionCurve, Key, PointerButton, PointerEvent, Viewport};
use egui::{Color32, Mesh, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};
use std::sync::Arc;

/// Render the canvas into the remaining space of `ui`.
pub fn render(editor: &mut Editor, ui: &mut Ui) {
    let size = ui.available_size();
    let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
    let canvas = response.rect;
    let origin = canvas.min.to_vec2();

    translate_input(editor, ui, &response, canvas);

    if let Some(bytes) = response.dnd_release_payload::<Vec<u8>>() {
        if let Some(pos) = response.hover_pos() {
            editor.handle_drop(&bytes, pos - origin);
        }
    }

    let visuals = editor.frame();
    let style = editor.style();
    let viewport = *editor.viewport();
    let settings = &editor.config().canvas;

    painter.rect_filled(canvas, 0.0, resolve_color(style, "canvas_background", "#1e1e1e"));
    if settings.grid_spacing > 0.0 {
        paint_grid(&painter, canvas, &viewport, settings.grid_spacing, style);
    }

    paint_connections(editor, &painter, origin, &visuals);

    let selected = &editor.selection().nodes;
    for node in editor.graph().nodes() {
        paint_node(&painter, origin, &viewport, node, selected.contains(&node.id), style);
    }

    let marker_color = resolve_color(style, "endpoint_marker", "#60a5fa");
    for marker in &visuals.markers {
        painter.circle_filled(
            marker.position + origin,
            settings.endpoint_marker_radius,
            marker_color,
        );
    }

    if let Some(link) = visuals.temp_link {
        let points = shift(link, origin).points(settings.curve_segments);
        painter.add(Shape::line(
            points,
            Stroke::new(2.0, resolve_color(style, "temp_link", "#facc15")),
        ));
    }

    if let Some(rect) = visuals.selection_rect {
        let rect = rect.translate(origin);
        painter.rect_filled(rect, 0.0, Color32::from_rgba_unmultiplied(96, 165, 250, 30));
        painter.rect_stroke(
            rect,
            0.0,
            Stroke::new(1.0, marker_color),
            egui::StrokeKind::Inside,
        );
    }
}

/// Forward raw pointer, wheel and key input as canvas-relative events.
fn translate_input(editor: &mut Editor, ui: &Ui, response: &egui::Response, canvas: Rect) {
    let origin = canvas.min.to_vec2();
    let dragging_payload = egui::DragAndDrop::has_any_payload(ui.ctx());
    let events = ui.input(|i| i.events.clone());
    let wants_keyboard = ui.ctx().wants_keyboard_input();

    for event in events {
        match event {
            egui::Event::PointerButton {
                pos,
                button,
                pressed,
                modifiers,
            } => {
                if dragging_payload {
                    continue;
                }
                let Some(button) = map_button(button) else {
                    continue;
                };
                if pressed {
                    if !canvas.contains(pos) {
                        continue;
                    }
                    editor.handle_event(PointerEvent::Press {
                        pos: pos - origin,
                        button,
                        additive: modifiers.shift,
                    });
                } else {
                    editor.handle_event(PointerEvent::Release {
                        pos: pos - origin,
                        button,
                    });
                }
            }
            egui::Event::PointerMoved(pos) => {
                editor.handle_event(PointerEvent::Move { pos: pos - origin });
            }
            egui::Event::Key {
                key, pressed: true, ..
            } if !wants_keyboard => {
                let key = match key {
                    egui::Key::Delete => Key::Delete,
                    egui::Key::Backspace => Key::Backspace,
                    egui::Key::Escape => Key::Escape,
                    _ => continue,
                };
                editor.handle_event(PointerEvent::Key(key));
            }
            _ => {}
        }
    }

    if response.hovered() {
        let delta = ui.input(|i| i.raw_scroll_delta.y);
        if delta != 0.0 {
            if let Some(pos) = response.hover_pos() {
                editor.handle_event(PointerEvent::Scroll {
                    pos: pos - origin,
                    delta,
                });
            }
        }
    }
}

fn map_button(button: egui::PointerButton) -> Option<PointerButton> {
    match button {
        egui::PointerButton::Primary => Some(PointerButton::Primary),
        egui::PointerButton::Secondary => Some(PointerButton::Secondary),
        egui::PointerButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn shift(curve: ConnectionCurve, origin: Vec2) -> ConnectionCurve {
    curve.map(|p| p + origin)
}

fn paint_grid(painter: &egui::Painter, canvas: Rect, viewport: &Viewport, spacing: f32, style: &dyn StyleResolver) {
    let step = spacing * viewport.zoom;
    if step < 6.0 {
        return;
    }
    let stroke = Stroke::new(1.0, resolve_color(style, "grid", "#2a2a2a"));
    let start_x = canvas.min.x + viewport.pan.x.rem_euclid(step);
    let start_y = canvas.min.y + viewport.pan.y.rem_euclid(step);

    let mut x = start_x;
    while x < canvas.max.x {
        painter.line_segment([Pos2::new(x, canvas.min.y), Pos2::new(x, canvas.max.y)], stroke);
        x += step;
    }
    let mut y = start_y;
    while y < canvas.max.y {
        painter.line_segment([Pos2::new(canvas.min.x, y), Pos2::new(canvas.max.x, y)], stroke);
        y += step;
    }
}

fn paint_connections(editor: &Editor, painter: &egui::Painter, origin: Vec2, visuals: &FrameVisuals) {
    let style = editor.style();
    let segments = editor.config().canvas.curve_segments;
    let zoom = editor.viewport().zoom;
    let normal = resolve_color(style, "connection", "#9ca3af");
    let highlight = resolve_color(style, "connection_selected", "#60a5fa");
    let hovered = editor.interaction().hovered_connection();

    for (id, curve) in &visuals.curves {
        let active = editor.selection().connections.contains(id) || hovered == Some(*id);
        let (color, width) = if active { (highlight, 3.0) } else { (normal, 2.0) };
        painter.add(Shape::line(
            shift(*curve, origin).points(segments),
            Stroke::new(width * zoom.max(0.5), color),
        ));
    }
}

fn paint_node(
    painter: &egui::Painter,
    origin: Vec2,
    viewport: &Viewport,
    node: &Node,
    selected: bool,
    style: &dyn StyleResolver,
) {
    let rect = viewport.world_rect_to_screen(node.bounds()).translate(origin);
    let (start, end) = match &node.gradient {
        Some((s, e)) => (s.clone(), e.clone()),
        None => style.gradient_pair(node.kind().category(), ("#2d2d2d", "#2d2d2d")),
    };
    let top = parse_hex_color(&start).unwrap_or(Color32::from_gray(45));
    let bottom = parse_hex_color(&end).unwrap_or(top);
    painter.add(Shape::mesh(Arc::new(gradient_mesh(rect, top, bottom))));

    let (stroke_color, stroke_width) = if selected {
        (Color32::WHITE, 2.5)
    } else {
        (Color32::from_gray(80), 1.0)
    };
    painter.rect_stroke(
        rect,
        0.0,
        Stroke::new(stroke_width, stroke_color),
        egui::StrokeKind::Outside,
    );

    let zoom = viewport.zoom;
    painter.text(
        Pos2::new(rect.center().x, rect.min.y + HEADER_HEIGHT * 0.5 * zoom),
        egui::Align2::CENTER_CENTER,
        &node.name,
        egui::FontId::proportional(13.0 * zoom),
        Color32::WHITE,
    );
    if let Some(selection) = node.selection() {
        painter.text(
            Pos2::new(rect.center().x, rect.min.y + HEADER_HEIGHT * 1.4 * zoom),
            egui::Align2::CENTER_CENTER,
            selection,
            egui::FontId::proportional(11.0 * zoom),
            Color32::from_gray(220),
        );
    }

    let input_color = resolve_color(style, "port_in", "#e5e7eb");
    let output_color = resolve_color(style, "port_out", "#fbbf24");
    for port in node.ports().iter().filter(|p| p.visible) {
        let pos = viewport.world_to_screen(node.position + port.offset) + origin;
        let color = match port.direction {
            PortDirection::Input => input_color,
            PortDirection::Output => output_color,
        };
        painter.circle_filled(pos, PORT_RADIUS * zoom, color);
        let (align, dx) = match port.direction {
            PortDirection::Input => (egui::Align2::LEFT_CENTER, 10.0),
            PortDirection::Output => (egui::Align2::RIGHT_CENTER, -10.0),
        };
        painter.text(
            pos + Vec2::new(dx * zoom, 0.0),
            align,
            &port.slot,
            egui::FontId::proportional(10.0 * zoom),
            Color32::from_gray(230),
        );
    }
}

/// Vertical two-colour gradient filling `rect`.
fn gradient_mesh(rect: Rect, top: Color32, bottom: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(rect.left_bottom(), bottom);
    mesh.colored_vertex(rect.right_bottom(), bottom);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(1, 3, 2);
    mesh
}
