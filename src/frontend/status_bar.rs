//! Status bar panel: bottom line with the last editor message and counts.

use egui::{Color32, RichText, Ui};

/// Last message shown in the status bar.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    Info(String),
    Warning(String),
}

/// Context needed to render the status bar.
pub struct StatusBarContext<'a> {
    pub status: Option<&'a StatusLine>,
    pub nodes: usize,
    pub connections: usize,
    pub zoom: f32,
    pub interaction: &'a str,
}

/// Render the status bar.
pub fn render_status_bar(ui: &mut Ui, ctx: &StatusBarContext<'_>) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        match ctx.status {
            Some(StatusLine::Info(msg)) => {
                ui.label(RichText::new(msg).small());
            }
            Some(StatusLine::Warning(msg)) => {
                ui.colored_label(Color32::YELLOW, "⚠");
                ui.label(RichText::new(msg).small().color(Color32::YELLOW));
            }
            None => {
                ui.label(RichText::new("Ready").small());
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new(format!("Zoom: {:.0}%", ctx.zoom * 100.0)).small());
            ui.separator();
            ui.label(RichText::new(format!("Connections: {}", ctx.connections)).small());
            ui.separator();
            ui.label(RichText::new(format!("Nodes: {}", ctx.nodes)).small());
            ui.separator();
            ui.label(RichText::new(ctx.interaction).small().weak());
        });
    });
}
