//! Celebrimbor - Main Entry Point
//!
//! Node-based visual program editor with live code generation.

use celebrimbor::{frontend::CelebrimborApp, EditorConfig, Graph, KindRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,celebrimbor=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Celebrimbor");

    let config = EditorConfig::load_or_default();
    let theme = config.load_theme();

    let mut registry = KindRegistry::with_builtins();
    match config.custom_nodes_dir() {
        Some(dir) if dir.is_dir() => {
            let added = registry.load_custom_dir(&dir);
            tracing::info!("Loaded {} custom kind(s) from {:?}", added, dir);
        }
        Some(dir) => tracing::debug!("No custom kinds directory at {:?}", dir),
        None => tracing::debug!("Could not determine custom kinds directory"),
    }
    let graph = Graph::new(registry);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("Celebrimbor"),
        ..Default::default()
    };

    let dark_mode = config.ui.dark_mode;
    let result = eframe::run_native(
        "Celebrimbor",
        native_options,
        Box::new(move |cc| {
            if dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }

            Ok(Box::new(CelebrimborApp::new(cc, graph, config, theme)))
        }),
    );

    tracing::info!("Shutting down...");
    result
}
