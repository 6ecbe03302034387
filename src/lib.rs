//! # Celebrimbor: node-based visual program editor
//!
//! Users place typed nodes on a zoomable canvas, wire output ports to input
//! ports, and the editor keeps a generated program in sync with the graph.
//!
//! ## Architecture
//!
//! - **Graph**: Arena of nodes and connections keyed by stable ids, with the
//!   node-kind registry and port layout
//! - **Interaction**: Pointer state machine for connecting, reconnecting,
//!   panning, box selection and node dragging
//! - **Codegen**: Deterministic program text from the graph
//! - **Editor**: Facade that routes events, regenerates code after each
//!   mutation and publishes notifications over crossbeam channels
//! - **Frontend**: eframe/egui host (canvas, palette, inspector, code view)
//!
//! ## Configuration
//!
//! The editor configuration and custom node kinds live in the
//! platform-appropriate data directory under `dev.celebrimbor.editor`:
//!
//! - **Linux**: `~/.local/share/dev.celebrimbor.editor/`
//! - **macOS**: `~/Library/Application Support/dev.celebrimbor.editor/`
//! - **Windows**: `%APPDATA%\dev.celebrimbor.editor\`
//!
//! ## Example
//!
//! ```no_run
//! use celebrimbor::{codegen, Graph, KindRegistry, PortRef};
//! use egui::pos2;
//!
//! let mut graph = Graph::new(KindRegistry::with_builtins());
//! let sensor = graph.create_node("sensor_input", pos2(0.0, 0.0), &Default::default())?;
//! let check = graph.create_node("comparison", pos2(300.0, 0.0), &Default::default())?;
//! graph.connect(&PortRef::new(sensor, "out"), &PortRef::new(check, "left"))?;
//! println!("{}", codegen::generate(&graph));
//! # Ok::<(), celebrimbor::EditorError>(())
//! ```

pub mod codegen;
pub mod config;
pub mod drop_payload;
pub mod editor;
pub mod error;
pub mod frontend;
pub mod graph;
pub mod interaction;
pub mod robot;

// Re-export commonly used types
pub use config::{EditorConfig, StyleResolver, Theme};
pub use drop_payload::DropPayload;
pub use editor::{ChannelSink, CodeSink, Editor, EditorEvent};
pub use error::{EditorError, Result};
pub use frontend::CelebrimborApp;
pub use graph::{ConnectionId, Graph, KindRegistry, NodeId, NodeKind, PortRef};
pub use interaction::{Interaction, PointerEvent};
pub use robot::{RecordingRobot, RobotModel};
