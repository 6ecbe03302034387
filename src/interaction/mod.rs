//! Canvas interaction: viewport math, connection curves, port snapping,
//! selection, and the pointer-event state machine that drives graph edits.

pub mod curve;
pub mod selection;
pub mod snap;
pub mod state;
pub mod viewport;

pub use curve::ConnectionCurve;
pub use selection::Selection;
pub use state::{
    EndpointMarker, Interaction, InteractionState, Key, Outcome, PointerButton, PointerEvent,
};
pub use viewport::Viewport;
