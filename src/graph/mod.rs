//! Graph model: nodes, ports, connections and the node-kind registry.
//!
//! # Architecture
//!
//! ```text
//! KindRegistry ──create──► Node ──ports──► Port ─┐
//!                                                ├─ ConnectionId (weak, by id)
//! Graph { nodes, connections } ◄─────────────────┘
//! ```
//!
//! - **Arena ownership**: the graph owns nodes and connections in ordered maps;
//!   ports refer to connections by id only.
//! - **Structural propagation**: connecting into a bound input slot writes the
//!   upstream `"<node>.<slot>"` label into a parameter; disconnecting restores it.
//! - **Lazy layout**: structural edits mark nodes dirty, `flush_layout` lays
//!   them out once.

pub mod arena;
pub mod id;
pub mod kind;
pub mod kinds;
pub mod layout;
pub mod node;
pub mod port;
pub mod registry;
pub mod value;

pub use arena::{Connection, Endpoint, Graph};
pub use id::{ConnectionId, NodeId, PortRef};
pub use kind::{NodeKind, ParamBinding, SlotValues, FEATURES_KEY, SELECTION_KEY};
pub use kinds::LoopType;
pub use layout::NodeLayout;
pub use node::Node;
pub use port::{Port, PortDescriptor, PortDirection};
pub use registry::KindRegistry;
pub use value::{ParamValue, Parameters};
