//! Identity types for the graph model.
//!
//! Node and connection ids are newtypes over `u32` issued from monotonically
//! increasing counters. They key the graph's ordered arenas, so iterating the
//! arena visits entries in creation order. Ids are never reused within a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a node on the canvas.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId(INVALID)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a connection in the graph's connection set.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    pub const INVALID: ConnectionId = ConnectionId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "ConnectionId(INVALID)")
        } else {
            write!(f, "ConnectionId({})", self.0)
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Reference to a port: owning node plus the slot identifier unique within it.
///
/// Holding a `PortRef` does not keep the port alive; resolving it against the
/// graph may fail once the node (or a dynamic slot) is gone.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub node: NodeId,
    pub slot: String,
}

impl PortRef {
    pub fn new(node: NodeId, slot: impl Into<String>) -> Self {
        Self {
            node,
            slot: slot.into(),
        }
    }
}

impl fmt::Debug for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PortRef(node={}, slot={})", self.node.0, self.slot)
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node.0, self.slot)
    }
}

/// Monotonic id allocator. Never hands out the same value twice.
#[derive(Debug, Clone, Default)]
pub struct IdSequence {
    next: u32,
}

impl IdSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next raw id. `None` once every value below the
    /// `u32::MAX` sentinel has been issued.
    pub fn next_raw(&mut self) -> Option<u32> {
        let id = self.next;
        if id == u32::MAX {
            return None;
        }
        self.next += 1;
        Some(id)
    }

    /// Value the next allocation will return.
    pub fn peek(&self) -> u32 {
        self.next
    }
}
