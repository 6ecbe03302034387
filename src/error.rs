//! Error handling for the Celebrimbor editor core
//!
//! This module defines the error taxonomy shared by the graph model, the
//! kind registry, the drop protocol and the configuration layer, plus a
//! Result alias used throughout the crate.

use crate::graph::{ConnectionId, NodeId, PortRef};
use thiserror::Error;

/// Main error type for editor operations
#[derive(Error, Debug)]
pub enum EditorError {
    /// Creating a node of a kind the registry does not know
    #[error("Unknown node kind: {0}")]
    UnknownKind(String),

    /// Registering a kind name twice
    #[error("Node kind already registered: {0}")]
    DuplicateKind(String),

    /// Connecting two ports that share a direction
    #[error("Cannot connect ports of the same type ({from} -> {to})")]
    DirectionMismatch { from: PortRef, to: PortRef },

    /// A port reference that no longer resolves against the graph
    #[error("Port no longer exists: {0}")]
    DanglingPort(PortRef),

    /// Rebinding a connection onto a port pair another connection already links
    #[error("Ports are already linked by connection {0}")]
    DuplicateConnection(ConnectionId),

    /// Every node or connection id has been issued
    #[error("No {0} ids left")]
    IdsExhausted(&'static str),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Unknown connection: {0}")]
    UnknownConnection(ConnectionId),

    /// Drop payload that could not be understood
    #[error("Malformed drop payload: {0}")]
    MalformedDropPayload(String),

    /// A parameter edit the node's kind rejects
    #[error("Invalid parameter '{key}' on node {node}")]
    InvalidParameter { node: NodeId, key: String },

    /// Errors related to Rhai script compilation/execution
    #[error("Script error: {0}")]
    Script(String),

    /// Errors related to configuration, theme and kind-file loading
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EditorError>,
    },
}

impl EditorError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EditorError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a script error from a Rhai error
    pub fn from_rhai_error(err: Box<rhai::EvalAltResult>) -> Self {
        EditorError::Script(err.to_string())
    }

    /// The innermost error, skipping any context wrappers.
    pub fn root(&self) -> &EditorError {
        match self {
            EditorError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, Box<rhai::EvalAltResult>> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EditorError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| EditorError::from_rhai_error(e).with_context(f()))
    }
}
