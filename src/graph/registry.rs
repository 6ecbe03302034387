//! Node-kind registry.
//!
//! Maps kind names to their `NodeKind` implementation. Registration order is
//! preserved for the palette. Kinds can be added until the palette is built;
//! names are unique.

use super::id::NodeId;
use super::kind::NodeKind;
use super::kinds::{builtin_kinds, scripted};
use super::node::Node;
use crate::error::{EditorError, Result};
use egui::Pos2;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct KindRegistry {
    kinds: Vec<Arc<dyn NodeKind>>,
}

impl std::fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.kinds.iter().map(|k| k.name()))
            .finish()
    }
}

impl KindRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for kind in builtin_kinds() {
            // Built-in names are distinct.
            let _ = registry.register(kind);
        }
        registry
    }

    /// Add a kind. Fails with `DuplicateKind` if the name is taken.
    pub fn register(&mut self, kind: Arc<dyn NodeKind>) -> Result<()> {
        if self.contains(kind.name()) {
            return Err(EditorError::DuplicateKind(kind.name().to_string()));
        }
        tracing::debug!("Registered node kind '{}'", kind.name());
        self.kinds.push(kind);
        Ok(())
    }

    /// Look a kind up by name. Fails with `UnknownKind`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn NodeKind>> {
        self.kinds
            .iter()
            .find(|k| k.name() == name)
            .cloned()
            .ok_or_else(|| EditorError::UnknownKind(name.to_string()))
    }

    /// Instantiate a node of kind `name`. Fails with `UnknownKind`.
    pub fn create(&self, name: &str, id: NodeId, position: Pos2) -> Result<Node> {
        Ok(Node::new(id, self.get(name)?, position))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kinds.iter().any(|k| k.name() == name)
    }

    /// Find a kind by name or, case-insensitively, by display name.
    pub fn find_by_title(&self, title: &str) -> Option<Arc<dyn NodeKind>> {
        let title = title.trim();
        self.kinds
            .iter()
            .find(|k| k.name() == title)
            .or_else(|| {
                self.kinds
                    .iter()
                    .find(|k| k.display_name().eq_ignore_ascii_case(title))
            })
            .cloned()
    }

    /// Kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn NodeKind>> {
        self.kinds.iter()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Register every scripted kind found in `dir`. Name collisions are
    /// logged and skipped. Returns how many kinds were added.
    pub fn load_custom_dir(&mut self, dir: &Path) -> usize {
        let mut added = 0;
        for kind in scripted::discover(dir) {
            let name = kind.name().to_string();
            let has_script = kind.has_script();
            match self.register(Arc::new(kind)) {
                Ok(()) => {
                    tracing::info!("Custom kind '{}' registered (script: {})", name, has_script);
                    added += 1;
                }
                Err(e) => tracing::warn!("Skipping custom kind: {}", e),
            }
        }
        added
    }
}
