//! Built-in node kinds and the scripted extension kind.

pub mod action;
pub mod logic;
pub mod scripted;
pub mod sensor;

pub use action::{ActionExecutionKind, StopKind};
pub use logic::{ComparisonKind, IfKind, LoopType, WhileLoopKind};
pub use scripted::{ScriptedKind, ScriptedKindDef};
pub use sensor::SensorInputKind;

use super::kind::NodeKind;
use std::sync::Arc;

/// Every built-in kind, in palette order.
pub fn builtin_kinds() -> Vec<Arc<dyn NodeKind>> {
    vec![
        Arc::new(ActionExecutionKind),
        Arc::new(StopKind),
        Arc::new(IfKind),
        Arc::new(WhileLoopKind),
        Arc::new(ComparisonKind),
        Arc::new(SensorInputKind),
    ]
}
