//! Node-kind abstraction.
//!
//! A kind is the template every node of that kind is instantiated from: its
//! ports (possibly depending on parameters, e.g. elif branches), default
//! parameters, palette features, layout, execution transform and code
//! emission. Built-in kinds and scripted kinds loaded from disk both implement
//! `NodeKind`; the registry stores them behind `Arc<dyn NodeKind>` keyed by
//! name.

use super::layout::{even_layout, NodeLayout, DEFAULT_NODE_SIZE};
use super::port::PortDescriptor;
use super::value::{ParamValue, Parameters};
use crate::error::Result;
use crate::robot::RobotModel;
use serde_json::{Map, Value};

/// Parameter key holding the currently selected palette feature.
pub const SELECTION_KEY: &str = "selection";

/// Parameter key holding the node's feature list.
pub const FEATURES_KEY: &str = "features";

/// Inputs and outputs of `NodeKind::execute`, keyed by slot.
pub type SlotValues = Map<String, Value>;

/// Which parameter an input slot writes its upstream label into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// Replace a whole text parameter.
    Field(String),
    /// Replace one element of a list parameter.
    ListItem(String, usize),
}

/// Template for a family of nodes.
pub trait NodeKind: Send + Sync {
    /// Unique registry key, e.g. `while_loop`.
    fn name(&self) -> &str;

    /// Human-readable name, used as the default node title.
    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// Palette group and theme prefix.
    fn category(&self) -> &str {
        "custom"
    }

    fn default_parameters(&self) -> Parameters;

    /// Ports for a node with the given parameters, in display order.
    fn ports(&self, params: &Parameters) -> Vec<PortDescriptor>;

    /// Palette features offered by the node's selector.
    fn features(&self) -> Vec<String> {
        Vec::new()
    }

    /// Feature selected when the drop payload names none.
    fn default_feature(&self) -> Option<String> {
        self.features().into_iter().next()
    }

    /// Update derived parameters for a newly selected feature.
    /// Returns `true` when the node's port layout changed.
    fn apply_feature(&self, _params: &mut Parameters, _feature: &str) -> bool {
        false
    }

    /// Where an upstream label lands when `slot` gets connected.
    fn binding(&self, _slot: &str) -> Option<ParamBinding> {
        None
    }

    /// Whether `key = value` is an acceptable edit.
    fn accepts(&self, _key: &str, _value: &ParamValue) -> bool {
        true
    }

    /// Whether changing `key` alters the port list or geometry.
    fn affects_layout(&self, _key: &str) -> bool {
        false
    }

    fn layout(&self, params: &Parameters) -> NodeLayout {
        even_layout(DEFAULT_NODE_SIZE.x, &self.ports(params))
    }

    /// Evaluate the node once. Failures of the robot are reported inside the
    /// returned values rather than as an `Err`.
    fn execute(
        &self,
        params: &Parameters,
        inputs: &SlotValues,
        robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues>;

    /// Structural comment lines (without `# `) describing current parameters.
    fn annotate(&self, _params: &Parameters) -> Vec<String> {
        Vec::new()
    }

    /// Code snippet for this node, one statement per line.
    fn to_code(&self, params: &Parameters) -> String;
}

/// `Lift Right Leg` -> `lift_right_leg`.
pub fn snake_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Truthiness of an execution input, Python-style.
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Standard error payload for kinds that need a robot and were given none.
pub fn robot_missing() -> Value {
    serde_json::json!({ "status": "error", "message": "Robot model not set" })
}
