//! Control-flow kinds: `if` (with dynamic elif branches), `while_loop`
//! (while/for sub-modes) and `comparison`.

use crate::error::Result;
use crate::graph::kind::{truthy, NodeKind, ParamBinding, SlotValues};
use crate::graph::layout::{spread, NodeLayout, ROW_HEIGHT};
use crate::graph::port::PortDescriptor;
use crate::graph::value::{ParamValue, Parameters};
use crate::robot::RobotModel;
use egui::vec2;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::fmt;

/// Sub-mode of a `while_loop` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopType {
    While,
    For,
}

impl LoopType {
    pub fn as_str(self) -> &'static str {
        match self {
            LoopType::While => "while",
            LoopType::For => "for",
        }
    }

    /// Palette feature label for this mode.
    pub fn label(self) -> &'static str {
        match self {
            LoopType::While => "While",
            LoopType::For => "For",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "while" | "while loop" => Some(LoopType::While),
            "for" | "for loop" => Some(LoopType::For),
            _ => None,
        }
    }

    pub fn of(params: &Parameters) -> Self {
        Self::parse(params.text("loop_type")).unwrap_or(LoopType::While)
    }
}

impl fmt::Display for LoopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn non_empty<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// if
// ---------------------------------------------------------------------------

/// Conditional branch with any number of elif branches.
#[derive(Debug, Default)]
pub struct IfKind;

impl IfKind {
    pub const ELIF_KEY: &'static str = "elif_conditions";

    pub fn elif_count(params: &Parameters) -> usize {
        params.list(Self::ELIF_KEY).len()
    }
}

impl NodeKind for IfKind {
    fn name(&self) -> &str {
        "if"
    }

    fn display_name(&self) -> &str {
        "If"
    }

    fn description(&self) -> &str {
        "Select execution path based on condition"
    }

    fn category(&self) -> &str {
        "logic"
    }

    fn default_parameters(&self) -> Parameters {
        Parameters::new()
            .with("condition_expr", "")
            .with(Self::ELIF_KEY, ParamValue::List(Vec::new()))
    }

    fn ports(&self, params: &Parameters) -> Vec<PortDescriptor> {
        let n = Self::elif_count(params);
        let mut ports = vec![PortDescriptor::input("condition")];
        ports.extend((0..n).map(|i| PortDescriptor::input(format!("elif_{i}"))));
        ports.push(PortDescriptor::output("out_true"));
        ports.extend((0..n).map(|i| PortDescriptor::output(format!("out_elif_{i}"))));
        ports.push(PortDescriptor::output("out_false"));
        ports
    }

    fn binding(&self, slot: &str) -> Option<ParamBinding> {
        if slot == "condition" {
            return Some(ParamBinding::Field("condition_expr".to_string()));
        }
        slot.strip_prefix("elif_")
            .and_then(|i| i.parse().ok())
            .map(|i| ParamBinding::ListItem(Self::ELIF_KEY.to_string(), i))
    }

    fn accepts(&self, key: &str, value: &ParamValue) -> bool {
        key != Self::ELIF_KEY || value.as_list().is_some()
    }

    fn affects_layout(&self, key: &str) -> bool {
        key == Self::ELIF_KEY
    }

    fn layout(&self, params: &Parameters) -> NodeLayout {
        let n = Self::elif_count(params);
        let mut layout = NodeLayout::new(vec2(220.0, 140.0 + ROW_HEIGHT * n as f32))
            .input("condition", 0.28)
            .output("out_true", 0.28);
        for i in 0..n {
            let y = spread(i, n, 0.40, 0.76);
            layout = layout
                .input(format!("elif_{i}"), y)
                .output(format!("out_elif_{i}"), y);
        }
        layout.output("out_false", 0.88)
    }

    fn execute(
        &self,
        params: &Parameters,
        inputs: &SlotValues,
        _robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let mut outputs = SlotValues::new();
        if truthy(inputs.get("condition")) {
            outputs.insert("out_true".into(), json!({ "value": true }));
            outputs.insert("out_false".into(), Value::Null);
            return Ok(outputs);
        }
        for i in 0..Self::elif_count(params) {
            if truthy(inputs.get(&format!("elif_{i}"))) {
                outputs.insert(format!("out_elif_{i}"), json!({ "value": true }));
                outputs.insert("out_false".into(), Value::Null);
                return Ok(outputs);
            }
        }
        outputs.insert("out_true".into(), Value::Null);
        outputs.insert("out_false".into(), json!({ "value": false }));
        Ok(outputs)
    }

    fn annotate(&self, params: &Parameters) -> Vec<String> {
        let mut lines = vec![format!("condition: {}", params.text("condition_expr"))];
        for (i, expr) in params.list(Self::ELIF_KEY).iter().enumerate() {
            lines.push(format!("elif_{i}: {expr}"));
        }
        lines
    }

    fn to_code(&self, params: &Parameters) -> String {
        let mut code = format!(
            "# Conditional branch\nif {}:\n    pass  # true branch\n",
            non_empty(params.text("condition_expr"), "condition")
        );
        for (i, expr) in params.list(Self::ELIF_KEY).iter().enumerate() {
            let fallback = format!("elif_condition_{i}");
            let expr = expr.to_string();
            code.push_str(&format!(
                "elif {}:\n    pass  # elif branch {i}\n",
                non_empty(&expr, &fallback)
            ));
        }
        code.push_str("else:\n    pass  # false branch");
        code
    }
}

// ---------------------------------------------------------------------------
// while_loop
// ---------------------------------------------------------------------------

/// Loop node with a `while` and a `for` sub-mode.
#[derive(Debug, Default)]
pub struct WhileLoopKind;

const FOR_SLOTS: [&str; 3] = ["for_start", "for_end", "for_step"];

impl NodeKind for WhileLoopKind {
    fn name(&self) -> &str {
        "while_loop"
    }

    fn display_name(&self) -> &str {
        "While Loop"
    }

    fn description(&self) -> &str {
        "Repeat execution while condition is true"
    }

    fn category(&self) -> &str {
        "logic"
    }

    fn default_parameters(&self) -> Parameters {
        Parameters::new()
            .with("loop_type", LoopType::While.as_str())
            .with("condition_expr", "")
            .with("for_start", 0i64)
            .with("for_end", 1i64)
            .with("for_step", 1i64)
    }

    fn ports(&self, params: &Parameters) -> Vec<PortDescriptor> {
        let is_for = LoopType::of(params) == LoopType::For;
        let mut ports = vec![PortDescriptor::input("condition").visible_if(!is_for)];
        ports.extend(
            FOR_SLOTS
                .iter()
                .map(|slot| PortDescriptor::input(*slot).visible_if(is_for)),
        );
        ports.push(PortDescriptor::output("loop_body"));
        ports.push(PortDescriptor::output("loop_end"));
        ports
    }

    fn features(&self) -> Vec<String> {
        vec![LoopType::While.label().to_string(), LoopType::For.label().to_string()]
    }

    fn apply_feature(&self, params: &mut Parameters, feature: &str) -> bool {
        match LoopType::parse(feature) {
            Some(mode) => {
                let changed = LoopType::of(params) != mode;
                params.set("loop_type", mode.as_str());
                changed
            }
            None => false,
        }
    }

    fn binding(&self, slot: &str) -> Option<ParamBinding> {
        match slot {
            "condition" => Some(ParamBinding::Field("condition_expr".to_string())),
            s if FOR_SLOTS.contains(&s) => Some(ParamBinding::Field(s.to_string())),
            _ => None,
        }
    }

    fn accepts(&self, key: &str, value: &ParamValue) -> bool {
        key != "loop_type" || value.as_str().and_then(LoopType::parse).is_some()
    }

    fn affects_layout(&self, key: &str) -> bool {
        key == "loop_type"
    }

    fn layout(&self, params: &Parameters) -> NodeLayout {
        let height = match LoopType::of(params) {
            LoopType::While => 120.0,
            LoopType::For => 170.0,
        };
        NodeLayout::new(vec2(220.0, height))
            .input("condition", 0.50)
            .input("for_start", 0.62)
            .input("for_end", 0.72)
            .input("for_step", 0.82)
            .output("loop_body", 0.28)
            .output("loop_end", 0.88)
    }

    fn execute(
        &self,
        params: &Parameters,
        inputs: &SlotValues,
        _robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let should_run = match LoopType::of(params) {
            LoopType::For => {
                let bound = |slot: &str, default: f64| {
                    inputs
                        .get(slot)
                        .and_then(Value::as_f64)
                        .or_else(|| params.get(slot).and_then(ParamValue::as_float))
                        .unwrap_or(default)
                };
                let start = bound("for_start", 0.0);
                let end = bound("for_end", 1.0);
                let step = bound("for_step", 1.0);
                if step > 0.0 {
                    start < end
                } else {
                    start > end
                }
            }
            LoopType::While => truthy(inputs.get("condition")),
        };

        let mut outputs = SlotValues::new();
        if should_run {
            outputs.insert("loop_body".into(), json!({ "continue": true }));
            outputs.insert("loop_end".into(), Value::Null);
        } else {
            outputs.insert("loop_body".into(), Value::Null);
            outputs.insert("loop_end".into(), json!({ "finished": true }));
        }
        Ok(outputs)
    }

    fn annotate(&self, params: &Parameters) -> Vec<String> {
        let mode = LoopType::of(params);
        let mut lines = vec![format!("loop_type: {mode}")];
        match mode {
            LoopType::While => {
                lines.push(format!("condition: {}", params.text("condition_expr")));
            }
            LoopType::For => lines.push(format!(
                "for: start={}, end={}, step={}",
                params.display("for_start"),
                params.display("for_end"),
                params.display("for_step"),
            )),
        }
        lines
    }

    fn to_code(&self, params: &Parameters) -> String {
        match LoopType::of(params) {
            LoopType::For => format!(
                "# For loop\nfor i in range({}, {}, {}):\n    pass  # loop body",
                non_empty(&params.display("for_start"), "0"),
                non_empty(&params.display("for_end"), "1"),
                non_empty(&params.display("for_step"), "1"),
            ),
            LoopType::While => format!(
                "# While loop\nwhile {}:\n    pass  # loop body",
                non_empty(params.text("condition_expr"), "condition")
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// comparison
// ---------------------------------------------------------------------------

const OPERATORS: [(&str, &str); 6] = [
    ("Equal", "=="),
    ("Not Equal", "!="),
    ("Greater Than", ">"),
    ("Less Than", "<"),
    ("Greater Or Equal", ">="),
    ("Less Or Equal", "<="),
];

/// Compares two operands with a relational operator.
#[derive(Debug, Default)]
pub struct ComparisonKind;

impl ComparisonKind {
    fn operator(params: &Parameters) -> &str {
        let op = params.text("operator");
        if OPERATORS.iter().any(|(_, o)| *o == op) {
            op
        } else {
            "=="
        }
    }
}

fn compare(left: &Value, right: &Value, op: &str) -> bool {
    let ordering = match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    };
    match op {
        "==" => ordering == Some(Ordering::Equal) || (ordering.is_none() && left == right),
        "!=" => !(ordering == Some(Ordering::Equal) || (ordering.is_none() && left == right)),
        ">" => ordering == Some(Ordering::Greater),
        "<" => ordering == Some(Ordering::Less),
        ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    }
}

impl NodeKind for ComparisonKind {
    fn name(&self) -> &str {
        "comparison"
    }

    fn display_name(&self) -> &str {
        "Comparison"
    }

    fn description(&self) -> &str {
        "Compare two values"
    }

    fn category(&self) -> &str {
        "condition"
    }

    fn default_parameters(&self) -> Parameters {
        Parameters::new()
            .with("operator", "==")
            .with("left", "")
            .with("right", "")
            .with("compare_value", 0i64)
            .with("output_name", "")
    }

    fn ports(&self, _params: &Parameters) -> Vec<PortDescriptor> {
        vec![
            PortDescriptor::input("left"),
            PortDescriptor::input("right"),
            PortDescriptor::output("result"),
        ]
    }

    fn features(&self) -> Vec<String> {
        OPERATORS.iter().map(|(label, _)| label.to_string()).collect()
    }

    fn apply_feature(&self, params: &mut Parameters, feature: &str) -> bool {
        if let Some((_, op)) = OPERATORS.iter().find(|(label, _)| *label == feature) {
            params.set("operator", *op);
        }
        false
    }

    fn binding(&self, slot: &str) -> Option<ParamBinding> {
        match slot {
            "left" | "right" => Some(ParamBinding::Field(slot.to_string())),
            _ => None,
        }
    }

    fn accepts(&self, key: &str, value: &ParamValue) -> bool {
        key != "operator"
            || value
                .as_str()
                .map(|op| OPERATORS.iter().any(|(_, o)| *o == op))
                .unwrap_or(false)
    }

    fn layout(&self, _params: &Parameters) -> NodeLayout {
        NodeLayout::new(vec2(210.0, 140.0))
            .input("left", 0.45)
            .input("right", 0.70)
            .output("result", 0.5)
    }

    fn execute(
        &self,
        params: &Parameters,
        inputs: &SlotValues,
        _robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let left = inputs.get("left").cloned().unwrap_or(json!(0));
        let right = inputs
            .get("right")
            .cloned()
            .or_else(|| params.get("compare_value").map(ParamValue::to_json))
            .unwrap_or(json!(0));
        let result = compare(&left, &right, Self::operator(params));

        let mut outputs = SlotValues::new();
        outputs.insert("result".into(), json!({ "value": result }));
        Ok(outputs)
    }

    fn annotate(&self, params: &Parameters) -> Vec<String> {
        let mut lines = vec![format!("operator: {}", Self::operator(params))];
        let operands: Vec<String> = ["left", "right"]
            .iter()
            .filter(|k| !params.text(k).is_empty())
            .map(|k| format!("{}={}", k, params.text(k)))
            .collect();
        if !operands.is_empty() {
            lines.push(format!("inputs: {}", operands.join(", ")));
        }
        if !params.text("output_name").is_empty() {
            lines.push(format!("outputs: {}", params.text("output_name")));
        }
        lines
    }

    fn to_code(&self, params: &Parameters) -> String {
        let compare_value = params.display("compare_value");
        format!(
            "# Comparison\n{} = {} {} {}",
            non_empty(params.text("output_name"), "result"),
            non_empty(params.text("left"), "value"),
            Self::operator(params),
            non_empty(params.text("right"), non_empty(&compare_value, "0")),
        )
    }
}
