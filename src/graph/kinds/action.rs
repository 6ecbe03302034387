//! Robot motion kinds: `action_execution` and `stop`.

use crate::error::Result;
use crate::graph::kind::{robot_missing, snake_case, NodeKind, SlotValues};
use crate::graph::layout::{NodeLayout, DEFAULT_NODE_SIZE};
use crate::graph::port::PortDescriptor;
use crate::graph::value::Parameters;
use crate::robot::RobotModel;
use serde_json::json;

const ACTION_FEATURES: [&str; 5] = ["Lift Right Leg", "Stand", "Sit", "Walk", "Stop"];

/// Runs a named robot motion.
#[derive(Debug, Default)]
pub struct ActionExecutionKind;

impl NodeKind for ActionExecutionKind {
    fn name(&self) -> &str {
        "action_execution"
    }

    fn display_name(&self) -> &str {
        "Action Execution"
    }

    fn description(&self) -> &str {
        "Execute robot action (stand, lift leg, walk, etc.)"
    }

    fn category(&self) -> &str {
        "action"
    }

    fn default_parameters(&self) -> Parameters {
        Parameters::new().with("action", "stand")
    }

    fn ports(&self, _params: &Parameters) -> Vec<PortDescriptor> {
        vec![PortDescriptor::input("in"), PortDescriptor::output("out")]
    }

    fn features(&self) -> Vec<String> {
        ACTION_FEATURES.iter().map(|s| s.to_string()).collect()
    }

    fn default_feature(&self) -> Option<String> {
        Some("Stand".to_string())
    }

    fn apply_feature(&self, params: &mut Parameters, feature: &str) -> bool {
        params.set("action", snake_case(feature));
        false
    }

    fn layout(&self, _params: &Parameters) -> NodeLayout {
        NodeLayout::new(DEFAULT_NODE_SIZE)
            .input("in", 0.5)
            .output("out", 0.5)
    }

    fn execute(
        &self,
        params: &Parameters,
        _inputs: &SlotValues,
        robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let action = match params.text("action") {
            "" => "stand",
            a => a,
        };
        let out = match robot {
            None => robot_missing(),
            Some(robot) => match robot.run_action(action) {
                Ok(accepted) => json!({
                    "status": if accepted { "success" } else { "failed" },
                    "action": action,
                }),
                Err(e) => json!({ "status": "error", "message": e.to_string() }),
            },
        };
        let mut outputs = SlotValues::new();
        outputs.insert("out".to_string(), out);
        Ok(outputs)
    }

    fn to_code(&self, params: &Parameters) -> String {
        let action = match params.text("action") {
            "" => "stand",
            a => a,
        };
        format!("# Action execution: {action}\nrobot.run_action('{action}')")
    }
}

/// Halts all robot motion.
#[derive(Debug, Default)]
pub struct StopKind;

impl NodeKind for StopKind {
    fn name(&self) -> &str {
        "stop"
    }

    fn display_name(&self) -> &str {
        "Stop"
    }

    fn description(&self) -> &str {
        "Stop robot motion"
    }

    fn category(&self) -> &str {
        "action"
    }

    fn default_parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn ports(&self, _params: &Parameters) -> Vec<PortDescriptor> {
        vec![PortDescriptor::input("in"), PortDescriptor::output("out")]
    }

    fn layout(&self, _params: &Parameters) -> NodeLayout {
        NodeLayout::new(DEFAULT_NODE_SIZE)
            .input("in", 0.5)
            .output("out", 0.5)
    }

    fn execute(
        &self,
        _params: &Parameters,
        _inputs: &SlotValues,
        robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let out = match robot {
            None => robot_missing(),
            Some(robot) => match robot.stop() {
                Ok(()) => json!({ "status": "stopped" }),
                Err(e) => json!({ "status": "error", "message": e.to_string() }),
            },
        };
        let mut outputs = SlotValues::new();
        outputs.insert("out".to_string(), out);
        Ok(outputs)
    }

    fn to_code(&self, _params: &Parameters) -> String {
        "# Stop\nrobot.stop()".to_string()
    }
}
