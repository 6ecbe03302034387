//! `sensor_input`: reads the robot's sensors. Source-only, no inputs.

use crate::error::Result;
use crate::graph::kind::{robot_missing, NodeKind, SlotValues};
use crate::graph::layout::{NodeLayout, DEFAULT_NODE_SIZE};
use crate::graph::port::PortDescriptor;
use crate::graph::value::Parameters;
use crate::robot::RobotModel;
use serde_json::json;

const SENSOR_FEATURES: [(&str, &str); 5] = [
    ("Read Ultrasonic", "ultrasonic"),
    ("Read Infrared", "infrared"),
    ("Read Camera", "camera"),
    ("Read IMU", "imu"),
    ("Read Odometry", "odometry"),
];

#[derive(Debug, Default)]
pub struct SensorInputKind;

impl SensorInputKind {
    fn sensor_type(params: &Parameters) -> &str {
        match params.text("sensor_type") {
            "" => "imu",
            s => s,
        }
    }
}

impl NodeKind for SensorInputKind {
    fn name(&self) -> &str {
        "sensor_input"
    }

    fn display_name(&self) -> &str {
        "Sensor Input"
    }

    fn description(&self) -> &str {
        "Read robot sensor data"
    }

    fn category(&self) -> &str {
        "sensor"
    }

    fn default_parameters(&self) -> Parameters {
        Parameters::new().with("sensor_type", "imu")
    }

    fn ports(&self, _params: &Parameters) -> Vec<PortDescriptor> {
        vec![PortDescriptor::output("out")]
    }

    fn features(&self) -> Vec<String> {
        SENSOR_FEATURES.iter().map(|(label, _)| label.to_string()).collect()
    }

    fn default_feature(&self) -> Option<String> {
        Some("Read IMU".to_string())
    }

    fn apply_feature(&self, params: &mut Parameters, feature: &str) -> bool {
        if let Some((_, sensor)) = SENSOR_FEATURES.iter().find(|(label, _)| *label == feature) {
            params.set("sensor_type", *sensor);
        }
        false
    }

    fn layout(&self, _params: &Parameters) -> NodeLayout {
        NodeLayout::new(DEFAULT_NODE_SIZE).output("out", 0.5)
    }

    fn execute(
        &self,
        params: &Parameters,
        _inputs: &SlotValues,
        robot: Option<&mut dyn RobotModel>,
    ) -> Result<SlotValues> {
        let sensor_type = Self::sensor_type(params);
        let out = match robot {
            None => robot_missing(),
            Some(robot) => match robot.sensor_data() {
                Ok(data) => json!({
                    "status": "success",
                    "sensor_type": sensor_type,
                    "data": data,
                }),
                Err(e) => json!({ "status": "error", "message": e.to_string() }),
            },
        };
        let mut outputs = SlotValues::new();
        outputs.insert("out".to_string(), out);
        Ok(outputs)
    }

    fn annotate(&self, params: &Parameters) -> Vec<String> {
        vec![format!("sensor_type: {}", Self::sensor_type(params))]
    }

    fn to_code(&self, params: &Parameters) -> String {
        format!(
            "# Sensor input: {}\nsensor_data = robot.get_sensor_data()",
            Self::sensor_type(params)
        )
    }
}
