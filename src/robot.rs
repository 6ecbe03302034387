//! Robot model abstraction
//!
//! Node kinds that talk to hardware (actions, stop, sensor reads) do so through
//! the `RobotModel` trait, so execution can be driven by a real robot bridge or
//! by the in-memory `RecordingRobot` used in tests and dry runs.

use crate::error::Result;
use serde_json::{json, Value};

/// Interface to the robot being programmed.
pub trait RobotModel: Send {
    /// Run a named motion. Returns whether the robot accepted it.
    fn run_action(&mut self, action: &str) -> Result<bool>;

    /// Halt all motion.
    fn stop(&mut self) -> Result<()>;

    /// Snapshot of the robot's sensors.
    fn sensor_data(&mut self) -> Result<Value>;
}

/// In-memory robot that records every command it receives.
#[derive(Debug, Default)]
pub struct RecordingRobot {
    pub actions: Vec<String>,
    pub stops: usize,
    /// Actions this robot refuses (reported as failed, not errored).
    pub rejected: Vec<String>,
}

impl RecordingRobot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RobotModel for RecordingRobot {
    fn run_action(&mut self, action: &str) -> Result<bool> {
        tracing::debug!("RecordingRobot: run_action({})", action);
        self.actions.push(action.to_string());
        Ok(!self.rejected.iter().any(|r| r == action))
    }

    fn stop(&mut self) -> Result<()> {
        self.stops += 1;
        Ok(())
    }

    fn sensor_data(&mut self) -> Result<Value> {
        Ok(json!({
            "imu": { "roll": 0.0, "pitch": 0.0, "yaw": 0.0 },
            "ultrasonic": 1.0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_robot() {
        let mut robot = RecordingRobot::new();
        robot.rejected.push("fly".to_string());
        assert!(robot.run_action("stand").unwrap());
        assert!(!robot.run_action("fly").unwrap());
        robot.stop().unwrap();
        assert_eq!(robot.actions, vec!["stand", "fly"]);
        assert_eq!(robot.stops, 1);
        assert!(robot.sensor_data().unwrap().get("imu").is_some());
    }
}
