//! # Simulated moving base
//!
//! Stands in for the motor control board when no hardware is available. It supports Cartesian
//! motion and completes every command instantly, which is all the robot needs since simulated
//! movements are driven step by step by the robot itself.
//!
//! In simulation the robot only asks the backend for its capabilities: the commands, reads and
//! stops below are never reached from the robot, they keep the backend a complete `MovingBase`
//! that can be driven on its own.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use crate::loc::Pose;
use comms_if::eqpt::{
    base::{CartesianReport, MovementStatus, MovingBase, PolarProgress},
    Board, BoardRole,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SimulatedBackend {
    pose: Pose,
    last_progress: PolarProgress,
    motion_enabled: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimulatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion_enabled(&self) -> bool {
        self.motion_enabled
    }
}

impl Board for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated base"
    }

    fn role(&self) -> BoardRole {
        BoardRole::MovingBase
    }

    fn connect(&mut self) -> bool {
        true
    }

    fn disconnect(&mut self) -> bool {
        true
    }
}

impl MovingBase for SimulatedBackend {
    fn supports_cartesian_motion(&self) -> bool {
        true
    }

    fn issue_cartesian_move(&mut self, x: f64, y: f64, heading_deg: f64, speed: f64) {
        trace!("Simulated base moving to ({:.1}, {:.1}, {:.1})", x, y, heading_deg);
        self.pose = Pose::new(x, y, heading_deg);
        self.pose.speed = speed;
    }

    fn issue_polar_move(&mut self, distance: f64, delta_angle_deg: f64, speed: f64) {
        self.pose = self.pose.displaced(distance, delta_angle_deg);
        self.last_progress = PolarProgress {
            distance,
            angle_deg: delta_angle_deg,
            speed,
        };
    }

    fn issue_repositioning_move(&mut self, distance: f64, speed: f64) {
        self.issue_polar_move(distance, 0.0, speed);
    }

    fn poll_status(&mut self) -> MovementStatus {
        MovementStatus::Idle
    }

    fn read_cartesian_pose(&mut self) -> CartesianReport {
        CartesianReport {
            x: self.pose.x,
            y: self.pose.y,
            heading_deg: self.pose.heading_deg,
            speed: self.pose.speed,
        }
    }

    fn read_polar_progress(&mut self) -> PolarProgress {
        self.last_progress
    }

    fn read_speed(&mut self) -> f64 {
        self.pose.speed
    }

    fn set_pose(&mut self, x: f64, y: f64, heading_deg: f64) {
        self.pose = Pose::new(x, y, heading_deg);
    }

    fn emergency_stop(&mut self) {
        self.pose.speed = 0.0;
    }

    fn enable_motion(&mut self) {
        self.motion_enabled = true;
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::base::MovementRequest;

    #[test]
    fn test_commands_complete_instantly() {
        let mut base = SimulatedBackend::new();
        assert!(base.supports_cartesian_motion());

        base.issue(&MovementRequest::Cartesian {
            x: 100.0,
            y: 50.0,
            heading_deg: 90.0,
            speed: 0.5,
        });
        assert_eq!(base.poll_status(), MovementStatus::Idle);

        let report = base.read_cartesian_pose();
        assert_eq!((report.x, report.y, report.heading_deg), (100.0, 50.0, 90.0));

        base.issue(&MovementRequest::Polar {
            distance: 20.0,
            delta_angle_deg: 0.0,
            speed: 0.5,
        });
        assert!((base.read_cartesian_pose().y - 70.0).abs() < 1e-9);
        assert_eq!(base.read_polar_progress().distance, 20.0);
    }
}
