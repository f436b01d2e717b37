//! # Moving Base Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Board;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Absolute pose reported by a base which tracks its own Cartesian position.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartesianReport {
    pub x: f64,
    pub y: f64,

    /// Heading in degrees.
    pub heading_deg: f64,

    pub speed: f64,
}

/// Progress of the current polar movement, accumulated since the movement was issued.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarProgress {
    pub distance: f64,

    /// Rotation done so far in degrees.
    pub angle_deg: f64,

    pub speed: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Status of the movement the base is currently executing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum MovementStatus {
    /// The base is still executing the last command
    Running,

    /// The base could not complete the last command, its wheels are blocked
    Stuck,

    /// No movement in progress
    Idle,
}

/// A movement command the core can issue to the base.
///
/// Exactly one shape is active per issued command.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum MovementRequest {
    /// Drive to an absolute position and heading. Only valid on bases supporting Cartesian motion.
    Cartesian {
        x: f64,
        y: f64,
        heading_deg: f64,
        speed: f64,
    },

    /// Rotate by `delta_angle_deg` then travel `distance` (negative is backwards).
    Polar {
        distance: f64,
        delta_angle_deg: f64,
        speed: f64,
    },

    /// Drive straight until blocked, used to align against a wall.
    Repositioning { distance: f64, speed: f64 },
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The motor control board.
///
/// The core never issues a second command before the previous one has reached a terminal state.
pub trait MovingBase: Board {
    /// True if the base can execute [`MovementRequest::Cartesian`] commands.
    fn supports_cartesian_motion(&self) -> bool;

    fn issue_cartesian_move(&mut self, x: f64, y: f64, heading_deg: f64, speed: f64);

    fn issue_polar_move(&mut self, distance: f64, delta_angle_deg: f64, speed: f64);

    fn issue_repositioning_move(&mut self, distance: f64, speed: f64);

    fn poll_status(&mut self) -> MovementStatus;

    fn read_cartesian_pose(&mut self) -> CartesianReport;

    fn read_polar_progress(&mut self) -> PolarProgress;

    /// Current speed of the base, used when no movement is being tracked.
    fn read_speed(&mut self) -> f64;

    /// Overwrite the pose the base believes it is at.
    fn set_pose(&mut self, x: f64, y: f64, heading_deg: f64);

    /// Stop immediately, abandoning the current command.
    fn emergency_stop(&mut self);

    /// Authorise the base to move. Bases refuse to move before this is called.
    fn enable_motion(&mut self);

    /// Issue any kind of movement request.
    fn issue(&mut self, request: &MovementRequest) {
        match *request {
            MovementRequest::Cartesian {
                x,
                y,
                heading_deg,
                speed,
            } => self.issue_cartesian_move(x, y, heading_deg, speed),
            MovementRequest::Polar {
                distance,
                delta_angle_deg,
                speed,
            } => self.issue_polar_move(distance, delta_angle_deg, speed),
            MovementRequest::Repositioning { distance, speed } => {
                self.issue_repositioning_move(distance, speed)
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MovementRequest {
    /// Returns true if this request reports progress as an absolute Cartesian pose.
    pub fn is_cartesian(&self) -> bool {
        matches!(self, MovementRequest::Cartesian { .. })
    }

    /// Returns true if the request only rotates the robot on the spot.
    pub fn is_rotation_only(&self) -> bool {
        match self {
            MovementRequest::Polar { distance, .. } => *distance == 0.0,
            _ => false,
        }
    }

    pub fn speed(&self) -> f64 {
        match *self {
            MovementRequest::Cartesian { speed, .. }
            | MovementRequest::Polar { speed, .. }
            | MovementRequest::Repositioning { speed, .. } => speed,
        }
    }
}

impl std::fmt::Display for MovementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementStatus::Running => write!(f, "running"),
            MovementStatus::Stuck => write!(f, "stuck"),
            MovementStatus::Idle => write!(f, "idle"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_request_shape() {
        let rot = MovementRequest::Polar {
            distance: 0.0,
            delta_angle_deg: 90.0,
            speed: 0.5,
        };
        assert!(rot.is_rotation_only());
        assert!(!rot.is_cartesian());

        let xy = MovementRequest::Cartesian {
            x: 1.0,
            y: 2.0,
            heading_deg: 0.0,
            speed: 0.8,
        };
        assert!(xy.is_cartesian());
        assert!(!xy.is_rotation_only());
        assert_eq!(xy.speed(), 0.8);
    }
}
