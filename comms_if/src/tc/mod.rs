//! # Action module
//!
//! This module defines the actions game scripts can ask the robot to perform. Actions are
//! serialised as JSON objects with a `type` and a `payload`, for example:
//!
//! ```json
//! {"type": "MOVE_TO_XY", "payload": {"x": 500.0, "y": 800.0, "heading_deg": 90.0}}
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Serialize, Deserialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default speed used by the movement actions when none is given.
pub const DEFAULT_SPEED: f64 = 1.0;

/// Default speed of the straight line actions (forward, backward, rotate).
pub const DEFAULT_STRAIGHT_SPEED: f64 = 0.5;

/// Default speed of a repositioning movement.
pub const DEFAULT_REPOSITIONING_SPEED: f64 = 0.2;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An action the robot can execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Travel to an absolute pose, routed around the known elements unless `force_straight`.
    MoveToXy {
        x: f64,
        y: f64,
        heading_deg: f64,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default)]
        force_straight: bool,
    },

    MoveForward {
        distance: f64,
        #[serde(default = "default_straight_speed")]
        speed: f64,
    },

    MoveBackward {
        distance: f64,
        #[serde(default = "default_straight_speed")]
        speed: f64,
    },

    RotateTo {
        heading_deg: f64,
        #[serde(default = "default_straight_speed")]
        speed: f64,
    },

    MoveDistanceAngle {
        distance: f64,
        delta_angle_deg: f64,
        #[serde(default = "default_speed")]
        speed: f64,
    },

    /// Travel to the access zone of the first element of the given type.
    MoveToElement {
        element_type: String,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default)]
        color: Option<String>,
    },

    /// Remove an element from the map, e.g. once it has been collected.
    RemoveElement {
        element_type: String,
        #[serde(default)]
        color: Option<String>,
    },

    /// Drive against a wall to realign a coordinate and the heading.
    Reposition {
        distance: f64,
        axis: Axis,
        coordinate: f64,
        heading_deg: f64,
        #[serde(default = "default_repositioning_speed")]
        speed: f64,
        #[serde(default)]
        coordinate2: Option<f64>,
    },

    /// Overwrite some components of the pose.
    RectifyPosition {
        #[serde(default)]
        x: Option<f64>,
        #[serde(default)]
        y: Option<f64>,
        #[serde(default)]
        heading_deg: Option<f64>,
    },

    /// Escape from an obstacle seen at the given absolute bearing.
    Recover {
        obstacle_angle_deg: f64,
        #[serde(default = "default_direction")]
        direction: f64,
    },

    Wait { duration_ms: u64 },

    IncrementVariable { name: String },

    DecrementVariable { name: String },

    ResetVariable { name: String },

    DisplayScore { score: i64 },
}

/// The axis (or axes) a repositioning movement realigns.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    XY,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum ActionParseError {
    #[error("Action contains invalid JSON or an unknown action type: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Action {
    /// Parse a new action from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, ActionParseError> {
        serde_json::from_str(json_str).map_err(ActionParseError::InvalidJson)
    }

    /// True if the action moves the robot.
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            Action::MoveToXy { .. }
                | Action::MoveForward { .. }
                | Action::MoveBackward { .. }
                | Action::RotateTo { .. }
                | Action::MoveDistanceAngle { .. }
                | Action::MoveToElement { .. }
                | Action::Reposition { .. }
                | Action::Recover { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_straight_speed() -> f64 {
    DEFAULT_STRAIGHT_SPEED
}

fn default_repositioning_speed() -> f64 {
    DEFAULT_REPOSITIONING_SPEED
}

fn default_direction() -> f64 {
    1.0
}
