//! # Robot Executable Parameters
//!
//! This module provides the parameters for the robot executable, loaded from
//! `params/robot_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::map::{MapBounds, PointOfInterest};
use comms_if::eqpt::sensor::RangeSensor;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotParams {
    /// Name of the robot, shown in logs
    pub name: String,

    /// Width of the robot, used as the length of its facing line.
    ///
    /// Units: millimeters
    pub width_mm: f64,

    /// Duration of a match, after which all movements are stopped.
    ///
    /// Units: seconds
    pub match_duration_s: f64,

    /// Period at which a running movement is monitored.
    ///
    /// Units: seconds
    pub poll_interval_s: f64,

    /// Delay between two steps of a simulated movement.
    ///
    /// Units: seconds
    pub sim_step_delay_s: f64,

    /// Period at which the start signal is sampled while waiting for the match to start.
    ///
    /// Units: seconds
    pub start_signal_poll_s: f64,

    /// Pause after showing a message on the control panel.
    ///
    /// Units: seconds
    pub display_pause_s: f64,

    /// Maximum distance between the end pose and the target for a movement to succeed.
    ///
    /// Units: millimeters
    pub position_tolerance_mm: f64,

    /// Maximum heading difference between the end pose and the target for a movement to succeed.
    ///
    /// Units: degrees
    pub heading_tolerance_deg: f64,

    /// Colour to play in simulation. If not set the default start position is used.
    #[serde(default)]
    pub preset_color: Option<String>,

    /// The two start positions, one per side colour. Index 1 is the default.
    pub start_positions: [StartPosition; 2],

    /// Names of the counters available to game scripts
    #[serde(default)]
    pub variables: Vec<String>,

    #[serde(default)]
    pub sensors: Vec<RangeSensor>,

    pub collision: CollisionParams,

    pub recovery: RecoveryParams,

    pub map: MapParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPosition {
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct CollisionParams {
    /// Readings at or below this distance are sensor noise.
    ///
    /// Units: millimeters
    pub min_range_mm: f64,

    /// Readings at or above this distance are not acted on.
    ///
    /// Units: millimeters
    pub max_range_mm: f64,

    /// Factor applied to the reading to get the length of the ray tested against the map.
    pub ray_extension: f64,

    /// Sensors mounted within this angle of the heading look forwards.
    ///
    /// Units: degrees
    pub front_half_fov_deg: f64,

    /// If true, readings explained by a known element also stop the robot.
    #[serde(default)]
    pub stop_on_known_elements: bool,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct RecoveryParams {
    pub policy: RecoveryPolicy,

    /// Length of the escape move.
    ///
    /// Units: millimeters
    pub escape_length_mm: f64,

    /// Speed of the escape move.
    pub speed: f64,

    /// Pause before and after the escape move.
    ///
    /// Units: seconds
    pub settle_pause_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapParams {
    pub bounds: MapBounds,

    /// Clearance kept between planned routes and the elements.
    ///
    /// Units: millimeters
    pub clearance_mm: f64,

    #[serde(default)]
    pub elements: Vec<PointOfInterest>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How the robot escapes from an obstacle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum RecoveryPolicy {
    /// Back straight off along the current heading
    Reverse,

    /// Search for an escape direction that crosses no known element
    Search,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for CollisionParams {
    fn default() -> Self {
        Self {
            min_range_mm: 5.0,
            max_range_mm: 500.0,
            ray_extension: 1.25,
            front_half_fov_deg: 80.0,
            stop_on_known_elements: false,
        }
    }
}

impl Default for RecoveryParams {
    fn default() -> Self {
        Self {
            policy: RecoveryPolicy::Reverse,
            escape_length_mm: 300.0,
            speed: 0.4,
            settle_pause_s: 0.2,
        }
    }
}

impl Default for RobotParams {
    fn default() -> Self {
        Self {
            name: String::from("robot"),
            width_mm: 250.0,
            match_duration_s: 100.0,
            poll_interval_s: 0.1,
            sim_step_delay_s: 0.002,
            start_signal_poll_s: 0.2,
            display_pause_s: 0.2,
            position_tolerance_mm: 50.0,
            heading_tolerance_deg: 5.0,
            preset_color: None,
            start_positions: [
                StartPosition {
                    color: String::from("yellow"),
                    x: 250.0,
                    y: 1000.0,
                    heading_deg: 0.0,
                },
                StartPosition {
                    color: String::from("blue"),
                    x: 2750.0,
                    y: 1000.0,
                    heading_deg: 180.0,
                },
            ],
            variables: Vec::new(),
            sensors: Vec::new(),
            collision: CollisionParams::default(),
            recovery: RecoveryParams::default(),
            map: MapParams {
                bounds: MapBounds {
                    width_mm: 3000.0,
                    length_mm: 2000.0,
                },
                clearance_mm: 150.0,
                elements: Vec::new(),
            },
        }
    }
}

impl RobotParams {
    /// The two side colours.
    pub fn side_colors(&self) -> [&str; 2] {
        [
            self.start_positions[0].color.as_str(),
            self.start_positions[1].color.as_str(),
        ]
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
