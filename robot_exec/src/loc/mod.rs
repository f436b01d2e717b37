//! # Localisation module
//!
//! The robot's belief of where it is. The pose is owned by the robot and only ever changed through
//! the robot's `set_pose` so that the facing line and any visualiser stay in step with it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geom::{unit_vector, Segment};
use util::maths::normalize_angle_deg;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The current pose of the robot in the map frame.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Units: millimeters
    pub x: f64,

    /// Units: millimeters
    pub y: f64,

    /// Heading measured from the positive X axis.
    ///
    /// Units: degrees, always kept in (-180, 180]
    pub heading_deg: f64,

    /// Last known speed. Signed, negative when travelling backwards.
    pub speed: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    pub fn new(x: f64, y: f64, heading_deg: f64) -> Self {
        Self {
            x,
            y,
            heading_deg: normalize_angle_deg(heading_deg),
            speed: 0.0,
        }
    }

    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// The pose reached by rotating by `delta_angle_deg` and then travelling `distance` along the
    /// new heading. Speed is carried over unchanged.
    pub fn displaced(&self, distance: f64, delta_angle_deg: f64) -> Self {
        let heading_deg = normalize_angle_deg(self.heading_deg + delta_angle_deg);
        let p = self.position() + unit_vector(heading_deg) * distance;

        Self {
            x: p.x,
            y: p.y,
            heading_deg,
            speed: self.speed,
        }
    }

    /// Point `distance` ahead of the robot along its heading.
    pub fn ahead(&self, distance: f64) -> Point2<f64> {
        self.position() + unit_vector(self.heading_deg) * distance
    }

    /// Line drawn from the robot along its heading, one robot width long.
    pub fn facing_line(&self, width: f64) -> Segment {
        Segment::from_bearing(self.position(), self.heading_deg, width)
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1} deg)", self.x, self.y, self.heading_deg)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
