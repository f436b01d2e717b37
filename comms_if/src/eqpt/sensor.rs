//! # Range Sensor Interface

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::Board;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A range sensor (telemeter) mounted on the robot.
///
/// The mounting position is given in the robot frame, `mount_y_mm` along the facing direction and
/// `mount_x_mm` across it (positive to the left). The reading is written by the sensor board on
/// each refresh and is read-only to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSensor {
    pub name: String,

    pub mount_x_mm: f64,

    pub mount_y_mm: f64,

    /// Direction the sensor looks in, relative to the robot heading, in degrees.
    pub mount_angle_deg: f64,

    /// Last measured distance.
    #[serde(default)]
    pub value_mm: f64,

    /// True if the last measurement is usable.
    #[serde(default)]
    pub valid: bool,
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The board the range sensors are attached to.
pub trait SensorBoard: Board {
    /// Populate the `value_mm`/`valid` fields of every sensor in place.
    fn refresh(&mut self, sensors: &mut [RangeSensor]);
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RangeSensor {
    pub fn new(name: &str, mount_x_mm: f64, mount_y_mm: f64, mount_angle_deg: f64) -> Self {
        Self {
            name: name.to_string(),
            mount_x_mm,
            mount_y_mm,
            mount_angle_deg,
            value_mm: 0.0,
            valid: false,
        }
    }

    /// True if the sensor looks broadly forwards, i.e. within `half_fov_deg` of the heading.
    pub fn is_front_facing(&self, half_fov_deg: f64) -> bool {
        -half_fov_deg < self.mount_angle_deg && self.mount_angle_deg < half_fov_deg
    }
}
