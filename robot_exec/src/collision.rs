//! # Collision detection
//!
//! Each range sensor reading is turned into a ray in the map frame and tested against the known
//! elements. A reading which no known element explains is an unknown object and the robot must
//! stop. A reading explained by a known element is reported but, unless configured otherwise, the
//! robot carries on since its route already avoids that element.
//!
//! Only sensors looking in the direction of travel are considered: front facing sensors when
//! moving forwards, the others when moving backwards.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace, warn};
use nalgebra::{Point2, Vector2};

use crate::{
    geom::Segment,
    loc::Pose,
    map::{MapQuery, PointOfInterest},
    params::CollisionParams,
};
use comms_if::eqpt::sensor::RangeSensor;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Tests sensor readings against the map.
#[derive(Debug, Clone)]
pub struct CollisionDetector {
    params: CollisionParams,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of a collision check.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// Nothing actionable was seen
    Clear,

    /// A sensor saw something that a known element explains
    Explained { sensor: String, element: String },

    /// A sensor saw an object that is not on the map, located at `point`
    Unknown { sensor: String, point: Point2<f64> },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Detection {
    /// True if this detection must stop the robot.
    pub fn is_blocking(&self, stop_on_known_elements: bool) -> bool {
        match self {
            Detection::Clear => false,
            Detection::Explained { .. } => stop_on_known_elements,
            Detection::Unknown { .. } => true,
        }
    }

    /// Location of the detected object, only known for unknown objects.
    pub fn location(&self) -> Option<Point2<f64>> {
        match self {
            Detection::Unknown { point, .. } => Some(*point),
            _ => None,
        }
    }
}

impl std::fmt::Display for Detection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detection::Clear => write!(f, "clear"),
            Detection::Explained { sensor, element } => {
                write!(f, "{} sees known element \"{}\"", sensor, element)
            }
            Detection::Unknown { sensor, point } => write!(
                f,
                "{} sees unknown object at ({:.1}, {:.1})",
                sensor, point.x, point.y
            ),
        }
    }
}

impl CollisionDetector {
    pub fn new(params: CollisionParams) -> Self {
        Self { params }
    }

    pub fn stop_on_known_elements(&self) -> bool {
        self.params.stop_on_known_elements
    }

    /// Compute the ray a sensor reading represents, in the map frame.
    ///
    /// The mount offset is given in the robot frame (`mount_y_mm` forward, `mount_x_mm` to the
    /// left) and is rotated by the robot heading. The ray looks along the heading plus the mount
    /// angle and is extended past the reading by the configured factor.
    pub fn sensor_ray(&self, pose: &Pose, sensor: &RangeSensor) -> Segment {
        let (sin_h, cos_h) = pose.heading_deg.to_radians().sin_cos();
        let offset = Vector2::new(
            sensor.mount_y_mm * cos_h - sensor.mount_x_mm * sin_h,
            sensor.mount_y_mm * sin_h + sensor.mount_x_mm * cos_h,
        );

        Segment::from_bearing(
            pose.position() + offset,
            pose.heading_deg + sensor.mount_angle_deg,
            self.params.ray_extension * sensor.value_mm,
        )
    }

    /// Check the already refreshed `sensors` for an obstacle in the direction of travel.
    ///
    /// `direction` is positive when moving forwards and negative when moving backwards. The first
    /// unknown object found is returned immediately, otherwise the last explained reading (if
    /// any) is returned.
    pub fn scan(
        &self,
        pose: &Pose,
        direction: f64,
        sensors: &[RangeSensor],
        elements: &[&PointOfInterest],
        map: &dyn MapQuery,
    ) -> Detection {
        let bounds = map.bounds();
        let mut result = Detection::Clear;

        for sensor in sensors.iter().filter(|s| s.valid) {
            let front = sensor.is_front_facing(self.params.front_half_fov_deg);
            if (direction < 0.0 && front) || (direction >= 0.0 && !front) {
                continue;
            }

            let ray = self.sensor_ray(pose, sensor);

            // Rays leaving the map see the arena border
            if !bounds.contains(&ray.end) {
                trace!("{}: ray ends outside of the map", sensor.name);
                continue;
            }

            if sensor.value_mm <= self.params.min_range_mm
                || sensor.value_mm >= self.params.max_range_mm
            {
                continue;
            }

            debug!(
                "{}: {:.0} mm, ray from ({:.1}, {:.1}) to ({:.1}, {:.1})",
                sensor.name, sensor.value_mm, ray.start.x, ray.start.y, ray.end.x, ray.end.y
            );

            // Elements the sensor itself sits in can't be what it sees
            let containing = map.points_containing(&ray.start, elements);
            let candidates: Vec<&PointOfInterest> = elements
                .iter()
                .filter(|e| !containing.iter().any(|c| c.name == e.name))
                .copied()
                .collect();

            match map.intersects(&ray, &candidates, true) {
                Some(element) => {
                    debug!("{}: obstacle is known element \"{}\"", sensor.name, element.name);
                    result = Detection::Explained {
                        sensor: sensor.name.clone(),
                        element: element.name.clone(),
                    };
                }
                None => {
                    warn!(
                        "{}: unknown object at ({:.1}, {:.1})",
                        sensor.name, ray.end.x, ray.end.y
                    );
                    return Detection::Unknown {
                        sensor: sensor.name.clone(),
                        point: ray.end,
                    };
                }
            }
        }

        result
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
