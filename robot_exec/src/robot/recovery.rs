//! # Obstacle recovery
//!
//! Escape manoeuvre used by game logic after a movement ended on an obstacle. The default
//! [`RecoveryPolicy::Reverse`] simply backs off along the current heading. The
//! [`RecoveryPolicy::Search`] policy looks for an escape direction away from the obstacle which
//! crosses no known element.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use std::time::Duration;

use super::Robot;
use crate::{geom::Segment, map::PointOfInterest, params::RecoveryPolicy};
use util::maths::normalize_angle_deg;

/// Escape lengths tried by the search policy, longest first.
///
/// Units: millimeters
const SEARCH_LENGTHS_MM: [f64; 3] = [400.0, 300.0, 250.0];

/// Largest deviation from the direction opposite the obstacle tried by the search policy.
///
/// Units: degrees
const SEARCH_MAX_OFFSET_DEG: u32 = 40;

const SEARCH_OFFSET_STEP_DEG: usize = 10;

/// Speed of the escape move found by the search policy.
const SEARCH_SPEED: f64 = 0.2;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Robot {
    /// Escape from an obstacle seen at the absolute bearing `obstacle_angle_deg`.
    ///
    /// `direction` is the direction the robot was travelling in when it saw the obstacle (positive
    /// forwards), the escape goes the other way. Returns true if the escape move succeeded.
    pub fn recover(&mut self, obstacle_angle_deg: f64, direction: f64) -> bool {
        let opposite_deg = normalize_angle_deg(obstacle_angle_deg + 180.0);

        info!(
            "Recovering from obstacle at {:.1} deg, escaping towards {:.1} deg",
            obstacle_angle_deg, opposite_deg
        );

        match self.params.recovery.policy {
            RecoveryPolicy::Reverse => self.recover_reverse(direction),
            RecoveryPolicy::Search => self.recover_search(opposite_deg, direction),
        }
    }

    /// Back off along the current heading, whatever the obstacle's bearing.
    fn recover_reverse(&mut self, direction: f64) -> bool {
        let distance = -direction * self.params.recovery.escape_length_mm;
        let pause = Duration::from_secs_f64(self.params.recovery.settle_pause_s);
        let speed = self.params.recovery.speed;

        std::thread::sleep(pause);
        let ok = self.move_distance_angle(distance, 0.0, speed);
        std::thread::sleep(pause);

        if !ok {
            warn!("Escape move failed");
        }

        ok
    }

    fn recover_search(&mut self, opposite_deg: f64, direction: f64) -> bool {
        let start = self.pose.position();

        // Elements the robot is already in can't be escaped from
        let all: Vec<&PointOfInterest> = self.points_of_interest.iter().collect();
        let containing = self.map.points_containing(&start, &all);
        let elements: Vec<&PointOfInterest> = all
            .iter()
            .filter(|e| !containing.iter().any(|c| c.name == e.name))
            .copied()
            .collect();

        let mut escape = None;

        'search: for length in SEARCH_LENGTHS_MM.iter() {
            for offset in (0..=SEARCH_MAX_OFFSET_DEG).step_by(SEARCH_OFFSET_STEP_DEG) {
                for side in &[-1.0, 1.0] {
                    let candidate = Segment::from_bearing(
                        start,
                        opposite_deg + side * f64::from(offset),
                        *length,
                    );

                    if self.map.intersects(&candidate, &elements, false).is_none() {
                        escape = Some(candidate);
                        break 'search;
                    }
                }
            }
        }

        let escape = match escape {
            Some(e) => e,
            None => {
                warn!("No escape direction found");
                return false;
            }
        };

        // The robot backs out along the escape line
        let mut turn = self.angle_to_reach(escape.bearing_deg());
        turn += if turn > 0.0 { -180.0 } else { 180.0 };
        let distance = -direction * escape.length();

        info!("Escaping {:.1} mm after turning {:.1} deg", distance, turn);

        self.move_distance_angle(distance, turn, SEARCH_SPEED)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
