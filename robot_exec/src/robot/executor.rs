//! # Path following
//!
//! Public movement operations of the robot. Every goal ends up in [`Robot::move_to_xy`], which
//! gets a route from the planner and drives it one segment at a time. Bases supporting Cartesian
//! motion are sent one absolute target per segment, the others a turn and travel polar command.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info, warn};
use nalgebra::Point2;
use std::time::Duration;

use super::{MoveFailure, MovementOutcome, Robot};
use crate::{geom::Segment, map::PointOfInterest};
use comms_if::eqpt::base::MovementRequest;
use util::maths::normalize_angle_deg;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Robot {
    /// Move to (`x`, `y`) and end facing `heading_deg`.
    ///
    /// Unless `force_straight` is set the route is asked from the planner. On real hardware the
    /// final pose must be within the configured tolerances of the target.
    pub fn move_to_xy(
        &mut self,
        x: f64,
        y: f64,
        heading_deg: f64,
        speed: f64,
        force_straight: bool,
    ) -> bool {
        self.update_position();

        let from = self.pose.position();
        let to = Point2::new(x, y);

        info!(
            "Moving from {} to ({:.1}, {:.1}, {:.1} deg)",
            self.pose, x, y, heading_deg
        );

        let route = if force_straight {
            Some(vec![Segment::new(from, to)])
        } else {
            let elements: Vec<&PointOfInterest> = self.points_of_interest.iter().collect();
            self.planner.find_route(from, to, &elements)
        };

        let mut route = match route {
            Some(r) => r,
            None => {
                error!("No route found to ({:.1}, {:.1})", x, y);
                self.last_failure = Some(MoveFailure::NoRoute(x, y));
                return false;
            }
        };

        // Nothing to travel, the final heading must still be applied
        if route.is_empty() {
            route.push(Segment::new(from, to));
        }

        let cartesian = self.moving_base.supports_cartesian_motion();
        let num_segments = route.len();

        for (i, segment) in route.iter().enumerate() {
            // Drive into the next segment's bearing to avoid stopping to rotate in between
            let segment_heading = match route.get(i + 1) {
                Some(next) => next.bearing_deg(),
                None => heading_deg,
            };

            debug!(
                "Segment {}/{}: to ({:.1}, {:.1}), length {:.1}",
                i + 1,
                num_segments,
                segment.end.x,
                segment.end.y,
                segment.length()
            );

            let ok = if cartesian {
                self.follow_segment(segment, segment_heading, speed)
            } else {
                self.follow_segment_polar(segment, speed)
            };

            if !ok {
                warn!("Segment {}/{} failed", i + 1, num_segments);
                return false;
            }
        }

        if !cartesian {
            let delta = self.angle_to_reach(heading_deg);
            if delta != 0.0 && !self.move_distance_angle(0.0, delta, speed) {
                return false;
            }
        }

        if self.is_simulated() {
            return true;
        }

        self.update_position();

        if self.position_reached(x, y, heading_deg) {
            true
        } else {
            warn!(
                "Target ({:.1}, {:.1}, {:.1} deg) not reached, robot is at {}",
                x, y, heading_deg, self.pose
            );
            self.last_failure = Some(MoveFailure::NotReached(self.pose));
            false
        }
    }

    /// Rotate by `delta_angle_deg` then travel `distance` (negative is backwards).
    pub fn move_distance_angle(&mut self, distance: f64, delta_angle_deg: f64, speed: f64) -> bool {
        if self.moving_base.supports_cartesian_motion() {
            self.update_position();
            let target = self.pose.displaced(distance, delta_angle_deg);
            return self.move_to_xy(target.x, target.y, target.heading_deg, speed, false);
        }

        let direction = if distance < 0.0 { -1.0 } else { 1.0 };

        if distance != 0.0 && !self.path_clear(direction) {
            return false;
        }

        let outcome = self.issue_and_wait(
            MovementRequest::Polar {
                distance,
                delta_angle_deg,
                speed,
            },
            direction,
            true,
        );

        outcome == MovementOutcome::Success
    }

    /// Travel straight ahead by `distance`.
    pub fn move_forward(&mut self, distance: f64, speed: f64) -> bool {
        self.update_position();
        let target = self.pose.ahead(distance);
        let heading = self.pose.heading_deg;

        self.move_to_xy(target.x, target.y, heading, speed, true)
    }

    /// Travel straight backwards by `distance`.
    pub fn move_backward(&mut self, distance: f64, speed: f64) -> bool {
        self.move_forward(-distance, speed)
    }

    /// Turn on the spot to face `heading_deg`.
    pub fn rotate_to(&mut self, heading_deg: f64, speed: f64) -> bool {
        self.update_position();
        let (x, y) = (self.pose.x, self.pose.y);

        self.move_to_xy(x, y, heading_deg, speed, false)
    }

    /// True if the robot is within the position and heading tolerances of the target.
    ///
    /// The position tolerance applies to each axis separately.
    pub fn position_reached(&self, x: f64, y: f64, heading_deg: f64) -> bool {
        let tolerance = self.params.position_tolerance_mm;
        let heading_error = normalize_angle_deg(self.pose.heading_deg - heading_deg).abs();

        (self.pose.x - x).abs() <= tolerance
            && (self.pose.y - y).abs() <= tolerance
            && heading_error <= self.params.heading_tolerance_deg
    }

    // ---- INTERNAL ----

    /// Drive one segment with an absolute Cartesian target.
    fn follow_segment(&mut self, segment: &Segment, heading_deg: f64, speed: f64) -> bool {
        let travel = Segment::new(self.pose.position(), segment.end);
        let rotation_only = travel.length() == 0.0;

        let direction =
            if normalize_angle_deg(travel.bearing_deg() - self.pose.heading_deg).abs() > 90.0 {
                -1.0
            } else {
                1.0
            };

        if !rotation_only && !self.path_clear(direction) {
            return false;
        }

        let request = MovementRequest::Cartesian {
            x: segment.end.x,
            y: segment.end.y,
            heading_deg,
            speed,
        };

        if self.is_simulated() {
            return self.simulate_movement(&request, direction);
        }

        self.issue_and_wait(request, direction, !rotation_only) == MovementOutcome::Success
    }

    /// Drive one segment as a turn then travel polar command.
    fn follow_segment_polar(&mut self, segment: &Segment, speed: f64) -> bool {
        if segment.length() == 0.0 {
            return true;
        }

        let turn = self.angle_to_reach(segment.bearing_deg());
        self.move_distance_angle(segment.length(), turn, speed)
    }

    /// Check the sensors before moving, recording the failure if the path is blocked.
    fn path_clear(&mut self, direction: f64) -> bool {
        let detection = self.detect_collision(direction);

        if detection.is_blocking(self.detector.stop_on_known_elements()) {
            warn!("Path blocked: {}", detection);
            self.last_outcome = Some(MovementOutcome::ObstacleDetected(detection.location()));
            self.last_failure = Some(MoveFailure::Blocked(detection));
            false
        } else {
            true
        }
    }

    /// Move the simulated robot along a straight line to the request's target, one millimeter
    /// per step, then snap to the target and requested heading.
    fn simulate_movement(&mut self, request: &MovementRequest, direction: f64) -> bool {
        let (target, heading_deg) = match *request {
            MovementRequest::Cartesian {
                x, y, heading_deg, ..
            } => (Point2::new(x, y), heading_deg),
            _ => return false,
        };

        let travel = Segment::new(self.pose.position(), target);
        let length = travel.length();
        let moving_heading = if direction < 0.0 {
            normalize_angle_deg(travel.bearing_deg() + 180.0)
        } else {
            travel.bearing_deg()
        };
        let step_delay = Duration::from_secs_f64(self.params.sim_step_delay_s);
        let num_steps = length.floor() as usize;

        self.pose.speed = request.speed() * direction;

        for step in 0..=num_steps {
            if self.stop.stop_requested() {
                warn!("Stop requested, simulated movement abandoned at {}", self.pose);
                self.pose.speed = 0.0;
                self.record_outcome(request, MovementOutcome::Cancelled);
                return false;
            }

            if step == num_steps {
                break;
            }

            let p = travel.point_at(step as f64 / length);
            self.set_pose(p.x, p.y, moving_heading);

            std::thread::sleep(step_delay);
        }

        self.set_pose(target.x, target.y, heading_deg);
        self.pose.speed = 0.0;
        self.record_outcome(request, MovementOutcome::Success);

        true
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
