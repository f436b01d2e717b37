//! # Movement completion monitoring
//!
//! Once a command has been issued to the moving base the robot polls it at a fixed interval until
//! the command reaches a terminal state. Each tick, in order:
//!
//! 1. refresh the pose from the base,
//! 2. stop requested: emergency stop, `Cancelled`,
//! 3. unless the command is a pure rotation, check the range sensors: emergency stop on a
//!    blocking detection, `ObstacleDetected`,
//! 4. match time exhausted: emergency stop, `TimedOut`,
//! 5. poll the base: still running continues, stuck gives an emergency stop and `Stuck`,
//!    anything else is `Success`.
//!
//! Whatever the terminal state the pose is reconciled with the base one last time.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, warn};
use std::time::Duration;

use super::{MovementOutcome, Robot};
use comms_if::eqpt::base::{MovementRequest, MovementStatus};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Robot {
    /// Issue `request` to the moving base and monitor it until it completes.
    ///
    /// `direction` is the direction of travel (positive forwards) used to select the range
    /// sensors. Collision checks are skipped when `check_collisions` is false or the request is a
    /// pure rotation.
    pub(super) fn issue_and_wait(
        &mut self,
        request: MovementRequest,
        direction: f64,
        check_collisions: bool,
    ) -> MovementOutcome {
        debug!("Issuing {:?}", request);

        self.polar_tracking = if request.is_cartesian() {
            None
        } else {
            Some(Default::default())
        };

        self.moving_base.issue(&request);

        let outcome = self.wait_for_movement(&request, direction, check_collisions);

        // Last reconciliation with the base
        self.update_position();
        self.polar_tracking = None;

        self.record_outcome(&request, outcome);

        outcome
    }

    fn wait_for_movement(
        &mut self,
        request: &MovementRequest,
        direction: f64,
        check_collisions: bool,
    ) -> MovementOutcome {
        let poll_interval = Duration::from_secs_f64(self.params.poll_interval_s);
        let check_collisions = check_collisions && !request.is_rotation_only();

        loop {
            std::thread::sleep(poll_interval);

            self.update_position();

            if self.stop.stop_requested() {
                warn!("Stop requested, stopping the robot");
                self.moving_base.emergency_stop();
                return MovementOutcome::Cancelled;
            }

            if check_collisions {
                let detection = self.detect_collision(direction);

                if detection.is_blocking(self.detector.stop_on_known_elements()) {
                    warn!("Obstacle: {}, stopping the robot", detection);
                    self.moving_base.emergency_stop();
                    return MovementOutcome::ObstacleDetected(detection.location());
                }
            }

            if self.match_state.time_exceeded() {
                warn!("End of match, stopping the robot");
                self.moving_base.emergency_stop();
                return MovementOutcome::TimedOut;
            }

            match self.moving_base.poll_status() {
                MovementStatus::Running => (),
                MovementStatus::Stuck => {
                    error!("The robot is stuck");
                    self.moving_base.emergency_stop();
                    return MovementOutcome::Stuck;
                }
                MovementStatus::Idle => return MovementOutcome::Success,
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::super::test_support::*;
    use super::*;

    fn cartesian(x: f64, y: f64) -> MovementRequest {
        MovementRequest::Cartesian {
            x,
            y,
            heading_deg: 0.0,
            speed: 0.5,
        }
    }

    #[test]
    fn test_success_reconciles_pose() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(500.0, 500.0, 0.0);
        h.base.borrow_mut().pose = report(500.0, 500.0, 0.0);
        h.script_statuses(&[MovementStatus::Running, MovementStatus::Running]);

        let outcome = robot.issue_and_wait(cartesian(800.0, 500.0), 1.0, true);

        assert_eq!(outcome, MovementOutcome::Success);
        assert_eq!(robot.last_outcome(), Some(MovementOutcome::Success));
        assert_eq!((robot.pose().x, robot.pose().y), (800.0, 500.0));
        assert_eq!(h.emergency_stops(), 0);
    }

    #[test]
    fn test_stop_on_tick_is_cancelled() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(500.0, 500.0, 0.0);
        h.script_statuses(&[MovementStatus::Running; 10]);
        h.stop_on_tick(3, robot.stop_signal().clone());

        let outcome = robot.issue_and_wait(cartesian(800.0, 500.0), 1.0, true);

        assert_eq!(outcome, MovementOutcome::Cancelled);
        assert_eq!(h.emergency_stops(), 1);
        // The base was polled on the two ticks before the stop
        assert_eq!(h.base.borrow().status_polls, 2);
    }

    #[test]
    fn test_cancel_wins_over_obstacle_and_timeout() {
        let h = Harness::new();
        let mut params = test_params();
        params.match_duration_s = 0.0;
        let mut robot = h.real_robot_with(params);
        robot.set_pose(1000.0, 1000.0, 0.0);
        h.base.borrow_mut().pose = report(1000.0, 1000.0, 0.0);
        h.set_reading(0, 50.0, true);
        h.script_statuses(&[MovementStatus::Running; 10]);
        robot.stop_signal().request_stop();

        let outcome = robot.issue_and_wait(cartesian(1300.0, 1000.0), 1.0, true);

        assert_eq!(outcome, MovementOutcome::Cancelled);
        assert_eq!(h.emergency_stops(), 1);
    }

    #[test]
    fn test_match_budget_exhausted_times_out() {
        let h = Harness::new();
        let mut params = test_params();
        params.match_duration_s = 0.0;
        let mut robot = h.real_robot_with(params);
        h.script_statuses(&[MovementStatus::Running; 10]);

        let outcome = robot.issue_and_wait(cartesian(800.0, 500.0), 1.0, true);

        assert_eq!(outcome, MovementOutcome::TimedOut);
        assert_eq!(h.emergency_stops(), 1);
        assert_eq!(h.base.borrow().status_polls, 0);
    }

    #[test]
    fn test_unknown_obstacle_stops() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        h.base.borrow_mut().pose = report(1000.0, 1000.0, 0.0);
        h.set_reading(0, 50.0, true);
        h.script_statuses(&[MovementStatus::Running; 10]);

        let outcome = robot.issue_and_wait(cartesian(1300.0, 1000.0), 1.0, true);

        assert_eq!(
            outcome,
            MovementOutcome::ObstacleDetected(Some(nalgebra::Point2::new(1062.5, 1000.0)))
        );
        assert_eq!(h.emergency_stops(), 1);
    }

    #[test]
    fn test_rotation_skips_collision_checks() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        h.base.borrow_mut().pose = report(1000.0, 1000.0, 0.0);
        h.set_reading(0, 50.0, true);
        h.script_statuses(&[MovementStatus::Running]);

        let outcome = robot.issue_and_wait(
            MovementRequest::Polar {
                distance: 0.0,
                delta_angle_deg: 90.0,
                speed: 0.5,
            },
            1.0,
            true,
        );

        assert_eq!(outcome, MovementOutcome::Success);
        assert_eq!(h.sensors.borrow().refreshes, 0);
    }

    #[test]
    fn test_stuck() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        h.script_statuses(&[MovementStatus::Running, MovementStatus::Stuck]);

        let outcome = robot.issue_and_wait(cartesian(800.0, 500.0), 1.0, true);

        assert_eq!(outcome, MovementOutcome::Stuck);
        assert_eq!(h.emergency_stops(), 1);
    }

    #[test]
    fn test_polar_progress_applied_once() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(500.0, 500.0, 0.0);
        // The base reports accumulated progress while running, then the full move
        h.script_polar_progress(&[(50.0, 0.0), (150.0, 0.0)]);
        h.script_statuses(&[MovementStatus::Running, MovementStatus::Running]);

        let outcome = robot.issue_and_wait(
            MovementRequest::Polar {
                distance: 200.0,
                delta_angle_deg: 0.0,
                speed: 0.5,
            },
            1.0,
            true,
        );

        assert_eq!(outcome, MovementOutcome::Success);
        assert!((robot.pose().x - 700.0).abs() < 1e-9);
        assert!((robot.pose().y - 500.0).abs() < 1e-9);
    }
}
