//! # Match lifecycle
//!
//! Start of match handshake with the control panel, the match clock, the named variables used by
//! game scripts and the pose corrections (wall repositioning, rectification).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::time::Duration;

use super::{MovementOutcome, Robot};
use comms_if::{eqpt::base::MovementRequest, tc::Axis};
use util::time::seconds_since;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// State of the current match.
#[derive(Debug, Clone)]
pub struct MatchState {
    start_time: DateTime<Utc>,

    /// Units: seconds
    duration_s: f64,

    /// Decided once at initialisation
    is_simulated: bool,

    color: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MatchState {
    pub fn new(duration_s: f64, is_simulated: bool) -> Self {
        Self {
            start_time: Utc::now(),
            duration_s,
            is_simulated,
            color: None,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn duration_s(&self) -> f64 {
        self.duration_s
    }

    pub fn is_simulated(&self) -> bool {
        self.is_simulated
    }

    /// Colour the robot plays for, known once the match has started.
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn elapsed_s(&self) -> f64 {
        seconds_since(self.start_time)
    }

    pub fn time_exceeded(&self) -> bool {
        self.elapsed_s() > self.duration_s
    }

    fn restart_clock(&mut self) {
        self.start_time = Utc::now();
    }
}

impl Robot {
    /// Wait for the start of the match.
    ///
    /// In simulation the match starts at once from the preset colour's start position (or the
    /// default one). On real hardware the start signal must be released then asserted again, the
    /// colour selected on the control panel while waiting gives the start position, which is
    /// pushed to the base before motion is enabled.
    ///
    /// Returns false if a stop was requested while waiting.
    pub fn await_start(&mut self) -> bool {
        let index = if self.is_simulated() {
            let preset = self.params.preset_color.clone();
            self.params
                .start_positions
                .iter()
                .position(|p| Some(&p.color) == preset.as_ref())
                .unwrap_or(1)
        } else {
            match self.wait_for_start_signal() {
                Some(i) => i,
                None => return false,
            }
        };

        let start = self.params.start_positions[index].clone();

        self.match_state.color = Some(start.color.clone());
        self.set_pose(start.x, start.y, start.heading_deg);

        if !self.is_simulated() {
            if self.moving_base.supports_cartesian_motion() {
                self.moving_base.set_pose(start.x, start.y, start.heading_deg);
            }

            self.display_message(&format!("Color: {}", start.color));
            std::thread::sleep(Duration::from_secs_f64(self.params.display_pause_s));
            self.display_message("Start");
            self.moving_base.enable_motion();
        }

        self.match_state.restart_clock();

        info!("Match started as {} from {}", start.color, self.pose);

        true
    }

    /// Seconds since the start of the match.
    pub fn elapsed_time(&self) -> f64 {
        self.match_state.elapsed_s()
    }

    /// Show the score on the control panel.
    pub fn display_score(&mut self, score: i64) {
        info!("Score: {}", score);

        if let Some(panel) = self.control_panel.as_mut() {
            panel.set_score(score);
        }
    }

    /// Wait for `duration_ms`. Returns false if a stop was requested during the wait.
    pub fn wait_ms(&mut self, duration_ms: u64) -> bool {
        let end = Utc::now() + chrono::Duration::milliseconds(duration_ms as i64);
        let tick = Duration::from_secs_f64(self.params.poll_interval_s);

        loop {
            if self.stop.stop_requested() {
                return false;
            }

            let remaining = match (end - Utc::now()).to_std() {
                Ok(r) if r > Duration::from_secs(0) => r,
                _ => return true,
            };

            std::thread::sleep(remaining.min(tick));
        }
    }

    // ---- VARIABLES ----

    /// Increment a named variable. Unknown names are reported and change nothing.
    pub fn increment_variable(&mut self, name: &str) -> bool {
        let r = self.variables.increment(name);
        report_variable(name, r)
    }

    pub fn decrement_variable(&mut self, name: &str) -> bool {
        let r = self.variables.decrement(name);
        report_variable(name, r)
    }

    pub fn reset_variable(&mut self, name: &str) -> bool {
        let r = self.variables.reset(name);
        report_variable(name, r)
    }

    pub fn set_variable(&mut self, name: &str, value: i64) -> bool {
        let r = self.variables.set(name, value);
        report_variable(name, r)
    }

    // ---- POSE CORRECTIONS ----

    /// Overwrite the given pose components, pushing the result to a Cartesian base.
    pub fn rectify_position(&mut self, x: Option<f64>, y: Option<f64>, heading_deg: Option<f64>) {
        let x = x.unwrap_or(self.pose.x);
        let y = y.unwrap_or(self.pose.y);
        let heading_deg = heading_deg.unwrap_or(self.pose.heading_deg);

        info!("Rectifying position to ({:.1}, {:.1}, {:.1} deg)", x, y, heading_deg);

        self.set_pose(x, y, heading_deg);

        if !self.is_simulated() && self.moving_base.supports_cartesian_motion() {
            self.moving_base.set_pose(x, y, heading_deg);
        }
    }

    /// Drive against a wall to align with it, then reset the matching pose components.
    ///
    /// The robot is expected to end up stuck against the wall, a movement that completes normally
    /// means the wall was missed and is reported as a failure. `axis` selects which coordinate
    /// `coordinate` sets, `coordinate_2` gives Y when both are set.
    pub fn reposition(
        &mut self,
        distance: f64,
        axis: Axis,
        coordinate: f64,
        heading_deg: f64,
        speed: f64,
        coordinate_2: Option<f64>,
    ) -> bool {
        info!("Repositioning against {:?} = {:.1}", axis, coordinate);

        let mut success = true;

        if !self.is_simulated() {
            let direction = if distance < 0.0 { -1.0 } else { 1.0 };
            let outcome = self.issue_and_wait(
                MovementRequest::Repositioning { distance, speed },
                direction,
                false,
            );

            if outcome != MovementOutcome::Stuck {
                error!(
                    "Repositioning ended with {} instead of being stuck, check the heading",
                    outcome
                );
                success = false;
            }
        }

        let (x, y) = match axis {
            Axis::X => (Some(coordinate), None),
            Axis::Y => (None, Some(coordinate)),
            Axis::XY => (Some(coordinate), coordinate_2.or(Some(self.pose.y))),
        };

        self.rectify_position(x, y, Some(heading_deg));

        success
    }

    // ---- INTERNAL ----

    /// Wait for the start signal to be released then asserted, returning the start position
    /// index, or `None` if a stop was requested.
    fn wait_for_start_signal(&mut self) -> Option<usize> {
        let tick = Duration::from_secs_f64(self.params.start_signal_poll_s);

        self.display_score(0);

        let stop = self.stop.clone();
        let panel = self.control_panel.as_mut()?;

        info!("Waiting for the start signal to be released");
        while panel.start_signal_asserted() {
            if stop.stop_requested() {
                return None;
            }
            std::thread::sleep(tick);
        }

        info!("Waiting for the start signal");
        let mut color: Option<usize> = None;
        while !panel.start_signal_asserted() {
            if stop.stop_requested() {
                return None;
            }

            let selected = panel.selected_color();
            if selected != color {
                info!("Colour selection: {:?}", selected);
                color = selected;
            }

            std::thread::sleep(tick);
        }

        match color {
            Some(i) if i < self.params.start_positions.len() => Some(i),
            Some(i) => {
                warn!("Invalid colour index {}, using the default start position", i);
                Some(1)
            }
            None => {
                warn!("No colour selected, using the default start position");
                Some(1)
            }
        }
    }

    fn display_message(&mut self, text: &str) {
        info!("{}", text);

        if let Some(panel) = self.control_panel.as_mut() {
            panel.display_message(text);
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn report_variable(name: &str, result: Result<i64, crate::variables::VariableError>) -> bool {
    match result {
        Ok(value) => {
            info!("Variable {} = {}", name, value);
            true
        }
        Err(e) => {
            error!("{}", e);
            false
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
    use comms_if::eqpt::base::MovementStatus;

    #[test]
    fn test_await_start_simulated_default() {
        let h = Harness::new();
        let mut robot = h.sim_robot();

        assert!(robot.await_start());

        let start = &test_params().start_positions[1];
        assert_eq!(robot.match_state().color(), Some(start.color.as_str()));
        assert_eq!((robot.pose().x, robot.pose().y), (start.x, start.y));
        assert!(h.base_calls().is_empty());
    }

    #[test]
    fn test_await_start_simulated_preset_color() {
        let h = Harness::new();
        let mut params = test_params();
        params.preset_color = Some(params.start_positions[0].color.clone());
        let mut robot = h.sim_robot_with(params.clone());

        assert!(robot.await_start());

        assert_eq!(
            robot.match_state().color(),
            Some(params.start_positions[0].color.as_str())
        );
        assert_eq!(robot.pose().x, params.start_positions[0].x);
    }

    #[test]
    fn test_await_start_real() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        {
            let mut panel = h.panel.borrow_mut();
            panel.start_signal = vec![true, true, false, false, false, true].into();
            panel.color = Some(0);
        }

        assert!(robot.await_start());

        let start = &test_params().start_positions[0];
        assert_eq!(robot.match_state().color(), Some(start.color.as_str()));
        assert_eq!(
            h.base_calls()[1..],
            [
                BaseCall::SetPose(start.x, start.y, start.heading_deg),
                BaseCall::EnableMotion
            ]
        );
        let panel = h.panel.borrow();
        assert_eq!(panel.score, Some(0));
        assert_eq!(panel.messages.last().map(String::as_str), Some("Start"));
    }

    #[test]
    fn test_await_start_real_without_color_uses_default() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        h.panel.borrow_mut().start_signal = vec![false, false, true].into();

        assert!(robot.await_start());

        let start = &test_params().start_positions[1];
        assert_eq!(robot.match_state().color(), Some(start.color.as_str()));
    }

    #[test]
    fn test_await_start_stopped() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        h.panel.borrow_mut().start_signal = vec![false; 1000].into();
        robot.stop_signal().request_stop();

        assert!(!robot.await_start());
        assert!(!h.base_calls().contains(&BaseCall::EnableMotion));
    }

    #[test]
    fn test_variables() {
        let h = Harness::new();
        let mut robot = h.sim_robot();

        assert!(robot.increment_variable("cups"));
        assert!(robot.increment_variable("cups"));
        assert!(robot.decrement_variable("cups"));
        assert_eq!(robot.variables().get("cups"), Ok(1));
        assert!(robot.set_variable("cups", 5));
        assert!(robot.reset_variable("cups"));
        assert_eq!(robot.variables().get("cups"), Ok(0));

        let before = robot.variables().len();
        assert!(!robot.increment_variable("score"));
        assert_eq!(robot.variables().len(), before);
        assert!(robot.variables().get("score").is_err());
    }

    #[test]
    fn test_wait_ms() {
        let h = Harness::new();
        let mut robot = h.sim_robot();

        assert!(robot.wait_ms(2));

        robot.stop_signal().request_stop();
        assert!(!robot.wait_ms(1000));
    }

    #[test]
    fn test_display_score() {
        let h = Harness::new();
        let mut robot = h.real_robot();

        robot.display_score(42);

        assert_eq!(h.panel.borrow().score, Some(42));
    }

    #[test]
    fn test_rectify_position() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(100.0, 200.0, 0.0);

        robot.rectify_position(None, Some(250.0), Some(90.0));

        assert_eq!(
            (robot.pose().x, robot.pose().y, robot.pose().heading_deg),
            (100.0, 250.0, 90.0)
        );
        assert_eq!(h.base_calls().last(), Some(&BaseCall::SetPose(100.0, 250.0, 90.0)));
    }

    #[test]
    fn test_reposition_expects_stuck() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(500.0, 300.0, -90.0);
        h.script_statuses(&[MovementStatus::Running, MovementStatus::Stuck]);

        assert!(robot.reposition(-400.0, Axis::Y, 120.0, 90.0, 0.2, None));

        assert!(h.movement_calls().contains(&BaseCall::Repositioning(-400.0, 0.2)));
        assert_eq!(robot.pose().y, 120.0);
        assert_eq!(robot.pose().heading_deg, 90.0);
        // Collision checks are disabled against the wall
        assert_eq!(h.sensors.borrow().refreshes, 0);
    }

    #[test]
    fn test_reposition_not_stuck_fails() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(500.0, 300.0, 0.0);

        assert!(!robot.reposition(200.0, Axis::XY, 600.0, 0.0, 0.2, Some(350.0)));

        assert_eq!((robot.pose().x, robot.pose().y), (600.0, 350.0));
    }

    #[test]
    fn test_reposition_simulated_sets_pose() {
        let h = Harness::new();
        let mut robot = h.sim_robot();
        robot.set_pose(500.0, 300.0, 0.0);

        assert!(robot.reposition(200.0, Axis::X, 130.0, 180.0, 0.2, None));

        assert_eq!(
            (robot.pose().x, robot.pose().y, robot.pose().heading_deg),
            (130.0, 300.0, 180.0)
        );
    }
}
