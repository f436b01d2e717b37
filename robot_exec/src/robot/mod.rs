//! # Robot
//!
//! The [`Robot`] turns navigation goals ("go to X, Y at heading A", "rotate to A", "advance D")
//! into monitored, interruptible movement commands for the moving base, while checking with the
//! range sensors that the path ahead is clear and that the match is not over.
//!
//! The implementation is split across several files:
//!
//! - `executor.rs` - public movement operations and route following,
//! - `wait.rs` - the state machine monitoring an issued hardware command until it completes,
//! - `recovery.rs` - escape manoeuvre after an obstacle,
//! - `lifecycle.rs` - start of match handshake, match clock, variables and small utilities,
//! - `actions.rs` - script action dispatch and element lookups.
//!
//! When no hardware is available (or simulation is requested) the robot runs against a
//! [`SimulatedBackend`] and drives simulated kinematics itself instead of waiting on the base.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod actions;
mod executor;
mod lifecycle;
mod recovery;
mod wait;

#[cfg(test)]
mod test_support;

pub use lifecycle::MatchState;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{error, info, warn};
use nalgebra::Point2;
use serde::Serialize;
use thiserror::Error;

use crate::{
    collision::{CollisionDetector, Detection},
    geom::Segment,
    loc::Pose,
    map::{MapQuery, PathPlanner, PointOfInterest},
    params::RobotParams,
    run_state::StopSignal,
    sim_base::SimulatedBackend,
    variables::VariableStore,
    viz::Visualizer,
};
use comms_if::eqpt::{
    base::{MovementRequest, MovingBase, PolarProgress},
    panel::ControlPanel,
    sensor::{RangeSensor, SensorBoard},
    Board, BoardRole,
};
use util::{
    archive::{archive_time_s, Archiver},
    maths::{angle_to_reach_deg, normalize_angle_deg},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The boards the robot is built with. Every slot must be filled for the robot to run on real
/// hardware.
#[derive(Default)]
pub struct Boards {
    pub moving_base: Option<Box<dyn MovingBase>>,
    pub sensors: Option<Box<dyn SensorBoard>>,
    pub control_panel: Option<Box<dyn ControlPanel>>,
}

/// External collaborators of the robot.
pub struct Collaborators {
    pub planner: Box<dyn PathPlanner>,
    pub map: Box<dyn MapQuery>,
    pub visualizer: Option<Box<dyn Visualizer>>,
}

pub struct Robot {
    params: RobotParams,

    pose: Pose,

    /// Line from the robot along its heading, kept in step with the pose
    facing_line: Segment,

    sensors: Vec<RangeSensor>,

    moving_base: Box<dyn MovingBase>,
    sensor_board: Option<Box<dyn SensorBoard>>,
    control_panel: Option<Box<dyn ControlPanel>>,

    planner: Box<dyn PathPlanner>,
    map: Box<dyn MapQuery>,
    visualizer: Option<Box<dyn Visualizer>>,

    /// Working list of the elements still on the map
    points_of_interest: Vec<PointOfInterest>,

    detector: CollisionDetector,

    match_state: MatchState,

    stop: StopSignal,

    variables: VariableStore,

    /// Progress reported by the base at the last update of a polar movement. `Some` only while a
    /// polar (or repositioning) command is being monitored.
    polar_tracking: Option<PolarProgress>,

    last_outcome: Option<MovementOutcome>,

    last_failure: Option<MoveFailure>,

    archiver: Option<Archiver>,
}

/// Archived for every movement the robot performs.
#[derive(Debug, Serialize)]
struct MovementRecord {
    time_s: f64,
    simulated: bool,
    kind: &'static str,
    x: Option<f64>,
    y: Option<f64>,
    heading_deg: Option<f64>,
    distance: Option<f64>,
    delta_angle_deg: Option<f64>,
    speed: f64,
    outcome: String,
    end_x: f64,
    end_y: f64,
    end_heading_deg: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Terminal state of a movement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MovementOutcome {
    Success,

    /// An obstacle was seen in the direction of travel. The location is known for unknown objects
    ObstacleDetected(Option<Point2<f64>>),

    /// The base reported it could not complete the movement
    Stuck,

    /// The match ended during the movement
    TimedOut,

    /// A stop was requested during the movement
    Cancelled,
}

/// Why the last movement operation failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoveFailure {
    #[error("No route to ({0:.1}, {1:.1})")]
    NoRoute(f64, f64),

    #[error("Path blocked before moving: {0}")]
    Blocked(Detection),

    #[error("Movement ended with {0}")]
    Outcome(MovementOutcome),

    #[error("Target not reached, robot ended at {0}")]
    NotReached(Pose),
}

#[derive(Debug, Error)]
pub enum RobotError {
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Running on real hardware was requested but the boards could not be found")]
    ModeMismatch,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Robot {
    /// Build the robot.
    ///
    /// Unless `simulate` is set every board is connected. A missing or unreachable board forces
    /// the robot into simulation, which is an error since real hardware was asked for: the
    /// operator is warned on the control panel (if it could be reached) and
    /// [`RobotError::ModeMismatch`] is returned.
    pub fn init(
        params: RobotParams,
        mut boards: Boards,
        collaborators: Collaborators,
        stop: StopSignal,
        simulate: bool,
    ) -> Result<Self, RobotError> {
        info!("Initialising robot \"{}\"", params.name);

        let mut is_simulated = simulate;

        if !simulate {
            let results = [
                connect_board(&mut boards.moving_base, BoardRole::MovingBase),
                connect_board(&mut boards.sensors, BoardRole::CollisionDetector),
                connect_board(&mut boards.control_panel, BoardRole::ControlPanel),
            ];

            for r in results.iter() {
                if let Err(e) = r {
                    error!("{}", e);
                    is_simulated = true;
                }
            }
        }

        if is_simulated != simulate {
            if let Some(panel) = boards.control_panel.as_mut() {
                panel.display_message("ERROR: Boards not found.");
                std::thread::sleep(std::time::Duration::from_secs_f64(params.display_pause_s));
                panel.display_message("Stopping robot...");
            }

            disconnect_board(&mut boards.moving_base);
            disconnect_board(&mut boards.sensors);
            disconnect_board(&mut boards.control_panel);

            return Err(RobotError::ModeMismatch);
        }

        let (moving_base, sensor_board, control_panel): (Box<dyn MovingBase>, _, _) =
            match (is_simulated, boards.moving_base) {
                (false, Some(base)) => (base, boards.sensors, boards.control_panel),
                _ => {
                    info!("Running in simulation");
                    (Box::new(SimulatedBackend::new()), None, None)
                }
            };

        let elements = params.map.elements.clone();
        let start = &params.start_positions[1];
        let pose = Pose::new(start.x, start.y, start.heading_deg);

        let mut robot = Self {
            facing_line: pose.facing_line(params.width_mm),
            pose,
            sensors: params.sensors.clone(),
            moving_base,
            sensor_board,
            control_panel,
            planner: collaborators.planner,
            map: collaborators.map,
            visualizer: collaborators.visualizer,
            points_of_interest: elements,
            detector: CollisionDetector::new(params.collision),
            match_state: MatchState::new(params.match_duration_s, is_simulated),
            stop,
            variables: VariableStore::new(&params.variables),
            polar_tracking: None,
            last_outcome: None,
            last_failure: None,
            archiver: None,
            params,
        };

        if let Some(viz) = robot.visualizer.as_mut() {
            for e in robot.points_of_interest.iter() {
                viz.on_element_added(e);
            }
        }
        robot.set_pose(pose.x, pose.y, pose.heading_deg);

        info!("Robot initialised");

        Ok(robot)
    }

    /// Archive every movement into `archiver`.
    pub fn set_archiver(&mut self, archiver: Archiver) {
        self.archiver = Some(archiver);
    }

    pub fn params(&self) -> &RobotParams {
        &self.params
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn facing_line(&self) -> &Segment {
        &self.facing_line
    }

    pub fn is_simulated(&self) -> bool {
        self.match_state.is_simulated()
    }

    pub fn match_state(&self) -> &MatchState {
        &self.match_state
    }

    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    pub fn points_of_interest(&self) -> &[PointOfInterest] {
        &self.points_of_interest
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Terminal state of the last movement, if any movement was attempted.
    pub fn last_outcome(&self) -> Option<MovementOutcome> {
        self.last_outcome
    }

    /// Reason the last failed movement operation failed.
    pub fn last_failure(&self) -> Option<&MoveFailure> {
        self.last_failure.as_ref()
    }

    // ---- POSE ----

    /// Set the pose of the robot. This is the only place the pose is written.
    pub fn set_pose(&mut self, x: f64, y: f64, heading_deg: f64) {
        self.pose.x = x;
        self.pose.y = y;
        self.pose.heading_deg = normalize_angle_deg(heading_deg);

        self.facing_line = self.pose.facing_line(self.params.width_mm);

        if let Some(viz) = self.visualizer.as_mut() {
            viz.on_pose_changed(&self.pose, &self.facing_line);
        }
    }

    /// Rotate by `delta_angle_deg` then travel `distance` along the new heading.
    pub fn apply_relative_displacement(&mut self, distance: f64, delta_angle_deg: f64) {
        let p = self.pose.displaced(distance, delta_angle_deg);
        self.set_pose(p.x, p.y, p.heading_deg);
    }

    /// Signed rotation, in degrees, that brings the robot's heading onto `target_deg`.
    pub fn angle_to_reach(&self, target_deg: f64) -> f64 {
        angle_to_reach_deg(self.pose.heading_deg, target_deg)
    }

    /// Refresh the pose from the moving base.
    ///
    /// During a polar movement only the progress made since the last update is applied.
    pub fn update_position(&mut self) {
        if self.is_simulated() {
            return;
        }

        if let Some(last) = self.polar_tracking {
            let progress = self.moving_base.read_polar_progress();
            self.apply_relative_displacement(
                progress.distance - last.distance,
                progress.angle_deg - last.angle_deg,
            );
            self.pose.speed = progress.speed;
            self.polar_tracking = Some(progress);
        } else if self.moving_base.supports_cartesian_motion() {
            let report = self.moving_base.read_cartesian_pose();
            self.set_pose(report.x, report.y, report.heading_deg);
            self.pose.speed = report.speed;
        } else {
            self.pose.speed = self.moving_base.read_speed();
        }
    }

    // ---- COLLISIONS ----

    /// Check the range sensors for an obstacle in the direction of travel (positive forwards).
    ///
    /// Always clear in simulation.
    pub fn detect_collision(&mut self, direction: f64) -> Detection {
        if self.is_simulated() {
            return Detection::Clear;
        }

        match self.sensor_board.as_mut() {
            Some(board) => board.refresh(&mut self.sensors),
            None => return Detection::Clear,
        }

        let elements: Vec<&PointOfInterest> = self.points_of_interest.iter().collect();

        self.detector.scan(
            &self.pose,
            direction,
            &self.sensors,
            &elements,
            self.map.as_ref(),
        )
    }

    // ---- INTERNAL ----

    /// Record the outcome of a movement, archiving it if an archiver is attached.
    fn record_outcome(&mut self, request: &MovementRequest, outcome: MovementOutcome) {
        self.last_outcome = Some(outcome);

        if outcome != MovementOutcome::Success {
            self.last_failure = Some(MoveFailure::Outcome(outcome));
        }

        let simulated = self.is_simulated();
        let pose = self.pose;

        if let Some(archiver) = self.archiver.as_mut() {
            let record = MovementRecord::new(request, outcome, &pose, simulated);
            if let Err(e) = archiver.serialise(record) {
                warn!("Could not archive movement: {}", e);
            }
        }
    }
}

impl Drop for Robot {
    fn drop(&mut self) {
        if self.is_simulated() {
            return;
        }

        info!("Closing board connections");

        if !self.moving_base.disconnect() {
            warn!("Could not disconnect from {}", self.moving_base.name());
        }
        disconnect_board(&mut self.sensor_board);
        disconnect_board(&mut self.control_panel);
    }
}

impl MovementRecord {
    fn new(request: &MovementRequest, outcome: MovementOutcome, end: &Pose, simulated: bool) -> Self {
        let mut record = Self {
            time_s: archive_time_s(),
            simulated,
            kind: "",
            x: None,
            y: None,
            heading_deg: None,
            distance: None,
            delta_angle_deg: None,
            speed: request.speed(),
            outcome: outcome.to_string(),
            end_x: end.x,
            end_y: end.y,
            end_heading_deg: end.heading_deg,
        };

        match *request {
            MovementRequest::Cartesian {
                x, y, heading_deg, ..
            } => {
                record.kind = "cartesian";
                record.x = Some(x);
                record.y = Some(y);
                record.heading_deg = Some(heading_deg);
            }
            MovementRequest::Polar {
                distance,
                delta_angle_deg,
                ..
            } => {
                record.kind = "polar";
                record.distance = Some(distance);
                record.delta_angle_deg = Some(delta_angle_deg);
            }
            MovementRequest::Repositioning { distance, .. } => {
                record.kind = "repositioning";
                record.distance = Some(distance);
            }
        }

        record
    }
}

impl std::fmt::Display for MovementOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovementOutcome::Success => write!(f, "success"),
            MovementOutcome::ObstacleDetected(Some(p)) => {
                write!(f, "obstacle detected at ({:.1}, {:.1})", p.x, p.y)
            }
            MovementOutcome::ObstacleDetected(None) => write!(f, "obstacle detected"),
            MovementOutcome::Stuck => write!(f, "stuck"),
            MovementOutcome::TimedOut => write!(f, "match timeout"),
            MovementOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Connect the board in `slot`. A board that can't be reached is dropped from the slot.
fn connect_board<B>(slot: &mut Option<Box<B>>, role: BoardRole) -> Result<(), RobotError>
where
    B: Board + ?Sized,
{
    let board = slot
        .as_mut()
        .ok_or_else(|| RobotError::ConfigurationError(format!("No {} board", role)))?;

    if board.connect() {
        info!("Connected to {} ({})", board.name(), role);
        Ok(())
    } else {
        let msg = format!("Cannot connect to {} ({})", board.name(), role);
        *slot = None;
        Err(RobotError::ConfigurationError(msg))
    }
}

fn disconnect_board<B>(slot: &mut Option<Box<B>>)
where
    B: Board + ?Sized,
{
    if let Some(board) = slot.as_mut() {
        if !board.disconnect() {
            warn!("Could not disconnect from {}", board.name());
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_init_real() {
        let h = Harness::new();
        let robot = h.real_robot();

        assert!(!robot.is_simulated());
        assert!(h.base_calls().contains(&BaseCall::Connect));
        assert!(h.panel.borrow().connected);
    }

    #[test]
    fn test_init_missing_board_is_mode_mismatch() {
        let h = Harness::new();
        let mut boards = h.boards();
        boards.sensors = None;

        let r = Robot::init(
            test_params(),
            boards,
            h.collaborators(),
            StopSignal::new(),
            false,
        );

        assert!(matches!(r, Err(RobotError::ModeMismatch)));
        let panel = h.panel.borrow();
        assert_eq!(
            panel.messages,
            vec!["ERROR: Boards not found.".to_string(), "Stopping robot...".to_string()]
        );
        // Connected boards are released again
        assert!(h.base_calls().contains(&BaseCall::Disconnect));
    }

    #[test]
    fn test_init_simulated_ignores_boards() {
        let h = Harness::new();
        let robot = h.sim_robot();

        assert!(robot.is_simulated());
        assert!(h.base_calls().is_empty());
    }

    #[test]
    fn test_drop_disconnects_boards() {
        let h = Harness::new();
        let robot = h.real_robot();
        drop(robot);

        assert!(h.base_calls().contains(&BaseCall::Disconnect));
        assert!(!h.panel.borrow().connected);
    }

    #[test]
    fn test_simulation_drives_cartesian_stand_in() {
        let h = Harness::new();
        // A polar-only base is replaced by the simulated backend
        h.base.borrow_mut().cartesian = false;
        let mut robot = h.sim_robot();
        robot.set_pose(1000.0, 1000.0, 0.0);

        assert!(robot.move_distance_angle(100.0, 90.0, 0.5));

        assert!((robot.pose().x - 1000.0).abs() < 1e-9);
        assert!((robot.pose().y - 1100.0).abs() < 1e-9);
        assert_eq!(robot.pose().heading_deg, 90.0);
        assert!(h.base_calls().is_empty());
        assert_eq!(robot.last_outcome(), Some(MovementOutcome::Success));
    }

    #[test]
    fn test_set_pose_notifies_visualizer() {
        let h = Harness::new();
        let mut robot = h.sim_robot();
        h.viz.borrow_mut().poses.clear();

        robot.set_pose(100.0, 200.0, 270.0);

        assert_eq!(robot.pose().heading_deg, -90.0);
        let viz = h.viz.borrow();
        assert_eq!(viz.poses.len(), 1);
        let (pose, line) = viz.poses[0];
        assert_eq!(pose.heading_deg, -90.0);
        assert!((line.length() - robot.params().width_mm).abs() < 1e-9);
        assert!((line.end.y - (200.0 - robot.params().width_mm)).abs() < 1e-9);
    }

    #[test]
    fn test_elements_announced_to_visualizer() {
        let h = Harness::new();
        let robot = h.sim_robot();

        assert_eq!(h.viz.borrow().added.len(), robot.points_of_interest().len());
    }

    #[test]
    fn test_apply_relative_displacement() {
        let h = Harness::new();
        let mut robot = h.sim_robot();
        robot.set_pose(0.0, 0.0, 170.0);

        robot.apply_relative_displacement(100.0, 20.0);

        assert_eq!(robot.pose().heading_deg, -170.0);
        assert!((robot.pose().x - 100.0 * 190f64.to_radians().cos()).abs() < 1e-9);
        assert!((robot.pose().y - 100.0 * 190f64.to_radians().sin()).abs() < 1e-9);
    }

    #[test]
    fn test_angle_to_reach_round_trip() {
        let h = Harness::new();
        let mut robot = h.sim_robot();

        for heading in &[-170.0, -45.0, 0.0, 90.0, 180.0] {
            for target in &[-179.0, -90.0, 0.0, 135.0, 180.0, 400.0] {
                robot.set_pose(0.0, 0.0, *heading);
                let delta = robot.angle_to_reach(*target);
                assert_eq!(
                    normalize_angle_deg(robot.pose().heading_deg + delta),
                    normalize_angle_deg(*target)
                );
            }
        }
    }

    #[test]
    fn test_detect_collision_simulated_is_clear() {
        let h = Harness::new();
        let mut robot = h.sim_robot();
        robot.set_pose(1000.0, 1000.0, 0.0);
        h.set_reading(0, 50.0, true);

        assert_eq!(robot.detect_collision(1.0), Detection::Clear);
        assert_eq!(h.sensors.borrow().refreshes, 0);
    }

    #[test]
    fn test_detect_collision_real_refreshes_sensors() {
        let h = Harness::new();
        let mut robot = h.real_robot();
        robot.set_pose(1000.0, 1000.0, 0.0);
        h.set_reading(0, 50.0, true);

        let d = robot.detect_collision(1.0);

        assert_eq!(h.sensors.borrow().refreshes, 1);
        assert_eq!(d.location(), Some(Point2::new(1062.5, 1000.0)));
    }
}
