//! Scripted mock boards and collaborators shared by the robot tests.
//!
//! Each mock keeps its state behind an `Rc<RefCell<_>>` so that tests keep a handle on it after
//! the mock has been boxed and handed over to the robot.

use nalgebra::Point2;
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use super::{Boards, Collaborators, Robot};
use crate::{
    geom::Segment,
    loc::Pose,
    map::{basic::BasicMap, AccessZone, PathPlanner, PointOfInterest, Shape},
    params::RobotParams,
    run_state::StopSignal,
    viz::Visualizer,
};
use comms_if::eqpt::{
    base::{CartesianReport, MovementStatus, MovingBase, PolarProgress},
    panel::ControlPanel,
    sensor::{RangeSensor, SensorBoard},
    Board, BoardRole,
};

// ------------------------------------------------------------------------------------------------
// MOVING BASE
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum BaseCall {
    Connect,
    Disconnect,
    Cartesian(f64, f64, f64, f64),
    Polar(f64, f64, f64),
    Repositioning(f64, f64),
    SetPose(f64, f64, f64),
    EmergencyStop,
    EnableMotion,
}

#[derive(Debug)]
enum Pending {
    Cartesian(CartesianReport),
    Polar(PolarProgress),
}

#[derive(Debug)]
pub struct BaseState {
    pub calls: Vec<BaseCall>,
    pub cartesian: bool,
    pub connect_ok: bool,

    /// Statuses returned by successive polls, `Idle` once exhausted
    pub statuses: VecDeque<MovementStatus>,
    pub status_polls: usize,

    /// Pose reported by the base
    pub pose: CartesianReport,

    /// Progress reported by successive reads during a polar movement
    pub polar_script: VecDeque<PolarProgress>,
    pub progress: PolarProgress,

    /// X, Y and heading error of the base when it completes a Cartesian move
    pub arrival_error: (f64, f64, f64),

    /// Request a stop on the given pose/progress read of a movement
    pub stop_on_tick: Option<(usize, StopSignal)>,
    pub ticks: usize,

    pending: Option<Pending>,
}

pub struct MockBase(pub Rc<RefCell<BaseState>>);

impl Default for BaseState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            cartesian: true,
            connect_ok: true,
            statuses: VecDeque::new(),
            status_polls: 0,
            pose: CartesianReport::default(),
            polar_script: VecDeque::new(),
            progress: PolarProgress::default(),
            arrival_error: (0.0, 0.0, 0.0),
            stop_on_tick: None,
            ticks: 0,
            pending: None,
        }
    }
}

impl BaseState {
    fn start(&mut self, call: BaseCall, pending: Pending) {
        self.calls.push(call);
        self.pending = Some(pending);
        self.progress = PolarProgress::default();
        self.ticks = 0;
    }

    fn tick(&mut self) {
        self.ticks += 1;
        if let Some((n, stop)) = &self.stop_on_tick {
            if *n == self.ticks {
                stop.request_stop();
            }
        }
    }
}

impl Board for MockBase {
    fn name(&self) -> &str {
        "mock base"
    }

    fn role(&self) -> BoardRole {
        BoardRole::MovingBase
    }

    fn connect(&mut self) -> bool {
        let mut s = self.0.borrow_mut();
        s.calls.push(BaseCall::Connect);
        s.connect_ok
    }

    fn disconnect(&mut self) -> bool {
        self.0.borrow_mut().calls.push(BaseCall::Disconnect);
        true
    }
}

impl MovingBase for MockBase {
    fn supports_cartesian_motion(&self) -> bool {
        self.0.borrow().cartesian
    }

    fn issue_cartesian_move(&mut self, x: f64, y: f64, heading_deg: f64, speed: f64) {
        let mut s = self.0.borrow_mut();
        let (dx, dy, dh) = s.arrival_error;
        s.start(
            BaseCall::Cartesian(x, y, heading_deg, speed),
            Pending::Cartesian(CartesianReport {
                x: x + dx,
                y: y + dy,
                heading_deg: heading_deg + dh,
                speed: 0.0,
            }),
        );
    }

    fn issue_polar_move(&mut self, distance: f64, delta_angle_deg: f64, speed: f64) {
        self.0.borrow_mut().start(
            BaseCall::Polar(distance, delta_angle_deg, speed),
            Pending::Polar(PolarProgress {
                distance,
                angle_deg: delta_angle_deg,
                speed: 0.0,
            }),
        );
    }

    fn issue_repositioning_move(&mut self, distance: f64, speed: f64) {
        self.0.borrow_mut().start(
            BaseCall::Repositioning(distance, speed),
            Pending::Polar(PolarProgress {
                distance,
                angle_deg: 0.0,
                speed: 0.0,
            }),
        );
    }

    fn poll_status(&mut self) -> MovementStatus {
        let mut s = self.0.borrow_mut();
        s.status_polls += 1;

        let status = s.statuses.pop_front().unwrap_or(MovementStatus::Idle);

        if status == MovementStatus::Idle {
            let pending = s.pending.take();
            match pending {
                Some(Pending::Cartesian(report)) => s.pose = report,
                Some(Pending::Polar(progress)) => s.progress = progress,
                None => (),
            }
        }

        status
    }

    fn read_cartesian_pose(&mut self) -> CartesianReport {
        let mut s = self.0.borrow_mut();
        s.tick();
        s.pose
    }

    fn read_polar_progress(&mut self) -> PolarProgress {
        let mut s = self.0.borrow_mut();
        s.tick();
        if let Some(p) = s.polar_script.pop_front() {
            s.progress = p;
        }
        s.progress
    }

    fn read_speed(&mut self) -> f64 {
        0.0
    }

    fn set_pose(&mut self, x: f64, y: f64, heading_deg: f64) {
        let mut s = self.0.borrow_mut();
        s.calls.push(BaseCall::SetPose(x, y, heading_deg));
        s.pose = report(x, y, heading_deg);
    }

    fn emergency_stop(&mut self) {
        let mut s = self.0.borrow_mut();
        s.calls.push(BaseCall::EmergencyStop);
        s.pending = None;
    }

    fn enable_motion(&mut self) {
        self.0.borrow_mut().calls.push(BaseCall::EnableMotion);
    }
}

// ------------------------------------------------------------------------------------------------
// SENSORS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SensorState {
    /// (value, valid) written into the sensor of the same index on refresh
    pub readings: Vec<(f64, bool)>,
    pub refreshes: usize,
    pub connected: bool,
}

pub struct MockSensors(pub Rc<RefCell<SensorState>>);

impl Board for MockSensors {
    fn name(&self) -> &str {
        "mock sensors"
    }

    fn role(&self) -> BoardRole {
        BoardRole::CollisionDetector
    }

    fn connect(&mut self) -> bool {
        self.0.borrow_mut().connected = true;
        true
    }

    fn disconnect(&mut self) -> bool {
        self.0.borrow_mut().connected = false;
        true
    }
}

impl SensorBoard for MockSensors {
    fn refresh(&mut self, sensors: &mut [RangeSensor]) {
        let mut s = self.0.borrow_mut();
        s.refreshes += 1;

        for (sensor, (value, valid)) in sensors.iter_mut().zip(s.readings.iter()) {
            sensor.value_mm = *value;
            sensor.valid = *valid;
        }
    }
}

// ------------------------------------------------------------------------------------------------
// CONTROL PANEL
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct PanelState {
    pub connected: bool,
    pub messages: Vec<String>,
    pub score: Option<i64>,

    /// Successive start signal samples, asserted once exhausted
    pub start_signal: VecDeque<bool>,
    pub color: Option<usize>,
}

pub struct MockPanel(pub Rc<RefCell<PanelState>>);

impl Board for MockPanel {
    fn name(&self) -> &str {
        "mock panel"
    }

    fn role(&self) -> BoardRole {
        BoardRole::ControlPanel
    }

    fn connect(&mut self) -> bool {
        self.0.borrow_mut().connected = true;
        true
    }

    fn disconnect(&mut self) -> bool {
        self.0.borrow_mut().connected = false;
        true
    }
}

impl ControlPanel for MockPanel {
    fn start_signal_asserted(&mut self) -> bool {
        self.0.borrow_mut().start_signal.pop_front().unwrap_or(true)
    }

    fn selected_color(&mut self) -> Option<usize> {
        self.0.borrow().color
    }

    fn display_message(&mut self, text: &str) {
        self.0.borrow_mut().messages.push(text.to_string());
    }

    fn set_score(&mut self, score: i64) {
        self.0.borrow_mut().score = Some(score);
    }
}

// ------------------------------------------------------------------------------------------------
// PLANNER
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum PlannerMode {
    /// A single segment from start to end
    Direct,
    Fixed(Vec<Segment>),
    NoRoute,
}

#[derive(Debug)]
pub struct PlannerState {
    pub mode: PlannerMode,
    pub calls: usize,
    pub removed: Vec<String>,
}

pub struct MockPlanner(pub Rc<RefCell<PlannerState>>);

impl PathPlanner for MockPlanner {
    fn find_route(
        &mut self,
        from: Point2<f64>,
        to: Point2<f64>,
        _elements: &[&PointOfInterest],
    ) -> Option<Vec<Segment>> {
        let mut s = self.0.borrow_mut();
        s.calls += 1;

        match &s.mode {
            PlannerMode::Direct => Some(vec![Segment::new(from, to)]),
            PlannerMode::Fixed(route) => Some(route.clone()),
            PlannerMode::NoRoute => None,
        }
    }

    fn on_element_removed(&mut self, element: &PointOfInterest, _remaining: &[&PointOfInterest]) {
        self.0.borrow_mut().removed.push(element.name.clone());
    }
}

// ------------------------------------------------------------------------------------------------
// VISUALISER
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct VizState {
    pub poses: Vec<(Pose, Segment)>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

pub struct MockViz(pub Rc<RefCell<VizState>>);

impl Visualizer for MockViz {
    fn on_pose_changed(&mut self, pose: &Pose, facing_line: &Segment) {
        self.0.borrow_mut().poses.push((*pose, *facing_line));
    }

    fn on_element_added(&mut self, element: &PointOfInterest) {
        self.0.borrow_mut().added.push(element.name.clone());
    }

    fn on_element_removed(&mut self, element: &PointOfInterest) {
        self.0.borrow_mut().removed.push(element.name.clone());
    }
}

// ------------------------------------------------------------------------------------------------
// HARNESS
// ------------------------------------------------------------------------------------------------

/// Handles on the state of every mock given to a robot.
pub struct Harness {
    pub base: Rc<RefCell<BaseState>>,
    pub sensors: Rc<RefCell<SensorState>>,
    pub panel: Rc<RefCell<PanelState>>,
    pub planner: Rc<RefCell<PlannerState>>,
    pub viz: Rc<RefCell<VizState>>,
}

pub fn report(x: f64, y: f64, heading_deg: f64) -> CartesianReport {
    CartesianReport {
        x,
        y,
        heading_deg,
        speed: 0.0,
    }
}

/// Parameters with fast timings, a front and a rear sensor and a few elements.
pub fn test_params() -> RobotParams {
    let mut params = RobotParams::default();

    params.poll_interval_s = 0.001;
    params.sim_step_delay_s = 0.0;
    params.start_signal_poll_s = 0.001;
    params.display_pause_s = 0.0;
    params.recovery.settle_pause_s = 0.0;
    params.variables = vec!["cups".into()];
    params.sensors = vec![
        RangeSensor::new("front", 0.0, 0.0, 0.0),
        RangeSensor::new("rear", 0.0, 0.0, 180.0),
    ];

    let cup = |name: &str, color: &str, x: f64| PointOfInterest {
        name: name.into(),
        element_type: "cup".into(),
        color: color.into(),
        access_zone: Some(AccessZone {
            x,
            y: 1600.0,
            heading_deg: 90.0,
        }),
        avoidance: Shape::Circle {
            x,
            y: 1800.0,
            radius: 40.0,
        },
    };

    params.map.elements = vec![
        cup("cup_yellow", "yellow", 1000.0),
        cup("cup_blue", "blue", 2000.0),
        PointOfInterest {
            name: "buoy".into(),
            element_type: "buoy".into(),
            color: String::new(),
            access_zone: None,
            avoidance: Shape::Circle {
                x: 1500.0,
                y: 1900.0,
                radius: 40.0,
            },
        },
    ];

    params
}

impl Harness {
    pub fn new() -> Self {
        Self {
            base: Rc::new(RefCell::new(BaseState::default())),
            sensors: Rc::new(RefCell::new(SensorState::default())),
            panel: Rc::new(RefCell::new(PanelState::default())),
            planner: Rc::new(RefCell::new(PlannerState {
                mode: PlannerMode::Direct,
                calls: 0,
                removed: Vec::new(),
            })),
            viz: Rc::new(RefCell::new(VizState::default())),
        }
    }

    pub fn boards(&self) -> Boards {
        Boards {
            moving_base: Some(Box::new(MockBase(self.base.clone()))),
            sensors: Some(Box::new(MockSensors(self.sensors.clone()))),
            control_panel: Some(Box::new(MockPanel(self.panel.clone()))),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        let params = test_params();

        Collaborators {
            planner: Box::new(MockPlanner(self.planner.clone())),
            map: Box::new(BasicMap::new(params.map.bounds)),
            visualizer: Some(Box::new(MockViz(self.viz.clone()))),
        }
    }

    pub fn real_robot(&self) -> Robot {
        self.real_robot_with(test_params())
    }

    pub fn real_robot_with(&self, params: RobotParams) -> Robot {
        match Robot::init(
            params,
            self.boards(),
            self.collaborators(),
            StopSignal::new(),
            false,
        ) {
            Ok(r) => r,
            Err(e) => panic!("Robot init failed: {}", e),
        }
    }

    pub fn sim_robot(&self) -> Robot {
        self.sim_robot_with(test_params())
    }

    pub fn sim_robot_with(&self, params: RobotParams) -> Robot {
        match Robot::init(
            params,
            self.boards(),
            self.collaborators(),
            StopSignal::new(),
            true,
        ) {
            Ok(r) => r,
            Err(e) => panic!("Robot init failed: {}", e),
        }
    }

    pub fn base_calls(&self) -> Vec<BaseCall> {
        self.base.borrow().calls.clone()
    }

    /// Calls which move or stop the base.
    pub fn movement_calls(&self) -> Vec<BaseCall> {
        self.base
            .borrow()
            .calls
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    BaseCall::Cartesian(..)
                        | BaseCall::Polar(..)
                        | BaseCall::Repositioning(..)
                        | BaseCall::EmergencyStop
                )
            })
            .cloned()
            .collect()
    }

    pub fn emergency_stops(&self) -> usize {
        self.base
            .borrow()
            .calls
            .iter()
            .filter(|c| **c == BaseCall::EmergencyStop)
            .count()
    }

    pub fn script_statuses(&self, statuses: &[MovementStatus]) {
        self.base.borrow_mut().statuses = statuses.iter().copied().collect();
    }

    pub fn script_polar_progress(&self, progress: &[(f64, f64)]) {
        self.base.borrow_mut().polar_script = progress
            .iter()
            .map(|(distance, angle_deg)| PolarProgress {
                distance: *distance,
                angle_deg: *angle_deg,
                speed: 0.0,
            })
            .collect();
    }

    pub fn stop_on_tick(&self, tick: usize, stop: StopSignal) {
        self.base.borrow_mut().stop_on_tick = Some((tick, stop));
    }

    /// Set the reading the sensor board will report for sensor `index`.
    pub fn set_reading(&self, index: usize, value_mm: f64, valid: bool) {
        let mut s = self.sensors.borrow_mut();
        if s.readings.len() <= index {
            s.readings.resize(index + 1, (0.0, false));
        }
        s.readings[index] = (value_mm, valid);
    }
}
