//! Main robot executable entry point.
//!
//! # Usage
//!
//! ```text
//! robot_exec <params> [script] [--simulate]
//! ```
//!
//! - `params` - parameter file, relative to `$ROBOT_SW_ROOT/params`
//! - `script` - optional action script executed once the match has started
//! - `--simulate` - run without hardware
//!
//! # Architecture
//!
//! The executable:
//!
//!     - Initialises the session, logger and parameters
//!     - Builds the robot with its boards, planner and map
//!     - Waits for the start of the match
//!     - Main loop:
//!         - Releases the script actions whose time has come
//!         - Executes them in order on the robot
//!     - Stops at the end of the script, the end of the match or on a stop request

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::env;
use std::thread;
use std::time::Duration;

// Internal
use robot_lib::{
    map::basic::{BasicMap, DetourPlanner, DetourPlannerParams},
    params::RobotParams,
    robot::{Boards, Collaborators, Robot},
    run_state::StopSignal,
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    script_interpreter::{PendingActions, ScriptInterpreter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period at which the script is checked for new actions.
const CYCLE_PERIOD_S: f64 = 0.05;

const USAGE: &str = "robot_exec <params> [script] [--simulate]";

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session =
        Session::new("robot_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Info, &session).wrap_err("Failed to initialise logging")?;

    info!("Robot Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- COMMAND LINE ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let simulate = args.iter().skip(1).any(|a| a == "--simulate");
    let positional: Vec<&str> = args
        .iter()
        .skip(1)
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .collect();

    let (params_path, script_path) = match positional.as_slice() {
        [p] => (*p, None),
        [p, s] => (*p, Some(*s)),
        _ => return Err(eyre!("Usage: {}", USAGE)),
    };

    // ---- LOAD PARAMETERS ----

    let params: RobotParams =
        util::params::load(params_path).wrap_err("Could not load the robot parameters")?;

    info!("Parameters loaded for \"{}\"", params.name);

    let mut script = match script_path {
        Some(path) => {
            info!("Loading script from \"{}\"", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} actions\n",
                si.get_duration(),
                si.get_num_actions()
            );

            Some(si)
        }
        None => None,
    };

    // ---- INITIALISE ROBOT ----

    let collaborators = Collaborators {
        planner: Box::new(DetourPlanner::new(DetourPlannerParams {
            bounds: params.map.bounds,
            clearance_mm: params.map.clearance_mm,
        })),
        map: Box::new(BasicMap::new(params.map.bounds)),
        visualizer: None,
    };

    // Board drivers register themselves here, none are built into this executable
    let boards = Boards::default();

    let stop = StopSignal::new();

    let mut robot = Robot::init(params, boards, collaborators, stop.clone(), simulate)
        .wrap_err("Failed to initialise the robot")?;

    match Archiver::from_path(&session, "movements.csv") {
        Ok(a) => robot.set_archiver(a),
        Err(e) => warn!("Movements will not be archived: {}", e),
    }

    // ---- MATCH ----

    if !robot.await_start() {
        info!("Stopped before the start of the match");
        return Ok(());
    }

    let cycle_period = Duration::from_secs_f64(CYCLE_PERIOD_S);

    loop {
        if stop.stop_requested() {
            info!("Stop requested");
            break;
        }

        if robot.match_state().time_exceeded() {
            info!("End of match");
            stop.request_stop();
            break;
        }

        match script.as_mut() {
            Some(si) => match si.get_pending_actions(robot.elapsed_time()) {
                PendingActions::None => (),
                PendingActions::Some(actions) => {
                    for action in actions.iter() {
                        if !robot.execute(action) {
                            warn!("Action failed: {:?}", action);
                        }
                    }
                }
                PendingActions::EndOfScript => {
                    info!("End of script");
                    break;
                }
            },
            None => {
                info!("No script to run");
                break;
            }
        }

        thread::sleep(cycle_period);
    }

    info!("Final pose: {}", robot.pose());
    info!("End of execution");

    Ok(())
}
