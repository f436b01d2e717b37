//! # Robot library.
//!
//! Motion execution and collision avoidance core of the competition robot. This library allows
//! the executable (and benchmarks) to access items defined inside the robot crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Collision detection - tests range sensor readings against the known map
pub mod collision;

/// Straight segment geometry used for routes and sensor rays
pub mod geom;

/// Localisation - the robot's pose model
pub mod loc;

/// Map module - points of interest and the map/planner collaborator interfaces
pub mod map;

/// Executable parameters
pub mod params;

/// The robot itself - movement execution, completion monitoring, recovery and match lifecycle
pub mod robot;

/// Process wide run/stop signal
pub mod run_state;

/// Simulated moving base used when no hardware is present
pub mod sim_base;

/// Named counters used by game scripts
pub mod variables;

/// Optional visualisation hooks
pub mod viz;
