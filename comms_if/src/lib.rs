//! # Communications interface crate.
//!
//! Provides the contracts between the robot core and the boards it drives, and the command set
//! used by game scripts.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Script commands (actions) the robot can execute
pub mod tc;

/// Interfaces and data definitions for equipment (moving base, sensors, control panel)
pub mod eqpt;
