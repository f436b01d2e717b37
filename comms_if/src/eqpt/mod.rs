//! # Equipment Interface
//!
//! This module defines the interfaces the robot core uses to talk to its boards. The wire
//! protocol behind each board is the board implementation's business, the core only ever sees
//! these traits.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod base;
pub mod panel;
pub mod sensor;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Common behaviour of every board attached to the robot.
pub trait Board {
    /// Human readable name of the board, used in logs.
    fn name(&self) -> &str;

    /// The role the board fulfils for the robot.
    fn role(&self) -> BoardRole;

    /// Open the connection to the board, returning `true` on success.
    fn connect(&mut self) -> bool;

    /// Close the connection to the board.
    fn disconnect(&mut self) -> bool;
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// The roles a board can play. Each role is required for the robot to run on real hardware.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum BoardRole {
    MovingBase,
    CollisionDetector,
    ControlPanel,
}

impl std::fmt::Display for BoardRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardRole::MovingBase => write!(f, "movingBase"),
            BoardRole::CollisionDetector => write!(f, "collisionDetector"),
            BoardRole::ControlPanel => write!(f, "controlPanel"),
        }
    }
}
