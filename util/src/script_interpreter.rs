//! # Robot script interpreter module
//!
//! This module provides an interpreter for robot game scripts, releasing
//! actions once the match clock has passed their timestamp.
//!
//! A script is a list of `<time_s>: <action json>;` entries, for example
//!
//! ```text
//! 0.0: {"type": "MOVE_FORWARD", "payload": {"distance": 300.0}};
//! 0.0: {"type": "INCREMENT_VARIABLE", "payload": {"name": "cubes"}};
//! 45.0: {"type": "MOVE_TO_ELEMENT", "payload": {"element_type": "base"}};
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::tc::{Action, ActionParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An action which is scripted to start no earlier than a given match time.
#[derive(Debug)]
pub struct Command {
    /// The match time the action may start at
    exec_time_s: f64,

    /// The action to run
    action: Action
}

/// A script interpreter.
///
/// After loading a script use `.get_pending_actions` with the current match
/// time to acquire the list of actions that need executing.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: Option<PathBuf>,
    cmds: VecDeque<Command>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid action at {0} s: {1}")]
    InvalidAction(f64, ActionParseError)
}

#[derive(Debug, PartialEq)]
pub enum PendingActions {
    None,
    Some(Vec<Action>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.display().to_string()));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        let mut si = Self::from_script(&script)?;
        si._script_path = Some(path);

        Ok(si)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of commands
        let mut cmd_queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is valid");

        for cap in re.captures_iter(script) {
            // Both groups are mandatory in the regex so always present
            let (time_str, payload) = match (cap.get(1), cap.get(3)) {
                (Some(t), Some(p)) => (t.as_str(), p.as_str()),
                _ => continue
            };

            // Parse the exec time
            let exec_time_s: f64 = time_str.parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            // Parse the action from the payload. The scripts contain JSON only.
            let action = Action::from_json(payload)
                .map_err(|e| ScriptError::InvalidAction(exec_time_s, e))?;

            cmd_queue.push_back(Command {
                exec_time_s,
                action
            });
        }

        if cmd_queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            _script_path: None,
            cmds: cmd_queue
        })
    }

    /// Return the actions whose start time has been reached at `current_time_s`.
    ///
    /// Actions are released in script order: an action with an earlier
    /// timestamp placed after a later one waits for the later one.
    pub fn get_pending_actions(&mut self, current_time_s: f64) -> PendingActions {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingActions::EndOfScript
        }

        let mut actions: Vec<Action> = vec![];

        // Pop items from the queue while the head's exec time has passed.
        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s > current_time_s {
                break;
            }

            if let Some(cmd) = self.cmds.pop_front() {
                actions.push(cmd.action);
            }
        }

        if actions.is_empty() {
            PendingActions::None
        }
        else {
            PendingActions::Some(actions)
        }
    }

    /// Get the number of actions remaining in the script
    pub fn get_num_actions(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }
}
