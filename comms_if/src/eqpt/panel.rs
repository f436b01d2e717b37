//! # Control Panel Interface

use super::Board;

/// The operator control panel: start signal, side colour selector, display and score.
pub trait ControlPanel: Board {
    /// True while the start signal line is asserted.
    fn start_signal_asserted(&mut self) -> bool;

    /// Index of the selected colour (into the configured start positions), if one is selected.
    fn selected_color(&mut self) -> Option<usize>;

    fn display_message(&mut self, text: &str);

    fn set_score(&mut self, score: i64);
}
