//! # Action dispatch
//!
//! Executes the actions of game scripts and provides the element based operations.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, error, info};

use super::Robot;
use crate::map::{ElementError, PointOfInterest};
use comms_if::tc::Action;

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Robot {
    /// Execute a single action, returning true on success.
    pub fn execute(&mut self, action: &Action) -> bool {
        debug!("Executing {:?}", action);

        match action {
            Action::MoveToXy {
                x,
                y,
                heading_deg,
                speed,
                force_straight,
            } => self.move_to_xy(*x, *y, *heading_deg, *speed, *force_straight),
            Action::MoveForward { distance, speed } => self.move_forward(*distance, *speed),
            Action::MoveBackward { distance, speed } => self.move_backward(*distance, *speed),
            Action::RotateTo { heading_deg, speed } => self.rotate_to(*heading_deg, *speed),
            Action::MoveDistanceAngle {
                distance,
                delta_angle_deg,
                speed,
            } => self.move_distance_angle(*distance, *delta_angle_deg, *speed),
            Action::MoveToElement {
                element_type,
                speed,
                color,
            } => self.move_to_element(element_type, *speed, color.as_deref()),
            Action::RemoveElement {
                element_type,
                color,
            } => self.remove_element(element_type, color.as_deref()),
            Action::Reposition {
                distance,
                axis,
                coordinate,
                heading_deg,
                speed,
                coordinate2,
            } => self.reposition(
                *distance,
                *axis,
                *coordinate,
                *heading_deg,
                *speed,
                *coordinate2,
            ),
            Action::RectifyPosition { x, y, heading_deg } => {
                self.rectify_position(*x, *y, *heading_deg);
                true
            }
            Action::Recover {
                obstacle_angle_deg,
                direction,
            } => self.recover(*obstacle_angle_deg, *direction),
            Action::Wait { duration_ms } => self.wait_ms(*duration_ms),
            Action::IncrementVariable { name } => self.increment_variable(name),
            Action::DecrementVariable { name } => self.decrement_variable(name),
            Action::ResetVariable { name } => self.reset_variable(name),
            Action::DisplayScore { score } => {
                self.display_score(*score);
                true
            }
        }
    }

    /// Travel to the access zone of the first element of `element_type` belonging to `color`
    /// (the robot's colour if not given) or to neither side.
    pub fn move_to_element(&mut self, element_type: &str, speed: f64, color: Option<&str>) -> bool {
        let zone = match self.find_element(element_type, color) {
            Ok(e) => e.access_zone.ok_or_else(|| ElementError::NoAccessZone(e.name.clone())),
            Err(e) => Err(e),
        };

        match zone {
            Ok(zone) => self.move_to_xy(zone.x, zone.y, zone.heading_deg, speed, false),
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    /// Take the first matching element off the map. Nothing to remove is not an error.
    pub fn remove_element(&mut self, element_type: &str, color: Option<&str>) -> bool {
        let name = match self.find_element(element_type, color) {
            Ok(e) => e.name.clone(),
            Err(e) => {
                info!("{}, nothing to remove", e);
                return true;
            }
        };

        let index = match self.points_of_interest.iter().position(|e| e.name == name) {
            Some(i) => i,
            None => return true,
        };
        let element = self.points_of_interest.remove(index);

        let remaining: Vec<&PointOfInterest> = self.points_of_interest.iter().collect();
        self.planner.on_element_removed(&element, &remaining);

        if let Some(viz) = self.visualizer.as_mut() {
            viz.on_element_removed(&element);
        }

        info!("Removed element \"{}\"", element.name);

        true
    }

    fn find_element(
        &self,
        element_type: &str,
        color: Option<&str>,
    ) -> Result<&PointOfInterest, ElementError> {
        let color = color
            .or_else(|| self.match_state.color())
            .unwrap_or_default();
        let sides = self.params.side_colors();

        self.points_of_interest
            .iter()
            .find(|e| e.matches(element_type, color, &sides))
            .ok_or_else(|| ElementError::NotFound(element_type.to_string(), color.to_string()))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
