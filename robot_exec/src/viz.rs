//! # Visualisation hooks
//!
//! The robot notifies an optional visualiser whenever its pose changes or the element list is
//! modified. Notifications are synchronous and made from the control loop.

use crate::{geom::Segment, loc::Pose, map::PointOfInterest};

pub trait Visualizer {
    /// The robot moved. `facing_line` is drawn from the robot along its heading, one robot width
    /// long.
    fn on_pose_changed(&mut self, pose: &Pose, facing_line: &Segment);

    fn on_element_added(&mut self, element: &PointOfInterest);

    fn on_element_removed(&mut self, element: &PointOfInterest);
}
