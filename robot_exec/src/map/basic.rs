//! # Basic map implementations
//!
//! [`BasicMap`] answers map queries straight from the elements' avoidance shapes. [`DetourPlanner`]
//! is a small planner which drives straight when it can and otherwise tries detours through one
//! or two points just outside the corners of the elements. It is enough for scripted matches and
//! tests, a full visibility graph planner can be plugged in through [`PathPlanner`].

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use nalgebra::Point2;
use serde::Deserialize;

use super::{MapBounds, MapQuery, PathPlanner, PointOfInterest, TOUCH_TOLERANCE_MM};
use crate::geom::Segment;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Map queries computed directly from the element shapes.
#[derive(Debug, Clone)]
pub struct BasicMap {
    bounds: MapBounds,
}

/// Straight line planner with corner detours.
#[derive(Debug, Clone)]
pub struct DetourPlanner {
    params: DetourPlannerParams,
}

#[derive(Debug, Copy, Clone, Deserialize)]
pub struct DetourPlannerParams {
    pub bounds: MapBounds,

    /// Clearance kept between the robot's path and element shapes.
    ///
    /// Units: millimeters
    pub clearance_mm: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl BasicMap {
    pub fn new(bounds: MapBounds) -> Self {
        Self { bounds }
    }
}

impl MapQuery for BasicMap {
    fn bounds(&self) -> MapBounds {
        self.bounds
    }

    fn points_containing<'a>(
        &self,
        point: &Point2<f64>,
        elements: &[&'a PointOfInterest],
    ) -> Vec<&'a PointOfInterest> {
        elements
            .iter()
            .filter(|e| e.avoidance.contains(point))
            .copied()
            .collect()
    }

    fn intersects<'a>(
        &self,
        segment: &Segment,
        elements: &[&'a PointOfInterest],
        strict: bool,
    ) -> Option<&'a PointOfInterest> {
        elements
            .iter()
            .find(|e| {
                if strict {
                    e.avoidance.intersects(segment)
                } else {
                    e.avoidance.inflated(-TOUCH_TOLERANCE_MM).intersects(segment)
                }
            })
            .copied()
    }
}

impl DetourPlanner {
    pub fn new(params: DetourPlannerParams) -> Self {
        Self { params }
    }

    /// True if the segment stays inside the map and clear of every element, ignoring the elements
    /// in `ignored`.
    fn is_clear(
        &self,
        segment: &Segment,
        elements: &[&PointOfInterest],
        ignored: &[&PointOfInterest],
    ) -> bool {
        let inside = |p: &Point2<f64>| {
            0.0 <= p.x
                && p.x <= self.params.bounds.width_mm
                && 0.0 <= p.y
                && p.y <= self.params.bounds.length_mm
        };

        if !inside(&segment.start) || !inside(&segment.end) {
            return false;
        }

        elements
            .iter()
            .filter(|e| !ignored.iter().any(|i| i.name == e.name))
            .all(|e| {
                !e.avoidance
                    .inflated(self.params.clearance_mm)
                    .intersects(segment)
            })
    }
}

impl PathPlanner for DetourPlanner {
    fn find_route(
        &mut self,
        from: Point2<f64>,
        to: Point2<f64>,
        elements: &[&PointOfInterest],
    ) -> Option<Vec<Segment>> {
        // Elements the robot is already inside of (or is asked to drive into) can't be avoided
        let ignored: Vec<&PointOfInterest> = elements
            .iter()
            .filter(|e| {
                let inflated = e.avoidance.inflated(self.params.clearance_mm);
                inflated.contains(&from) || inflated.contains(&to)
            })
            .copied()
            .collect();

        let direct = Segment::new(from, to);
        if self.is_clear(&direct, elements, &ignored) {
            return Some(vec![direct]);
        }

        // Candidate detour points just outside each element's corners, closest total length first
        let margin = self.params.clearance_mm + TOUCH_TOLERANCE_MM;
        let mut candidates: Vec<Point2<f64>> = elements
            .iter()
            .flat_map(|e| e.avoidance.inflated(margin).corners().to_vec())
            .collect();

        candidates.sort_by(|a, b| {
            let la = (a - from).norm() + (to - a).norm();
            let lb = (b - from).norm() + (to - b).norm();
            la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
        });

        let clear = |route: &[Segment]| route.iter().all(|s| self.is_clear(s, elements, &ignored));

        for waypoint in candidates.iter() {
            let route = [Segment::new(from, *waypoint), Segment::new(*waypoint, to)];

            if clear(&route) {
                debug!("Detouring via ({:.1}, {:.1})", waypoint.x, waypoint.y);
                return Some(route.to_vec());
            }
        }

        // Going round the far side of an element needs two of its corners
        for a in candidates.iter() {
            for b in candidates.iter().filter(|b| *b != a) {
                let route = [
                    Segment::new(from, *a),
                    Segment::new(*a, *b),
                    Segment::new(*b, to),
                ];

                if clear(&route) {
                    debug!(
                        "Detouring via ({:.1}, {:.1}) and ({:.1}, {:.1})",
                        a.x, a.y, b.x, b.y
                    );
                    return Some(route.to_vec());
                }
            }
        }

        None
    }

    fn on_element_removed(&mut self, element: &PointOfInterest, remaining: &[&PointOfInterest]) {
        // Routes are computed from the live element list, nothing is cached
        debug!(
            "Planner notified of removal of \"{}\", {} elements remain",
            element.name,
            remaining.len()
        );
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
