//! # Map module
//!
//! The playing area is described by its bounds and a list of points of interest (game elements,
//! fixed obstacles). The robot core does not do any routing or geometry tests itself, it asks two
//! collaborators:
//!
//! - a [`PathPlanner`] which returns a sequence of straight segments between two points,
//! - a [`MapQuery`] which answers containment and intersection questions about the elements.
//!
//! A simple implementation of both is provided in [`basic`].

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod basic;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::Segment;

/// Contact closer than this is not counted by non-strict intersection tests.
///
/// Units: millimeters
pub const TOUCH_TOLERANCE_MM: f64 = 1.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Size of the playing area, which spans `0 < x < width` and `0 < y < length`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width_mm: f64,
    pub length_mm: f64,
}

/// Where the robot must stand to interact with an element.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessZone {
    pub x: f64,
    pub y: f64,
    pub heading_deg: f64,
}

/// A named object on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Unique name of the element
    pub name: String,

    /// Kind of element, for example "cup" or "wall"
    pub element_type: String,

    /// Side colour of the element, empty for neutral elements.
    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub access_zone: Option<AccessZone>,

    /// Region the robot must not drive through.
    pub avoidance: Shape,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Avoidance region of an element.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    Circle {
        x: f64,
        y: f64,
        radius: f64,
    },
    Rect {
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ElementError {
    #[error("No element of type \"{0}\" matching colour \"{1}\"")]
    NotFound(String, String),

    #[error("Element \"{0}\" has no access zone")]
    NoAccessZone(String),
}

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Route finding across the map.
pub trait PathPlanner {
    /// Find a sequence of contiguous segments from `from` to `to` avoiding `elements`.
    ///
    /// `None` means no route exists. An empty route is valid and means no travel is needed.
    fn find_route(
        &mut self,
        from: Point2<f64>,
        to: Point2<f64>,
        elements: &[&PointOfInterest],
    ) -> Option<Vec<Segment>>;

    /// Notify the planner that `element` has been taken off the map. `remaining` holds the
    /// elements still present.
    fn on_element_removed(&mut self, element: &PointOfInterest, remaining: &[&PointOfInterest]);
}

/// Geometric queries against the map elements.
pub trait MapQuery {
    fn bounds(&self) -> MapBounds;

    /// Elements whose avoidance region contains the point.
    fn points_containing<'a>(
        &self,
        point: &Point2<f64>,
        elements: &[&'a PointOfInterest],
    ) -> Vec<&'a PointOfInterest>;

    /// First element whose avoidance region the segment crosses.
    ///
    /// A `strict` test counts any contact, a non-strict test ignores contact shallower than
    /// [`TOUCH_TOLERANCE_MM`].
    fn intersects<'a>(
        &self,
        segment: &Segment,
        elements: &[&'a PointOfInterest],
        strict: bool,
    ) -> Option<&'a PointOfInterest>;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MapBounds {
    /// True if the point lies strictly inside the playing area.
    pub fn contains(&self, point: &Point2<f64>) -> bool {
        0.0 < point.x && point.x < self.width_mm && 0.0 < point.y && point.y < self.length_mm
    }
}

impl PointOfInterest {
    /// True if this element answers a request for `element_type` made by a robot playing `color`.
    ///
    /// Elements of the requested colour match, as do elements which belong to neither side.
    pub fn matches(&self, element_type: &str, color: &str, side_colors: &[&str]) -> bool {
        self.element_type == element_type
            && (self.color == color || !side_colors.contains(&self.color.as_str()))
    }
}

impl Shape {
    /// Grow (or shrink for negative values) the shape by `margin` on every side.
    pub fn inflated(&self, margin: f64) -> Self {
        match *self {
            Shape::Circle { x, y, radius } => Shape::Circle {
                x,
                y,
                radius: (radius + margin).max(0.0),
            },
            Shape::Rect {
                x_min,
                y_min,
                x_max,
                y_max,
            } => Shape::Rect {
                x_min: x_min - margin,
                y_min: y_min - margin,
                x_max: x_max + margin,
                y_max: y_max + margin,
            },
        }
    }

    pub fn contains(&self, point: &Point2<f64>) -> bool {
        match *self {
            Shape::Circle { x, y, radius } => (point - Point2::new(x, y)).norm() <= radius,
            Shape::Rect {
                x_min,
                y_min,
                x_max,
                y_max,
            } => x_min <= point.x && point.x <= x_max && y_min <= point.y && point.y <= y_max,
        }
    }

    /// True if any point of the segment is inside the shape (boundary included).
    pub fn intersects(&self, segment: &Segment) -> bool {
        match *self {
            Shape::Circle { x, y, radius } => {
                segment.distance_to_point(&Point2::new(x, y)) <= radius
            }
            Shape::Rect { .. } => {
                if self.contains(&segment.start) || self.contains(&segment.end) {
                    return true;
                }
                self.edges().iter().any(|e| e.intersects(segment))
            }
        }
    }

    /// Corners of the shape's bounding box.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let (x_min, y_min, x_max, y_max) = match *self {
            Shape::Circle { x, y, radius } => (x - radius, y - radius, x + radius, y + radius),
            Shape::Rect {
                x_min,
                y_min,
                x_max,
                y_max,
            } => (x_min, y_min, x_max, y_max),
        };

        [
            Point2::new(x_min, y_min),
            Point2::new(x_max, y_min),
            Point2::new(x_max, y_max),
            Point2::new(x_min, y_max),
        ]
    }

    fn edges(&self) -> [Segment; 4] {
        let c = self.corners();
        [
            Segment::new(c[0], c[1]),
            Segment::new(c[1], c[2]),
            Segment::new(c[2], c[3]),
            Segment::new(c[3], c[0]),
        ]
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
