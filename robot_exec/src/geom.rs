//! # Segment geometry
//!
//! Straight segments in the map frame. Routes returned by the planner, the robot's facing line and
//! sensor rays are all segments.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A directed straight segment between two points of the map frame.
///
/// Units: millimeters
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Segment {
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    pub fn from_coords(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point2::new(x1, y1), Point2::new(x2, y2))
    }

    /// Build the segment leaving `start` along `bearing_deg` for `length`.
    pub fn from_bearing(start: Point2<f64>, bearing_deg: f64, length: f64) -> Self {
        let dir = unit_vector(bearing_deg);
        Self::new(start, start + dir * length)
    }

    pub fn vector(&self) -> Vector2<f64> {
        self.end - self.start
    }

    pub fn length(&self) -> f64 {
        self.vector().norm()
    }

    /// Angle of the segment from the positive X axis, in degrees in (-180, 180].
    ///
    /// A zero length segment has a bearing of 0.
    pub fn bearing_deg(&self) -> f64 {
        let v = self.vector();
        v.y.atan2(v.x).to_degrees()
    }

    /// Point at `ratio` along the segment, 0 being the start and 1 the end.
    pub fn point_at(&self, ratio: f64) -> Point2<f64> {
        self.start + self.vector() * ratio
    }

    /// Shortest distance between the segment and a point.
    pub fn distance_to_point(&self, point: &Point2<f64>) -> f64 {
        let v = self.vector();
        let len_sq = v.norm_squared();

        if len_sq == 0.0 {
            return (point - self.start).norm();
        }

        let t = ((point - self.start).dot(&v) / len_sq).max(0.0).min(1.0);

        (point - self.point_at(t)).norm()
    }

    /// True if the two segments share at least one point.
    pub fn intersects(&self, other: &Segment) -> bool {
        let d1 = orientation(&other.start, &other.end, &self.start);
        let d2 = orientation(&other.start, &other.end, &self.end);
        let d3 = orientation(&self.start, &self.end, &other.start);
        let d4 = orientation(&self.start, &self.end, &other.end);

        if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
            && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
        {
            return true;
        }

        (d1 == 0.0 && on_segment(&other.start, &other.end, &self.start))
            || (d2 == 0.0 && on_segment(&other.start, &other.end, &self.end))
            || (d3 == 0.0 && on_segment(&self.start, &self.end, &other.start))
            || (d4 == 0.0 && on_segment(&self.start, &self.end, &other.end))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Unit vector pointing along `bearing_deg`.
pub fn unit_vector(bearing_deg: f64) -> Vector2<f64> {
    let rad = bearing_deg.to_radians();
    Vector2::new(rad.cos(), rad.sin())
}

/// Cross product sign of (b - a) x (c - a).
fn orientation(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// For a point `p` collinear with `a` and `b`, true if it lies between them.
fn on_segment(a: &Point2<f64>, b: &Point2<f64>, p: &Point2<f64>) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
