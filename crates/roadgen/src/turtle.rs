//! Growth cursors.
//!
//! A turtle is a plain value: branching clones it, so a parent and its child
//! never share state. `phase < 0` marks a highway turtle; `phase >= 0` is a grid
//! turtle at that depth.

use crate::geom::{self, Point};

/// Phase tag of highway turtles.
pub const HIGHWAY_PHASE: i32 = -1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Turtle {
    pub position: Point,
    /// Unit heading.
    pub orientation: Point,
    pub phase: i32,
    /// Grid block length drawn along `step_direction`.
    pub step_length: f64,
    /// Grid cross direction (unit).
    pub step_direction: Point,
    /// Signed degrees this lineage has turned through `rotate_capped`.
    pub rotation_accumulated: f64,
}

impl Turtle {
    pub fn highway(position: Point, orientation: Point) -> Self {
        Self {
            position,
            orientation,
            phase: HIGHWAY_PHASE,
            step_length: 0.0,
            step_direction: orientation,
            rotation_accumulated: 0.0,
        }
    }

    pub fn grid(position: Point, orientation: Point, step_direction: Point, step_length: f64) -> Self {
        Self {
            position,
            orientation,
            phase: 0,
            step_length,
            step_direction,
            rotation_accumulated: 0.0,
        }
    }

    #[inline]
    pub fn is_highway(&self) -> bool {
        self.phase < 0
    }

    /// Translate along the current heading.
    #[inline]
    pub fn move_forward(&mut self, distance: f64) {
        self.position += self.orientation * distance;
    }

    /// Position `distance` ahead without moving.
    #[inline]
    pub fn ahead(&self, distance: f64) -> Point {
        self.position + self.orientation * distance
    }

    /// Rotate the heading counterclockwise by `deg`.
    #[inline]
    pub fn rotate(&mut self, deg: f64) {
        self.orientation = geom::rotate_deg(self.orientation, deg);
    }

    /// Rotate and accumulate, unless the lineage total would reach `cap` degrees
    /// in magnitude; returns whether the turn was taken.
    pub fn rotate_capped(&mut self, deg: f64, cap: f64) -> bool {
        if (self.rotation_accumulated + deg).abs() >= cap {
            return false;
        }
        self.rotate(deg);
        self.rotation_accumulated += deg;
        true
    }

    /// Whether the two heading rays meet ahead of both turtles.
    pub fn will_intersect(&self, other: &Turtle) -> bool {
        let r = self.orientation;
        let s = other.orientation;
        let rxs = geom::cross(r, s);
        if rxs.abs() <= geom::PARALLEL_EPS * r.norm() * s.norm() {
            return false;
        }
        let qp = other.position - self.position;
        let t = geom::cross(qp, s) / rxs;
        let u = geom::cross(qp, r) / rxs;
        t >= 0.0 && u >= 0.0
    }
}
