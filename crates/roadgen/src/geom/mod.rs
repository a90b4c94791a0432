//! Plane geometry for road segments in city space.
//!
//! Purpose
//! - Point arithmetic, headings and rotations, segment–segment intersection
//!   with an explicit collinear-overlap branch, and segment–rectangle tests used
//!   by the cell index.
//!
//! Conventions
//! - Points and directions are `nalgebra::Vector2<f64>`; angles are in degrees,
//!   counterclockwise positive.
//! - Equality of positions is always tolerance-based (`approx_eq`), never exact.
//!
//! Code cross-refs: `segment::{segment_crossing,intersect_segments}`, `Rect`,
//! `crate::cells::CellIndex::cells_for_segment`.

mod cfg;
mod segment;

use nalgebra::{Rotation2, Vector2};

pub use cfg::{NODE_EPS, PARALLEL_EPS};
pub use segment::{intersect_segments, segment_crossing, Crossing, Rect};

/// A position or direction in city space.
pub type Point = Vector2<f64>;

#[inline]
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).norm()
}

#[inline]
pub fn midpoint(a: Point, b: Point) -> Point {
    (a + b) * 0.5
}

/// Unit vector pointing from `a` to `b`; `None` for coincident points.
#[inline]
pub fn direction(a: Point, b: Point) -> Option<Point> {
    normalize(b - a)
}

/// Unit vector along `v`; `None` if `v` is zero or not finite.
#[inline]
pub fn normalize(v: Point) -> Option<Point> {
    let n = v.norm();
    if !n.is_finite() || n <= 0.0 {
        return None;
    }
    Some(v / n)
}

/// Rotate `v` counterclockwise by `deg` degrees.
#[inline]
pub fn rotate_deg(v: Point, deg: f64) -> Point {
    Rotation2::new(deg.to_radians()) * v
}

/// `v` turned 90° counterclockwise.
#[inline]
pub fn perpendicular(v: Point) -> Point {
    Vector2::new(-v.y, v.x)
}

/// Unit heading for a compass angle (0° = +x, counterclockwise).
#[inline]
pub fn heading_deg(deg: f64) -> Point {
    let rad = deg.to_radians();
    Vector2::new(rad.cos(), rad.sin())
}

/// Angle in degrees between two directions, in `[0, 180]`.
pub fn angle_between_deg(a: Point, b: Point) -> f64 {
    let denom = a.norm() * b.norm();
    if denom <= 0.0 {
        return 0.0;
    }
    (a.dot(&b) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle in degrees between the lines spanned by `a` and `b`, in `[0, 90]`.
/// Orientation is ignored, so `a` and `-a` describe the same line.
pub fn line_angle_deg(a: Point, b: Point) -> f64 {
    let denom = a.norm() * b.norm();
    if denom <= 0.0 {
        return 0.0;
    }
    (a.dot(&b).abs() / denom).clamp(0.0, 1.0).acos().to_degrees()
}

/// Per-axis tolerance equality.
#[inline]
pub fn approx_eq(a: Point, b: Point, eps: f64) -> bool {
    (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps
}

#[inline]
pub(crate) fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}
