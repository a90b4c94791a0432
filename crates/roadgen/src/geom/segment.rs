//! Segment intersection and axis-aligned rectangle tests.
//!
//! Segments are parametrized as `p + t·r` (first) and `q + u·s` (second).
//! General position solves for `(t, u)`; near-parallel pairs fall through to a
//! collinear branch that projects the second segment onto the first and
//! intersects the parameter intervals, so superimposed roads still report a hit.

use nalgebra::Vector2;

use super::{cross, Point, PARALLEL_EPS};

/// How two closed segments meet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Crossing {
    /// A single shared point.
    Point(Point),
    /// Collinear segments sharing a stretch, reported in the first segment's
    /// parameter order: `first` is the overlap point closest to the first
    /// segment's start, `last` the farthest. Equal when they only touch.
    Overlap { first: Point, last: Point },
}

impl Crossing {
    /// The representative point: the crossing itself, or the start of the overlap.
    #[inline]
    pub fn point(&self) -> Point {
        match *self {
            Crossing::Point(p) => p,
            Crossing::Overlap { first, .. } => first,
        }
    }

    /// Length of the shared stretch (zero for point crossings).
    #[inline]
    pub fn overlap_len(&self) -> f64 {
        match *self {
            Crossing::Point(_) => 0.0,
            Crossing::Overlap { first, last } => (last - first).norm(),
        }
    }
}

/// Classify the intersection of segments `p1–p2` and `q1–q2`.
///
/// Returns `None` when they are disjoint or either segment has zero length.
pub fn segment_crossing(p1: Point, p2: Point, q1: Point, q2: Point) -> Option<Crossing> {
    let r = p2 - p1;
    let s = q2 - q1;
    let rr = r.norm_squared();
    let ss = s.norm_squared();
    if rr <= 0.0 || ss <= 0.0 {
        return None;
    }
    let qp = q1 - p1;
    let rxs = cross(r, s);
    let qpxr = cross(qp, r);

    if rxs.abs() <= PARALLEL_EPS * (rr * ss).sqrt() {
        // Parallel: only collinear pairs can meet.
        if qpxr.abs() > PARALLEL_EPS * rr.sqrt() * qp.norm() {
            return None;
        }
        let t0 = qp.dot(&r) / rr;
        let t1 = t0 + s.dot(&r) / rr;
        let (lo, hi) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        if lo > 1.0 || hi < 0.0 {
            return None;
        }
        let first = p1 + r * lo.max(0.0);
        let last = p1 + r * hi.min(1.0);
        return Some(Crossing::Overlap { first, last });
    }

    let t = cross(qp, s) / rxs;
    let u = qpxr / rxs;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(Crossing::Point(p1 + r * t))
    } else {
        None
    }
}

/// Intersection point of two segments, or `None`.
///
/// For collinear overlaps this is the overlap point closest to `p1`.
#[inline]
pub fn intersect_segments(p1: Point, p2: Point, q1: Point, q2: Point) -> Option<Point> {
    segment_crossing(p1, p2, q1, q2).map(|c| c.point())
}

/// Closed axis-aligned rectangle `[min.x, max.x] × [min.y, max.y]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    #[inline]
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Corners in counterclockwise order starting at `min`.
    #[inline]
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }

    /// True if either endpoint lies inside or the segment crosses any side.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        if self.contains(a) || self.contains(b) {
            return true;
        }
        let c = self.corners();
        (0..4).any(|k| segment_crossing(a, b, c[k], c[(k + 1) % 4]).is_some())
    }
}
