use serde::{Deserialize, Serialize};

use crate::geom::{self, segment_crossing, Crossing, Point, Rect};

use super::EdgeId;

/// Road class of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadKind {
    Highway,
    Street,
}

impl RoadKind {
    #[inline]
    pub fn is_highway(self) -> bool {
        matches!(self, RoadKind::Highway)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoadKind::Highway => "highway",
            RoadKind::Street => "street",
        }
    }
}

/// Directed road segment from `endpoint1` to `endpoint2`.
///
/// Invariants:
/// - Accepted edges never have coincident endpoints.
/// - `endpoint2` and `expandable` change only while the edge is a proposal in
///   the repair pipeline; once the index accepts it, it is immutable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub endpoint1: Point,
    pub endpoint2: Point,
    pub kind: RoadKind,
    /// Cleared once the far end was snapped onto existing infrastructure.
    pub expandable: bool,
}

impl Edge {
    /// A fresh proposal; the id stays `EdgeId::PENDING` until accepted.
    #[inline]
    pub fn new(endpoint1: Point, endpoint2: Point, kind: RoadKind) -> Self {
        Self {
            id: EdgeId::PENDING,
            endpoint1,
            endpoint2,
            kind,
            expandable: true,
        }
    }

    #[inline]
    pub fn is_highway(&self) -> bool {
        self.kind.is_highway()
    }

    #[inline]
    pub fn length(&self) -> f64 {
        geom::distance(self.endpoint1, self.endpoint2)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        geom::midpoint(self.endpoint1, self.endpoint2)
    }

    /// Unit direction from `endpoint1` to `endpoint2` (`None` if degenerate).
    #[inline]
    pub fn direction(&self) -> Option<Point> {
        geom::direction(self.endpoint1, self.endpoint2)
    }

    /// The endpoint nearer to `pos` (`endpoint1` on ties).
    pub fn closest_endpoint(&self, pos: Point) -> Point {
        if geom::distance(self.endpoint1, pos) <= geom::distance(self.endpoint2, pos) {
            self.endpoint1
        } else {
            self.endpoint2
        }
    }

    /// Same segment within `eps` per axis, regardless of orientation.
    pub fn approx_eq(&self, other: &Edge, eps: f64) -> bool {
        let same = |a: Point, b: Point| (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps;
        (same(self.endpoint1, other.endpoint1) && same(self.endpoint2, other.endpoint2))
            || (same(self.endpoint1, other.endpoint2) && same(self.endpoint2, other.endpoint1))
    }

    #[inline]
    pub fn crossing(&self, other: &Edge) -> Option<Crossing> {
        segment_crossing(self.endpoint1, self.endpoint2, other.endpoint1, other.endpoint2)
    }

    /// Intersection with another edge (closest-to-`endpoint1` point for overlaps).
    #[inline]
    pub fn intersect(&self, other: &Edge) -> Option<Point> {
        self.crossing(other).map(|c| c.point())
    }

    #[inline]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        rect.intersects_segment(self.endpoint1, self.endpoint2)
    }
}
