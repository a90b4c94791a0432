use crate::geom::{approx_eq, distance, Point};

use super::NodeId;

/// A graph point with a stable identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
}

impl Node {
    #[inline]
    pub fn new(id: NodeId, position: Point) -> Self {
        Self { id, position }
    }

    /// Same graph point: positions differ by less than `eps` on both axes.
    #[inline]
    pub fn approx_eq(&self, other: &Node, eps: f64) -> bool {
        approx_eq(self.position, other.position, eps)
    }

    #[inline]
    pub fn distance_from(&self, p: Point) -> f64 {
        distance(self.position, p)
    }
}
