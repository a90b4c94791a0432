//! Constraint repair and commit.
//!
//! A proposal runs through `fix_bounds`, `fix_water` and `fix_nearby` in that
//! order. Each stage may move `endpoint2`, clear `expandable`, or veto the
//! proposal with a `Rejection`. Only `commit` writes to the index.

use rand::Rng;
use tracing::trace;

use super::{RoadGenerator, Rejection};
use crate::geom::{self, Crossing, Point};
use crate::network::{Edge, EdgeId, RoadKind};
use crate::terrain::Terrain;

/// Sample count for the backward water march and the street water scan.
const WATER_SAMPLES: usize = 10;
/// Sample count for walking a street back into city space.
const BOUNDS_SAMPLES: usize = 4;
/// Most forward probes a highway makes looking for land across water.
const BRIDGE_SAMPLES: usize = 1024;

impl<T: Terrain, R: Rng> RoadGenerator<T, R> {
    /// Repair and commit; rejections are counted and logged here.
    pub(super) fn accept(&mut self, proposal: Edge) -> Option<Edge> {
        let result = self.repair(proposal).and_then(|e| self.commit(e).map(|_| e));
        match result {
            Ok(e) => Some(e),
            Err(r) => {
                self.stats.rejected.record(r);
                trace!(
                    kind = proposal.kind.as_str(),
                    x = proposal.endpoint1.x,
                    y = proposal.endpoint1.y,
                    reason = %r,
                    "proposal rejected"
                );
                None
            }
        }
    }

    /// Full pipeline without touching the index.
    pub(super) fn repair(&self, proposal: Edge) -> Result<Edge, Rejection> {
        let e = self.fix_bounds(proposal)?;
        let e = self.fix_water(e)?;
        let e = self.fix_nearby(e)?;
        Ok(self.try_extend(e))
    }

    pub(super) fn min_length(&self, kind: RoadKind) -> f64 {
        match kind {
            RoadKind::Highway => self.cfg.highway.min_length,
            RoadKind::Street => self.cfg.grid.min_length,
        }
    }

    fn check_length(&self, e: Edge) -> Result<Edge, Rejection> {
        let degenerate = geom::approx_eq(e.endpoint1, e.endpoint2, self.cfg.node_eps);
        if degenerate || e.length() < self.min_length(e.kind) {
            return Err(Rejection::TooShort);
        }
        Ok(e)
    }

    /// Keep the far end in city space. Highways may leave the map, ending
    /// their growth; streets walk back in quarter steps.
    pub(super) fn fix_bounds(&self, mut e: Edge) -> Result<Edge, Rejection> {
        let idx = &self.index;
        if idx.out_of_bounds(e.endpoint1) {
            return Err(Rejection::OutOfBounds);
        }
        if !idx.out_of_bounds(e.endpoint2) {
            return Ok(e);
        }
        if e.is_highway() {
            e.expandable = false;
            return Ok(e);
        }
        let span = e.endpoint2 - e.endpoint1;
        for k in (1..BOUNDS_SAMPLES).rev() {
            let p = e.endpoint1 + span * (k as f64 / BOUNDS_SAMPLES as f64);
            if !idx.out_of_bounds(p) {
                e.endpoint2 = p;
                return Ok(e);
            }
        }
        Err(Rejection::OutOfBounds)
    }

    /// Bridge or retreat from water.
    ///
    /// A highway ending in water first probes forward in half-segment steps
    /// up to `max_length` from its start for dry land. Otherwise the far end
    /// marches back in tenths to the first dry sample. Streets are also cut
    /// before the first wet sample along their length.
    pub(super) fn fix_water(&self, mut e: Edge) -> Result<Edge, Rejection> {
        if self.wet(e.endpoint1) && !e.is_highway() {
            return Err(Rejection::Submerged);
        }
        if e.is_highway() {
            if !self.wet(e.endpoint2) {
                return Ok(e);
            }
            if let Some(p) = self.bridge(&e) {
                e.endpoint2 = p;
                return self.check_length(e);
            }
            e.endpoint2 = self.retreat(&e).ok_or(Rejection::Submerged)?;
            return self.check_length(e);
        }
        let span = e.endpoint2 - e.endpoint1;
        for k in 1..=WATER_SAMPLES {
            let p = e.endpoint1 + span * (k as f64 / WATER_SAMPLES as f64);
            if self.wet(p) {
                if k == 1 {
                    return Err(Rejection::Submerged);
                }
                e.endpoint2 = e.endpoint1 + span * ((k - 1) as f64 / WATER_SAMPLES as f64);
                break;
            }
        }
        self.check_length(e)
    }

    /// First dry, in-bounds point ahead of a submerged highway end.
    ///
    /// Probes never run past the city diagonal, and at most `BRIDGE_SAMPLES`
    /// of them are taken; the step widens when half a segment would need more.
    fn bridge(&self, e: &Edge) -> Option<Point> {
        let dir = e.direction()?;
        let len = e.length();
        let diagonal = self.cfg.city_width.hypot(self.cfg.city_height);
        let slack = self.cfg.highway.max_length.min(len + diagonal) - len;
        if slack <= 0.0 {
            return None;
        }
        let step = (self.cfg.highway.segment_length * 0.5).max(slack / BRIDGE_SAMPLES as f64);
        let probes = ((slack / step + 1e-9).floor() as usize).min(BRIDGE_SAMPLES);
        for k in 1..=probes {
            let p = e.endpoint2 + dir * (step * k as f64);
            if self.index.out_of_bounds(p) {
                return None;
            }
            if self.dry(p) {
                return Some(p);
            }
        }
        None
    }

    /// First dry sample walking from the far end back toward the start.
    fn retreat(&self, e: &Edge) -> Option<Point> {
        let span = e.endpoint2 - e.endpoint1;
        (1..WATER_SAMPLES)
            .map(|k| e.endpoint2 - span * (k as f64 / WATER_SAMPLES as f64))
            .find(|&p| self.dry(p))
    }

    /// Cut at the nearest crossing with an existing road, else snap the far end
    /// onto a nearby node.
    pub(super) fn fix_nearby(&self, mut e: Edge) -> Result<Edge, Rejection> {
        let eps = self.cfg.node_eps;
        let cells = self.index.cells_for_segment(e.endpoint1, e.endpoint2);
        let mut nearest: Option<(Point, f64)> = None;
        for other in self.index.edges_in_cells(&cells) {
            let Some(c) = e.crossing(other) else {
                continue;
            };
            if matches!(c, Crossing::Overlap { .. }) && c.overlap_len() > eps {
                return Err(Rejection::Overlapping);
            }
            let p = c.point();
            let d = geom::distance(e.endpoint1, p);
            if d <= eps {
                continue;
            }
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((p, d));
            }
        }
        if let Some((p, _)) = nearest {
            e.endpoint2 = p;
            e.expandable = false;
        }

        if e.expandable {
            let threshold = self.snap_ratio(e.kind) * e.length();
            let start = e.endpoint1;
            let target = self
                .index
                .nearest_node(e.endpoint2, |n| geom::approx_eq(n.position, start, eps))
                .filter(|n| n.distance_from(e.endpoint2) <= threshold)
                .map(|n| n.position);
            if let Some(p) = target {
                e.endpoint2 = p;
                e.expandable = false;
            }
        }
        self.check_length(e)
    }

    fn snap_ratio(&self, kind: RoadKind) -> f64 {
        match kind {
            RoadKind::Highway => self.cfg.highway.snap_ratio,
            RoadKind::Street => self.cfg.grid.snap_ratio,
        }
    }

    fn extend_radius(&self, kind: RoadKind) -> f64 {
        match kind {
            RoadKind::Highway => self.cfg.highway.extend_radius,
            RoadKind::Street => self.cfg.grid.extend_radius,
        }
    }

    /// Stretch a dangling end by the extension radius; kept only if the
    /// longer edge reaches the existing network inside city space.
    pub(super) fn try_extend(&self, e: Edge) -> Edge {
        let radius = self.extend_radius(e.kind);
        if !e.expandable || radius <= 0.0 {
            return e;
        }
        let Some(dir) = e.direction() else {
            return e;
        };
        let mut longer = e;
        longer.endpoint2 += dir * radius;
        let reached = self
            .fix_bounds(longer)
            .and_then(|x| self.fix_water(x))
            .and_then(|x| self.fix_nearby(x));
        match reached {
            Ok(x) if !x.expandable && !self.index.out_of_bounds(x.endpoint2) => {
                trace!(x = x.endpoint2.x, y = x.endpoint2.y, "extended to network");
                x
            }
            _ => e,
        }
    }

    /// Write an accepted edge and its endpoints into the index.
    pub(super) fn commit(&mut self, e: Edge) -> Result<EdgeId, Rejection> {
        let id = self.index.insert_edge(e).ok_or(Rejection::Unindexed)?;
        for p in [e.endpoint1, e.endpoint2] {
            if self.index.node_or_insert(p).is_none() {
                trace!(x = p.x, y = p.y, "endpoint off map, no node");
            }
        }
        match e.kind {
            RoadKind::Highway => {
                self.highways.push(id);
                self.stats.highways += 1;
            }
            RoadKind::Street => {
                self.streets.push(id);
                self.stats.streets += 1;
            }
        }
        Ok(id)
    }
}
