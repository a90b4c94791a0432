use rand::Rng;
use tracing::{debug, trace};

use super::RoadGenerator;
use crate::geom::{self, Point};
use crate::network::{Edge, RoadKind};
use crate::terrain::Terrain;
use crate::turtle::Turtle;

/// Outcome of scanning the heading fan around a turtle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct FanScan {
    /// Offset (degrees) of the best-scoring heading.
    pub best: f64,
    pub best_score: f64,
    pub second: f64,
    pub second_score: f64,
    /// Straight-ahead score including the extended search.
    pub current_score: f64,
}

/// Fan offsets in evaluation order: straight first, then alternating outward.
pub(super) fn fan_offsets(search_angle: f64, divisions: usize) -> Vec<f64> {
    let half = search_angle * 0.5;
    let step = search_angle / divisions as f64;
    let mut out = vec![0.0];
    let mut k = 1usize;
    while k as f64 * step <= half + 1e-9 {
        let a = k as f64 * step;
        out.push(-a);
        out.push(a);
        k += 1;
    }
    out
}

impl<T: Terrain, R: Rng> RoadGenerator<T, R> {
    pub(super) fn grow_highways(&mut self) {
        for round in 0..self.cfg.highway.max_rounds {
            if self.turtles.is_empty() {
                break;
            }
            let mut turtles = std::mem::take(&mut self.turtles);
            let mut spawned = Vec::new();
            for t in turtles.iter_mut() {
                self.branch_highway(t, &mut spawned);
            }
            let mut next = Vec::with_capacity(turtles.len() + spawned.len());
            for mut t in turtles {
                if self.draw_highway(&mut t) {
                    next.push(t);
                }
            }
            next.append(&mut spawned);
            self.cap_turtles(&mut next);
            self.turtles = next;
            self.stats.highway_rounds += 1;
            debug!(
                round,
                active = self.turtles.len(),
                highways = self.highways.len(),
                "highway round"
            );
        }
        self.turtles.clear();
    }

    /// Population-over-distance score of dry samples along the unit `dir`,
    /// starting `from` units ahead of `origin`; stops at the city border.
    ///
    /// Distances are taken along the ray, so headings with identical samples
    /// score identically.
    fn march_score(&self, origin: Point, dir: Point, from: f64, step: f64, n: usize) -> f64 {
        let mut score = 0.0;
        for j in 1..=n {
            let d = from + j as f64 * step;
            let p = origin + dir * d;
            if self.index.out_of_bounds(p) {
                break;
            }
            if self.dry(p) {
                score += self.terrain.population(p) / d;
            }
        }
        score
    }

    pub(super) fn scan_fan(&self, t: &Turtle) -> FanScan {
        let hc = &self.cfg.highway;
        let step = hc.search_radius / hc.search_steps as f64;
        let mut scan = FanScan {
            best: 0.0,
            best_score: -1.0,
            second: 0.0,
            second_score: -1.0,
            current_score: -1.0,
        };
        for offset in fan_offsets(hc.search_angle_deg, hc.fan_divisions) {
            let dir = geom::rotate_deg(t.orientation, offset);
            let score = self.march_score(t.position, dir, 0.0, step, hc.search_steps);
            if offset == 0.0 {
                let ext_step = hc.search_radius / (4 * hc.search_steps) as f64;
                scan.current_score = score
                    + self.march_score(
                        t.position,
                        dir,
                        hc.search_radius,
                        ext_step,
                        hc.search_steps / 2,
                    );
            }
            if score > scan.best_score {
                scan.second = scan.best;
                scan.second_score = scan.best_score;
                scan.best = offset;
                scan.best_score = score;
            } else if score > scan.second_score {
                scan.second = offset;
                scan.second_score = score;
            }
        }
        scan
    }

    /// Fork the highway where the fan says so, then steer toward the best heading.
    pub(super) fn branch_highway(&self, t: &mut Turtle, spawned: &mut Vec<Turtle>) {
        let scan = self.scan_fan(t);
        let hc = &self.cfg.highway;
        let threshold = hc.branch_angle_deg;

        let straight_holds = (scan.current_score - scan.best_score).abs()
            > (scan.current_score - scan.second_score).abs();
        if scan.best.abs() > threshold && straight_holds {
            // The parent turns away; the child keeps the old course.
            spawned.push(*t);
            trace!(x = t.position.x, y = t.position.y, "highway fork straight");
        } else if (scan.best - scan.second).abs() > threshold * 1.5 {
            let mut child = *t;
            child.rotate_capped(scan.second, hc.max_rotation_deg);
            spawned.push(child);
            trace!(x = t.position.x, y = t.position.y, turn = scan.second, "highway fork");
        }

        if !t.rotate_capped(scan.best, hc.max_rotation_deg) {
            trace!(
                turn = scan.best,
                total = t.rotation_accumulated,
                "rotation cap, keeping course"
            );
        }
    }

    /// One segment ahead; returns whether the turtle stays active.
    fn draw_highway(&mut self, t: &mut Turtle) -> bool {
        let proposal = Edge::new(
            t.position,
            t.ahead(self.cfg.highway.segment_length),
            RoadKind::Highway,
        );
        let Some(edge) = self.accept(proposal) else {
            return false;
        };
        t.position = edge.endpoint2;
        edge.expandable && !self.index.out_of_bounds(edge.endpoint2)
    }
}
