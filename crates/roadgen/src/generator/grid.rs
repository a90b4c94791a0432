use rand::Rng;
use tracing::debug;

use super::RoadGenerator;
use crate::geom::{self, Point};
use crate::network::{Edge, RoadKind};
use crate::rules::GridAction;
use crate::terrain::Terrain;
use crate::turtle::Turtle;

/// Primary (outward) and cross directions of the grid along one highway.
///
/// The city-wide grid orientation wins when either the highway's normal or
/// the highway itself lies within `tolerance_deg` of it; otherwise the grid
/// follows the highway's own axes.
pub(super) fn grid_axes(dir: Point, global_deg: f64, tolerance_deg: f64) -> (Point, Point) {
    let global = geom::heading_deg(global_deg);
    let perp_global = geom::perpendicular(global);
    let perp_local = geom::perpendicular(dir);
    if geom::line_angle_deg(perp_local, global) < tolerance_deg {
        (global, perp_global)
    } else if geom::line_angle_deg(dir, global) < tolerance_deg {
        (perp_global, global)
    } else {
        (perp_local, dir)
    }
}

impl<T: Terrain, R: Rng> RoadGenerator<T, R> {
    /// Spawn opposed grid turtles at regular stops along every highway.
    pub(super) fn seed_grid(&mut self) {
        let gc = &self.cfg.grid;
        let (block_length, min_spacing, max_blocks) = (gc.block_length, gc.min_spacing, gc.max_blocks);
        let (global_deg, tolerance) = (gc.global_angle_deg, gc.align_tolerance_deg);

        let highways: Vec<Edge> = self.highways.iter().map(|&id| *self.index.edge(id)).collect();
        let mut seeds = Vec::new();
        for e in highways {
            let Some(dir) = e.direction() else {
                continue;
            };
            let len = e.length();
            let spacing = block_length.max(min_spacing).max(len / max_blocks as f64);
            let (primary, cross) = grid_axes(dir, global_deg, tolerance);
            let mut k = 1usize;
            while (k as f64) * spacing < len {
                let pos = e.endpoint1 + dir * (k as f64 * spacing);
                k += 1;
                if !self.dry(pos) {
                    continue;
                }
                if self.index.node_or_insert(pos).is_none() {
                    continue;
                }
                seeds.push(Turtle::grid(pos, primary, cross, block_length));
                seeds.push(Turtle::grid(pos, -primary, cross, block_length));
            }
        }
        self.stats.grid_seeds = seeds.len();
        self.cap_turtles(&mut seeds);
        debug!(seeds = seeds.len(), "grid seeded");
        self.turtles = seeds;
    }

    pub(super) fn grow_grid(&mut self) {
        for round in 0..self.cfg.grid.max_rounds {
            if self.turtles.is_empty() {
                break;
            }
            let turtles = std::mem::take(&mut self.turtles);
            let mut next = Vec::with_capacity(turtles.len());
            for t in turtles {
                self.step_grid(t, &mut next);
            }
            self.cap_turtles(&mut next);
            self.turtles = next;
            self.stats.grid_rounds += 1;
            debug!(
                round,
                active = self.turtles.len(),
                streets = self.streets.len(),
                "grid round"
            );
        }
        self.turtles.clear();
    }

    /// Advance one grid turtle, pushing its successors into `next`.
    fn step_grid(&mut self, mut t: Turtle, next: &mut Vec<Turtle>) {
        if t.phase >= self.cfg.grid.max_depth {
            return;
        }
        if t.phase == 0 {
            let proposal = Edge::new(t.position, t.ahead(self.cfg.grid.block_width), RoadKind::Street);
            let Some(edge) = self.accept(proposal) else {
                return;
            };
            let follower = Turtle {
                position: edge.endpoint2,
                phase: 1,
                ..t
            };
            next.push(follower);
            let randomize = self.cfg.grid.randomize;
            if !randomize || self.rng.gen_bool(self.cfg.grid.opposite_chance) {
                next.push(Turtle {
                    step_direction: -t.step_direction,
                    ..follower
                });
            }
            return;
        }

        let end = t.position + t.step_direction * t.step_length;
        let Some(edge) = self.accept(Edge::new(t.position, end, RoadKind::Street)) else {
            return;
        };
        t.position = edge.endpoint2;
        t.phase += 1;
        let randomize = self.cfg.grid.randomize;
        match self.rules.draw(&mut self.rng, randomize) {
            GridAction::Continue => next.push(t),
            GridAction::Turn => {
                let deg = self.turn_deg(t.phase);
                t.step_direction = geom::rotate_deg(t.step_direction, deg);
                next.push(t);
            }
            GridAction::Fork => {
                let deg = self.turn_deg(t.phase);
                let mut fork = t;
                fork.step_direction = geom::rotate_deg(t.step_direction, deg);
                next.push(t);
                next.push(fork);
            }
        }
    }

    /// ±90°: random side, or alternating by phase when randomization is off.
    fn turn_deg(&mut self, phase: i32) -> f64 {
        let left = if self.cfg.grid.randomize {
            self.rng.gen_bool(0.5)
        } else {
            phase % 2 == 0
        };
        if left {
            90.0
        } else {
            -90.0
        }
    }
}
