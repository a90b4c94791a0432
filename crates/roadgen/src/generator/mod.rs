//! Road generator: phased turtle growth over the cell index.
//!
//! Purpose
//! - Run `Seeding → HighwayGrowth → GridSeeding → GridGrowth → Done` once per
//!   `generate` call and hand back the accepted highways and streets.
//!
//! Invariants
//! - Every proposal goes through `repair` (bounds, water, nearby roads) before
//!   `commit` writes it into the index; rejections stay local to the round.
//! - Turtles are processed one after another, so a segment accepted earlier in
//!   a round is visible to repair for every turtle processed later in it.
//! - Every phase has a hard round cap; the turtle population per phase is
//!   capped by `GenCfg::max_turtles`.
//!
//! Randomness comes from the injected `R: Rng`. `new` seeds a `StdRng` from
//! `GenCfg::seed`; a generator replays the same network only from a fresh
//! instance, since `generate` keeps drawing from the same stream.
//!
//! Layout: `types.rs` (outputs and errors), `seed.rs` (start and heading),
//! `highway.rs` (fan search and branching), `grid.rs` (street grid),
//! `repair.rs` (constraint pipeline and commit).

mod grid;
mod highway;
mod repair;
mod seed;
mod types;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub use types::{GenError, GenState, GenStats, Rejection, RejectionCounts, RoadNetwork};

use crate::cells::CellIndex;
use crate::config::GenCfg;
use crate::geom::Point;
use crate::network::{Edge, EdgeId};
use crate::rules::RuleTable;
use crate::terrain::{Raster, Terrain};
use crate::turtle::Turtle;

pub struct RoadGenerator<T: Terrain, R: Rng = StdRng> {
    cfg: GenCfg,
    terrain: T,
    rng: R,
    rules: RuleTable,
    index: CellIndex,
    state: GenState,
    /// Active turtles of the current phase.
    turtles: Vec<Turtle>,
    highways: Vec<EdgeId>,
    streets: Vec<EdgeId>,
    stats: GenStats,
}

impl<T: Terrain> RoadGenerator<T, StdRng> {
    /// Validate `cfg` against `terrain` and seed the random stream from `cfg.seed`.
    pub fn new(cfg: GenCfg, terrain: T) -> Result<Self, GenError> {
        let rng = StdRng::seed_from_u64(cfg.seed);
        Self::with_rng(cfg, terrain, rng)
    }
}

impl RoadGenerator<Raster, StdRng> {
    /// Generator over a row-major RGBA8 buffer covering the configured city.
    pub fn from_rgba(
        cfg: GenCfg,
        data: Vec<u8>,
        width: usize,
        height: usize,
    ) -> Result<Self, GenError> {
        let raster = Raster::from_rgba(data, width, height, cfg.city_width, cfg.city_height)?;
        Self::new(cfg, raster)
    }
}

impl<T: Terrain, R: Rng> RoadGenerator<T, R> {
    /// Like `new`, with a caller-supplied random source.
    pub fn with_rng(cfg: GenCfg, terrain: T, rng: R) -> Result<Self, GenError> {
        cfg.validate()?;
        if let Some(actual) = terrain.extent() {
            let expected = (cfg.city_width, cfg.city_height);
            let close = |a: f64, b: f64| (a - b).abs() <= 1e-9 * a.abs().max(b.abs());
            if !close(actual.0, expected.0) || !close(actual.1, expected.1) {
                return Err(GenError::TerrainMismatch { expected, actual });
            }
        }
        let rules = RuleTable::new(&cfg.grid.rules)?;
        let index = CellIndex::new(
            cfg.city_width,
            cfg.city_height,
            cfg.grid_cols,
            cfg.grid_rows,
            cfg.node_eps,
        )?;
        Ok(Self {
            cfg,
            terrain,
            rng,
            rules,
            index,
            state: GenState::Seeding,
            turtles: Vec::new(),
            highways: Vec::new(),
            streets: Vec::new(),
            stats: GenStats::default(),
        })
    }

    #[inline]
    pub fn cfg(&self) -> &GenCfg {
        &self.cfg
    }

    #[inline]
    pub fn state(&self) -> GenState {
        self.state
    }

    /// Read access to the index (accepted nodes and edges so far).
    #[inline]
    pub fn index(&self) -> &CellIndex {
        &self.index
    }

    #[inline]
    pub fn stats(&self) -> &GenStats {
        &self.stats
    }

    /// Clear all output and return to `Seeding`.
    pub fn reset(&mut self) {
        self.index.clear();
        self.turtles.clear();
        self.highways.clear();
        self.streets.clear();
        self.stats = GenStats::default();
        self.state = GenState::Seeding;
    }

    /// Run one phase and move to the next; `Done` is absorbing.
    pub fn step(&mut self) -> GenState {
        let next = match self.state {
            GenState::Seeding => match self.seed() {
                Some(t) => {
                    self.turtles = vec![t];
                    GenState::HighwayGrowth
                }
                None => GenState::Done,
            },
            GenState::HighwayGrowth => {
                self.grow_highways();
                GenState::GridSeeding
            }
            GenState::GridSeeding => {
                self.seed_grid();
                GenState::GridGrowth
            }
            GenState::GridGrowth => {
                self.grow_grid();
                GenState::Done
            }
            GenState::Done => GenState::Done,
        };
        if next != self.state {
            debug!(from = ?self.state, to = ?next, "phase transition");
        }
        self.state = next;
        next
    }

    /// Full run from a clean index.
    pub fn generate(&mut self) -> RoadNetwork {
        self.reset();
        while self.step() != GenState::Done {}
        self.stats.nodes = self.index.nodes().len();
        debug!(
            highways = self.highways.len(),
            streets = self.streets.len(),
            nodes = self.stats.nodes,
            rejected = self.stats.rejected.total(),
            "generation finished"
        );
        self.network()
    }

    /// Snapshot of the accepted network.
    pub fn network(&self) -> RoadNetwork {
        let edges = |ids: &[EdgeId]| -> Vec<Edge> { ids.iter().map(|&id| *self.index.edge(id)).collect() };
        RoadNetwork {
            highways: edges(&self.highways),
            streets: edges(&self.streets),
            nodes: self.index.nodes().to_vec(),
            stats: self.stats.clone(),
        }
    }

    /// In city space and not under water.
    #[inline]
    fn dry(&self, p: Point) -> bool {
        !self.index.out_of_bounds(p) && self.terrain.elevation(p) > self.cfg.water_level
    }

    /// In city space and under water; off-map points are neither wet nor dry.
    #[inline]
    fn wet(&self, p: Point) -> bool {
        !self.index.out_of_bounds(p) && self.terrain.elevation(p) <= self.cfg.water_level
    }

    /// Drop turtles beyond the per-phase cap.
    fn cap_turtles(&mut self, turtles: &mut Vec<Turtle>) {
        let cap = self.cfg.max_turtles;
        if turtles.len() > cap {
            let dropped = turtles.len() - cap;
            turtles.truncate(cap);
            self.stats.dropped_turtles += dropped;
            debug!(dropped, cap, "turtle cap reached");
        }
    }
}

#[cfg(test)]
mod tests;
