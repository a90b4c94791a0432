//! Procedural road networks over a bounded city space.
//!
//! Highways grow from a start point by population-seeking directional search;
//! a secondary street grid then fills the space along them. Every proposed
//! segment is repaired against the city bounds, water, and the roads already
//! placed before it is accepted into the cell index.
//!
//! Entry point: `generator::RoadGenerator`. Terrain is read through
//! `terrain::Terrain`; all tuning lives in `config::GenCfg`.
//!
//! Tolerances (see `geom::NODE_EPS`, `geom::PARALLEL_EPS`) are part of the
//! contract: they decide which segments meet at a shared node.

pub mod cells;
pub mod config;
pub mod generator;
pub mod geom;
pub mod network;
pub mod rules;
pub mod terrain;
pub mod turtle;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::{ConfigError, GenCfg, GridCfg, HighwayCfg};
pub use generator::{GenError, GenState, GenStats, Rejection, RoadGenerator, RoadNetwork};
pub use geom::Point;

/// Common exports for callers driving a full run.
pub mod prelude {
    pub use crate::cells::CellIndex;
    pub use crate::config::{GenCfg, GridCfg, HighwayCfg};
    pub use crate::generator::{GenError, GenState, GenStats, RoadGenerator, RoadNetwork};
    pub use crate::geom::Point;
    pub use crate::network::{Edge, EdgeId, Node, NodeId, RoadKind};
    pub use crate::rules::{GridAction, GrowthRule};
    pub use crate::terrain::{FlatTerrain, Raster, Terrain};
    pub use crate::turtle::Turtle;
}
