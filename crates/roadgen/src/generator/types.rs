//! Outputs, phase tags, and error types of a generation run.

use std::fmt;

use serde::Serialize;

use crate::config::ConfigError;
use crate::network::{Edge, Node};
use crate::terrain::RasterError;

/// Phases of a run, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenState {
    Seeding,
    HighwayGrowth,
    GridSeeding,
    GridGrowth,
    Done,
}

/// Why a proposed segment was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    OutOfBounds,
    Submerged,
    TooShort,
    /// Runs along an existing road.
    Overlapping,
    /// Touches no cell of the index.
    Unindexed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OutOfBounds => "out of bounds",
            Self::Submerged => "submerged",
            Self::TooShort => "too short",
            Self::Overlapping => "overlaps an existing road",
            Self::Unindexed => "outside every cell",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub out_of_bounds: usize,
    pub submerged: usize,
    pub too_short: usize,
    pub overlapping: usize,
    pub unindexed: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, r: Rejection) {
        let slot = match r {
            Rejection::OutOfBounds => &mut self.out_of_bounds,
            Rejection::Submerged => &mut self.submerged,
            Rejection::TooShort => &mut self.too_short,
            Rejection::Overlapping => &mut self.overlapping,
            Rejection::Unindexed => &mut self.unindexed,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.out_of_bounds + self.submerged + self.too_short + self.overlapping + self.unindexed
    }
}

/// Counters collected during one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GenStats {
    pub seeded: bool,
    pub start: Option<[f64; 2]>,
    pub highway_rounds: usize,
    pub grid_rounds: usize,
    pub highways: usize,
    pub streets: usize,
    pub nodes: usize,
    /// Grid turtles spawned along highways.
    pub grid_seeds: usize,
    /// Spawns dropped by the per-phase turtle cap.
    pub dropped_turtles: usize,
    pub rejected: RejectionCounts,
}

/// Result of `RoadGenerator::generate`: accepted edges in acceptance order.
#[derive(Clone, Debug, Default)]
pub struct RoadNetwork {
    pub highways: Vec<Edge>,
    pub streets: Vec<Edge>,
    pub nodes: Vec<Node>,
    pub stats: GenStats,
}

impl RoadNetwork {
    /// Highways first, then streets.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.highways.iter().chain(self.streets.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.highways.is_empty() && self.streets.is_empty()
    }

    pub fn total_length(&self) -> f64 {
        self.edges().map(Edge::length).sum()
    }
}

/// Construction failures of `RoadGenerator`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenError {
    Config(ConfigError),
    Raster(RasterError),
    /// Terrain was built for a different city extent.
    TerrainMismatch {
        expected: (f64, f64),
        actual: (f64, f64),
    },
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => e.fmt(f),
            Self::Raster(e) => write!(f, "raster source: {e}"),
            Self::TerrainMismatch { expected, actual } => write!(
                f,
                "terrain covers {} x {} but city is {} x {}",
                actual.0, actual.1, expected.0, expected.1
            ),
        }
    }
}

impl std::error::Error for GenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Raster(e) => Some(e),
            Self::TerrainMismatch { .. } => None,
        }
    }
}

impl From<ConfigError> for GenError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RasterError> for GenError {
    fn from(e: RasterError) -> Self {
        Self::Raster(e)
    }
}
