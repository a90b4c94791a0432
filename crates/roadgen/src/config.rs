//! Generator configuration and validation.
//!
//! Every knob the generator reads lives here; nothing is hard-coded in the
//! growth loops. Defaults reproduce a 512 × 512 city split into 8 × 8 cells.
//! Malformed values are rejected by `GenCfg::validate`, which
//! `RoadGenerator::new` calls before anything else.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rules::{GridAction, GrowthRule};

/// Error type for malformed configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidParams { reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams { reason } => write!(f, "invalid generator config: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level generator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenCfg {
    pub city_width: f64,
    pub city_height: f64,
    /// Cells per row; cell width is `city_width / grid_cols`.
    pub grid_cols: usize,
    pub grid_rows: usize,
    /// Elevation at or below this value is water (byte intensity scale).
    pub water_level: f64,
    /// Per-axis tolerance for node identity.
    pub node_eps: f64,
    pub seed: u64,
    /// Locked start position; randomized near the map edges when `None`.
    pub start: Option<[f64; 2]>,
    /// Re-rolls allowed while the random start lands in water.
    pub start_attempts: usize,
    /// Angular step when scoring initial headings.
    pub seed_heading_step_deg: f64,
    /// Upper bound on simultaneously active turtles per phase.
    pub max_turtles: usize,
    pub highway: HighwayCfg,
    pub grid: GridCfg,
}

impl Default for GenCfg {
    fn default() -> Self {
        Self {
            city_width: 512.0,
            city_height: 512.0,
            grid_cols: 8,
            grid_rows: 8,
            // 0.5 on the 0..5 water slider, in byte intensity.
            water_level: 0.5 * 255.0 / 5.0,
            node_eps: crate::geom::NODE_EPS,
            seed: 0,
            start: None,
            start_attempts: 64,
            seed_heading_step_deg: 30.0,
            max_turtles: 4096,
            highway: HighwayCfg::default(),
            grid: GridCfg::default(),
        }
    }
}

/// Highway growth parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighwayCfg {
    /// Full width of the heading fan searched each round.
    pub search_angle_deg: f64,
    pub search_radius: f64,
    pub search_steps: usize,
    /// Number of equal slices the fan is cut into (headings = slices + 1).
    pub fan_divisions: usize,
    /// Heading divergence that triggers a fork.
    pub branch_angle_deg: f64,
    pub segment_length: f64,
    /// Shortest highway segment that survives repair.
    pub min_length: f64,
    /// Longest a highway may stretch to bridge water.
    pub max_length: f64,
    pub max_rounds: usize,
    /// Cumulative turn a single lineage may take.
    pub max_rotation_deg: f64,
    /// Snap threshold as a fraction of the proposal's length.
    pub snap_ratio: f64,
    /// Extra reach tried to connect a dangling end to the network (0 = off).
    pub extend_radius: f64,
}

impl Default for HighwayCfg {
    fn default() -> Self {
        Self {
            search_angle_deg: 90.0,
            search_radius: 100.0,
            search_steps: 6,
            fan_divisions: 8,
            branch_angle_deg: 45.0,
            segment_length: 100.0,
            min_length: 20.0,
            max_length: 400.0,
            max_rounds: 20,
            max_rotation_deg: 150.0,
            snap_ratio: 0.5,
            extend_radius: 0.0,
        }
    }
}

/// Secondary street grid parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridCfg {
    /// Segment length drawn along a turtle's step direction.
    pub block_length: f64,
    /// Segment length drawn by phase-0 turtles leaving a highway.
    pub block_width: f64,
    /// A highway is never cut into more than this many grid seeds.
    pub max_blocks: usize,
    /// Shortest spacing between grid seeds along a highway.
    pub min_spacing: f64,
    pub min_length: f64,
    pub max_rounds: usize,
    /// Deepest phase a lineage may reach.
    pub max_depth: i32,
    /// Draw growth rules and forks at random; otherwise take the heaviest rule.
    pub randomize: bool,
    /// Chance a phase-0 turtle also spawns a follower heading the other way.
    pub opposite_chance: f64,
    /// Orientation of the city-wide grid.
    pub global_angle_deg: f64,
    /// How close a highway axis must be to the global grid to adopt it.
    pub align_tolerance_deg: f64,
    pub snap_ratio: f64,
    pub extend_radius: f64,
    pub rules: Vec<GrowthRule>,
}

impl Default for GridCfg {
    fn default() -> Self {
        Self {
            block_length: 40.0,
            block_width: 30.0,
            max_blocks: 20,
            min_spacing: 10.0,
            min_length: 5.0,
            max_rounds: 30,
            max_depth: 20,
            randomize: true,
            opposite_chance: 0.5,
            global_angle_deg: 0.0,
            align_tolerance_deg: 45.0,
            snap_ratio: 0.5,
            extend_radius: 15.0,
            rules: vec![
                GrowthRule::new(GridAction::Continue, 0.6),
                GrowthRule::new(GridAction::Turn, 0.25),
                GrowthRule::new(GridAction::Fork, 0.15),
            ],
        }
    }
}

fn positive(name: &str, v: f64) -> Result<(), ConfigError> {
    if !v.is_finite() || v <= 0.0 {
        return Err(ConfigError::invalid(format!("{name} must be finite and > 0")));
    }
    Ok(())
}

fn non_negative(name: &str, v: f64) -> Result<(), ConfigError> {
    if !v.is_finite() || v < 0.0 {
        return Err(ConfigError::invalid(format!("{name} must be finite and >= 0")));
    }
    Ok(())
}

impl GenCfg {
    #[inline]
    pub fn cell_width(&self) -> f64 {
        self.city_width / self.grid_cols.max(1) as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("city_width", self.city_width)?;
        positive("city_height", self.city_height)?;
        if self.grid_cols == 0 || self.grid_rows == 0 {
            return Err(ConfigError::invalid("grid needs at least one cell per axis"));
        }
        let rows = self.city_height / self.cell_width();
        if (rows - self.grid_rows as f64).abs() > 1e-6 * self.grid_rows as f64 {
            return Err(ConfigError::invalid(
                "grid rows must match city height for square cells",
            ));
        }
        if !self.water_level.is_finite() {
            return Err(ConfigError::invalid("water_level must be finite"));
        }
        positive("node_eps", self.node_eps)?;
        positive("seed_heading_step_deg", self.seed_heading_step_deg)?;
        if self.start.is_none() && self.start_attempts == 0 {
            return Err(ConfigError::invalid("start_attempts must be > 0"));
        }
        if let Some([x, y]) = self.start {
            let inside = x >= 0.0 && x <= self.city_width && y >= 0.0 && y <= self.city_height;
            if !inside {
                return Err(ConfigError::invalid("locked start lies outside city space"));
            }
        }
        if self.max_turtles == 0 {
            return Err(ConfigError::invalid("max_turtles must be > 0"));
        }
        self.highway.validate()?;
        self.grid.validate()
    }
}

impl HighwayCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("highway.search_angle_deg", self.search_angle_deg)?;
        positive("highway.search_radius", self.search_radius)?;
        if self.search_steps == 0 || self.fan_divisions == 0 {
            return Err(ConfigError::invalid(
                "highway.search_steps and highway.fan_divisions must be > 0",
            ));
        }
        non_negative("highway.branch_angle_deg", self.branch_angle_deg)?;
        positive("highway.segment_length", self.segment_length)?;
        non_negative("highway.min_length", self.min_length)?;
        positive("highway.max_length", self.max_length)?;
        if self.max_length < self.segment_length {
            return Err(ConfigError::invalid(
                "highway.max_length must be >= highway.segment_length",
            ));
        }
        positive("highway.max_rotation_deg", self.max_rotation_deg)?;
        non_negative("highway.snap_ratio", self.snap_ratio)?;
        non_negative("highway.extend_radius", self.extend_radius)
    }
}

impl GridCfg {
    fn validate(&self) -> Result<(), ConfigError> {
        positive("grid.block_length", self.block_length)?;
        positive("grid.block_width", self.block_width)?;
        positive("grid.min_spacing", self.min_spacing)?;
        if self.max_blocks == 0 {
            return Err(ConfigError::invalid("grid.max_blocks must be > 0"));
        }
        if self.max_depth <= 0 {
            return Err(ConfigError::invalid("grid.max_depth must be > 0"));
        }
        non_negative("grid.min_length", self.min_length)?;
        if !(0.0..=1.0).contains(&self.opposite_chance) {
            return Err(ConfigError::invalid("grid.opposite_chance must lie in [0, 1]"));
        }
        if !self.global_angle_deg.is_finite() {
            return Err(ConfigError::invalid("grid.global_angle_deg must be finite"));
        }
        non_negative("grid.align_tolerance_deg", self.align_tolerance_deg)?;
        non_negative("grid.snap_ratio", self.snap_ratio)?;
        non_negative("grid.extend_radius", self.extend_radius)?;
        crate::rules::RuleTable::new(&self.rules).map(|_| ())
    }
}
