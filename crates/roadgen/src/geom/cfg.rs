//! Tolerance defaults for road geometry.
//!
//! Policy
//! - These are part of the generator's contract: they decide which proposals
//!   merge into shared nodes and which pairs of segments count as parallel.
//! - `NODE_EPS` is only the default; `GenCfg::node_eps` overrides it per run.

/// Per-axis distance under which two points are the same graph node.
pub const NODE_EPS: f64 = 0.1;
/// Relative threshold on `|r × s| / (|r| |s|)` (the sine of the angle between
/// two segments) below which they are treated as parallel.
pub const PARALLEL_EPS: f64 = 1e-9;
