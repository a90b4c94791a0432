//! Weighted growth rules for grid turtles.
//!
//! A grid lineage picks one `GridAction` after every accepted block. The
//! choice is a weighted draw from the configured table; with randomization
//! off the heaviest rule is taken every time, so runs are reproducible
//! without depending on the random stream.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// What a grid turtle does after drawing a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridAction {
    /// Keep the current step direction.
    Continue,
    /// Turn the step direction by 90°.
    Turn,
    /// Keep going and spawn a sibling turned by 90°.
    Fork,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrowthRule {
    pub action: GridAction,
    pub weight: f64,
}

impl GrowthRule {
    #[inline]
    pub fn new(action: GridAction, weight: f64) -> Self {
        Self { action, weight }
    }
}

/// Validated rule table with its sampling distribution.
#[derive(Clone, Debug)]
pub struct RuleTable {
    actions: Vec<GridAction>,
    dist: WeightedIndex<f64>,
    dominant: GridAction,
}

impl RuleTable {
    pub fn new(rules: &[GrowthRule]) -> Result<Self, ConfigError> {
        if rules.iter().any(|r| !r.weight.is_finite() || r.weight < 0.0) {
            return Err(ConfigError::invalid("grid.rules weights must be finite and >= 0"));
        }
        let dist = WeightedIndex::new(rules.iter().map(|r| r.weight))
            .map_err(|e| ConfigError::invalid(format!("grid.rules: {e}")))?;
        // First rule wins ties.
        let mut dominant = rules[0];
        for r in &rules[1..] {
            if r.weight > dominant.weight {
                dominant = *r;
            }
        }
        Ok(Self {
            actions: rules.iter().map(|r| r.action).collect(),
            dist,
            dominant: dominant.action,
        })
    }

    /// The heaviest rule.
    #[inline]
    pub fn dominant(&self) -> GridAction {
        self.dominant
    }

    /// Weighted draw, or the dominant rule when `randomize` is false.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R, randomize: bool) -> GridAction {
        if !randomize {
            return self.dominant;
        }
        self.actions[self.dist.sample(rng)]
    }
}
