//! Planner configuration
//!
//! All parameters are fixed at planner construction. Values can be loaded
//! from TOML; missing keys fall back to the documented defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{PlanningError, PlanningResult};
use crate::path_planning::PlannerVariant;

/// Configuration shared by all planner variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RrtConfig {
    /// Node budget of one planning run (default: 2000)
    pub max_nodes: usize,
    /// Growth of the sampling disk radius per accepted sample (default: 10)
    pub expansion_rate: f64,
    /// Sub-step length for edge collision checks (default: 25)
    pub collision_step: f64,
    /// Resampling and visibility step of the path optimizer (default: 3)
    pub optimization_step: f64,
    /// Waypoint cap of the path optimizer (default: 500)
    pub max_waypoints: usize,
    /// Base rewiring distance, rewiring variant only (default: 50)
    pub reroute_distance: f64,
    /// Rewiring radius numerator; `max_nodes * reroute_distance` when unset
    pub reroute_factor: Option<f64>,
}

impl Default for RrtConfig {
    fn default() -> Self {
        Self {
            max_nodes: 2000,
            expansion_rate: 10.0,
            collision_step: 25.0,
            optimization_step: 3.0,
            max_waypoints: 500,
            reroute_distance: 50.0,
            reroute_factor: None,
        }
    }
}

impl RrtConfig {
    /// Tuned defaults per variant
    pub fn for_variant(variant: PlannerVariant) -> Self {
        match variant {
            PlannerVariant::Basic => Self::default(),
            PlannerVariant::CostGreedy => Self {
                max_nodes: 1250,
                expansion_rate: 5.0,
                ..Default::default()
            },
            PlannerVariant::Rewiring => Self {
                max_nodes: 750,
                expansion_rate: 5.0,
                ..Default::default()
            },
        }
    }

    /// Numerator of the shrinking rewiring radius `factor / node_count`
    pub fn reroute_factor(&self) -> f64 {
        self.reroute_factor
            .unwrap_or(self.max_nodes as f64 * self.reroute_distance)
    }

    pub fn from_toml_str(s: &str) -> PlanningResult<Self> {
        let config: RrtConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> PlanningResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> PlanningResult<()> {
        if self.max_nodes == 0 {
            return Err(invalid("max_nodes must be at least 1"));
        }
        if self.max_waypoints == 0 {
            return Err(invalid("max_waypoints must be at least 1"));
        }
        let positive = [
            ("expansion_rate", self.expansion_rate),
            ("collision_step", self.collision_step),
            ("optimization_step", self.optimization_step),
            ("reroute_distance", self.reroute_distance),
            ("reroute_factor", self.reroute_factor()),
        ];
        for (name, value) in positive.iter() {
            if !(value.is_finite() && *value > 0.0) {
                return Err(invalid(&format!("{} must be positive, got {}", name, value)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> PlanningError {
    PlanningError::InvalidConfiguration(msg.to_string())
}
