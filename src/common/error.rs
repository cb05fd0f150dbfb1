//! Error types for radial_rrt

use thiserror::Error;

/// Outcomes of planning and path optimization that the caller inspects.
///
/// None of these leave the planner in a corrupt state: after `NoPathFound`
/// the node arena is still consistent and can be inspected or reset, and after
/// `WaypointLimitExceeded` the path as it was before the aborted pass step
/// remains usable.
#[derive(Error, Debug)]
pub enum PlanningError {
    /// Node budget exhausted without a feasible connection into the goal region
    #[error("No path found within node limit ({nodes} nodes)")]
    NoPathFound { nodes: usize },

    /// Optimization pass aborted because the path grew past the waypoint cap
    #[error("Waypoint limit exceeded during optimization: {waypoints} > {limit}")]
    WaypointLimitExceeded { waypoints: usize, limit: usize },

    /// Rejected parameters, start or goal region
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for PlanningError {
    fn from(e: toml::de::Error) -> Self {
        PlanningError::InvalidConfiguration(e.to_string())
    }
}

/// Result type alias for planning operations
pub type PlanningResult<T> = Result<T, PlanningError>;
