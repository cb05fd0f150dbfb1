//! radial_rrt - Radial-expansion RRT path planning in 2D
//!
//! This crate grows sampling-based trees from a start point toward a goal
//! rectangle inside an obstacle world and shortens the resulting paths with
//! a visibility-based waypoint optimizer.
//!
//! Three planner variants share one growth loop: plain nearest-node growth,
//! cost-greedy growth, and cost-greedy growth with local rewiring.

// Core modules
pub mod common;

// Algorithm modules
pub mod mapping;
pub mod path_planning;

// Re-export common types for convenience
pub use common::{AreaBounds, GoalRegion, Path2D, Point2D};
pub use common::{CollisionChecker, PathPlanner, SamplingBasedPlanner};
pub use common::{PlanningError, PlanningResult};
pub use mapping::ObstacleMap;
pub use path_planning::{PathOptimizer, PlannerState, PlannerVariant, RrtConfig, RrtPlanner};
