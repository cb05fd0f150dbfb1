//! Common traits defining interfaces for the planners

use crate::common::error::PlanningResult;
use crate::common::types::*;
use crate::path_planning::Node;

/// Point-blocked predicate over the inflated obstacle set and the world bounds.
///
/// Implementations must be read-only so a single oracle can be shared by any
/// number of planner instances.
pub trait CollisionChecker {
    /// True if `(x, y)` lies inside an inflated obstacle or outside the world
    fn is_blocked(&self, x: f64, y: f64) -> bool;

    /// Check a straight segment by testing `ceil(|ab| / step)` equal sub-steps,
    /// both endpoints included.
    fn segment_is_free(&self, a: &Point2D, b: &Point2D, step: f64) -> bool {
        let n = ((a.distance(b) / step).ceil() as usize).max(1);
        (0..=n).all(|i| {
            let p = a.lerp(b, i as f64 / n as f64);
            !self.is_blocked(p.x, p.y)
        })
    }
}

impl<F> CollisionChecker for F
where
    F: Fn(f64, f64) -> bool,
{
    fn is_blocked(&self, x: f64, y: f64) -> bool {
        self(x, y)
    }
}

/// Trait for path planning algorithms targeting a goal region
pub trait PathPlanner {
    /// Plan a path from start into the goal region
    fn plan(&mut self, start: Point2D, goal: &GoalRegion) -> PlanningResult<Path2D>;
}

/// Trait for sampling-based path planning algorithms
pub trait SamplingBasedPlanner: PathPlanner {
    /// Get the tree built during planning
    fn tree(&self) -> &[Node];

    /// Set the node budget for planning
    fn set_max_nodes(&mut self, max_nodes: usize);
}
