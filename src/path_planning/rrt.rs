//! RRT (Rapidly-exploring Random Tree) path planning with radial expansion
//!
//! One growth loop serves three planner variants:
//!
//! - `Basic`: attach every sample to the nearest feasible node and stop at the
//!   first sample that lands in the goal region.
//! - `CostGreedy`: attach to the feasible node giving the lowest accumulated
//!   cost, keep growing until the node budget is spent and return the path of
//!   the cheapest node that reached the goal region.
//! - `Rewiring`: cost-greedy growth followed by a local rewiring pass around
//!   every new node (an RRT* style approximation).
//!
//! Samples come from a disk around the start that widens with every accepted
//! sample, so the tree grows outward from the start instead of scattering
//! over the whole world.

use std::fmt;
use std::str::FromStr;

use log::{debug, info, warn};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::common::{
    AreaBounds, CollisionChecker, GoalRegion, Path2D, PathPlanner, PlanningError,
    PlanningResult, Point2D, SamplingBasedPlanner,
};
use crate::path_planning::path_optimizer::PathOptimizer;
use crate::path_planning::rewire::{rewire, rewiring_radius};
use crate::path_planning::{Node, NodeArena, RadialSampler, RrtConfig};

/// Upper bound on the arena capacity reserved up front
const PREALLOCATED_NODES: usize = 4096;

/// Planner variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlannerVariant {
    Basic,
    CostGreedy,
    Rewiring,
}

impl PlannerVariant {
    pub fn all() -> [PlannerVariant; 3] {
        [PlannerVariant::Basic, PlannerVariant::CostGreedy, PlannerVariant::Rewiring]
    }
}

impl fmt::Display for PlannerVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlannerVariant::Basic => "basic",
            PlannerVariant::CostGreedy => "cost-greedy",
            PlannerVariant::Rewiring => "rewiring",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PlannerVariant {
    type Err = PlanningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" | "rrt" => Ok(PlannerVariant::Basic),
            "cost-greedy" | "smart" => Ok(PlannerVariant::CostGreedy),
            "rewiring" | "star" => Ok(PlannerVariant::Rewiring),
            other => Err(PlanningError::InvalidConfiguration(format!(
                "unknown planner variant '{}'",
                other
            ))),
        }
    }
}

/// How a new sample picks its parent among the feasible nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    /// Minimum Euclidean distance to the sample
    Nearest,
    /// Minimum `parent.cost + edge length`
    MinCost,
}

impl Connection {
    /// Lower is better
    pub fn score(&self, parent: &Node, edge_length: f64) -> f64 {
        match self {
            Connection::Nearest => edge_length,
            Connection::MinCost => parent.cost + edge_length,
        }
    }
}

/// What happens when a node lands in the goal region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalPolicy {
    /// Extract the path right away
    FirstHit,
    /// Record the node and pick the cheapest one once the budget is spent
    BestCandidate,
}

/// Growth parameters that distinguish the planner variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthStrategy {
    pub connection: Connection,
    pub goal_policy: GoalPolicy,
    pub rewire: bool,
}

impl From<PlannerVariant> for GrowthStrategy {
    fn from(variant: PlannerVariant) -> Self {
        match variant {
            PlannerVariant::Basic => GrowthStrategy {
                connection: Connection::Nearest,
                goal_policy: GoalPolicy::FirstHit,
                rewire: false,
            },
            PlannerVariant::CostGreedy => GrowthStrategy {
                connection: Connection::MinCost,
                goal_policy: GoalPolicy::BestCandidate,
                rewire: false,
            },
            PlannerVariant::Rewiring => GrowthStrategy {
                connection: Connection::MinCost,
                goal_policy: GoalPolicy::BestCandidate,
                rewire: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Idle,
    Growing,
    PathFound,
    Exhausted,
}

/// Radial-expansion RRT planner.
///
/// The planner borrows its collision oracle, so one oracle can serve any
/// number of planners. The random source is injectable for reproducible runs.
pub struct RrtPlanner<'a, C: ?Sized, R = StdRng> {
    oracle: &'a C,
    bounds: AreaBounds,
    config: RrtConfig,
    strategy: GrowthStrategy,
    rng: R,
    sampler: RadialSampler,
    arena: NodeArena,
    path: Path2D,
    goal: Option<GoalRegion>,
    goal_candidates: Vec<usize>,
    goal_index: Option<usize>,
    state: PlannerState,
}

impl<'a, C> RrtPlanner<'a, C, StdRng>
where
    C: CollisionChecker + ?Sized,
{
    /// Create a planner seeded from system entropy
    pub fn new(
        oracle: &'a C,
        bounds: AreaBounds,
        variant: PlannerVariant,
        config: RrtConfig,
    ) -> PlanningResult<Self> {
        Self::with_rng(oracle, bounds, variant.into(), config, StdRng::from_entropy())
    }

    /// Create a planner with a reproducible random sequence
    pub fn seeded(
        oracle: &'a C,
        bounds: AreaBounds,
        variant: PlannerVariant,
        config: RrtConfig,
        seed: u64,
    ) -> PlanningResult<Self> {
        Self::with_rng(oracle, bounds, variant.into(), config, StdRng::seed_from_u64(seed))
    }

    /// Create a planner from a hand-assembled growth strategy
    pub fn with_strategy(
        oracle: &'a C,
        bounds: AreaBounds,
        strategy: GrowthStrategy,
        config: RrtConfig,
    ) -> PlanningResult<Self> {
        Self::with_rng(oracle, bounds, strategy, config, StdRng::from_entropy())
    }
}

impl<'a, C, R> RrtPlanner<'a, C, R>
where
    C: CollisionChecker + ?Sized,
    R: Rng,
{
    /// Create a planner from an explicit growth strategy and random source
    pub fn with_rng(
        oracle: &'a C,
        bounds: AreaBounds,
        strategy: GrowthStrategy,
        config: RrtConfig,
        rng: R,
    ) -> PlanningResult<Self> {
        config.validate()?;
        if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "world bounds must have positive size, got {:?}",
                bounds
            )));
        }

        let sampler = RadialSampler::new(Point2D::origin(), bounds, config.expansion_rate);
        Ok(RrtPlanner {
            oracle,
            bounds,
            arena: NodeArena::with_capacity(config.max_nodes.min(PREALLOCATED_NODES)),
            config,
            strategy,
            rng,
            sampler,
            path: Path2D::new(),
            goal: None,
            goal_candidates: Vec::new(),
            goal_index: None,
            state: PlannerState::Idle,
        })
    }

    /// Discard the tree and the path and return to `Idle`
    pub fn reset(&mut self) {
        self.arena.clear();
        self.path = Path2D::new();
        self.goal = None;
        self.goal_candidates.clear();
        self.goal_index = None;
        self.state = PlannerState::Idle;
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn has_path(&self) -> bool {
        self.state == PlannerState::PathFound
    }

    /// Current path; empty unless a path was found
    pub fn path(&self) -> &Path2D {
        &self.path
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    pub fn config(&self) -> &RrtConfig {
        &self.config
    }

    pub fn strategy(&self) -> GrowthStrategy {
        self.strategy
    }

    /// Nodes that reached the goal region (cost-aware variants only)
    pub fn goal_candidates(&self) -> &[usize] {
        &self.goal_candidates
    }

    /// Index of the node the path was extracted from
    pub fn goal_index(&self) -> Option<usize> {
        self.goal_index
    }

    /// Accumulated tree cost of the node the path was extracted from
    pub fn goal_cost(&self) -> Option<f64> {
        self.goal_index
            .and_then(|i| self.arena.get(i))
            .map(|n| n.cost)
    }

    /// Grow a tree from `start` until the goal region is reached or the node
    /// budget is spent.
    pub fn plan(&mut self, start: Point2D, goal: &GoalRegion) -> PlanningResult<Path2D> {
        self.reset();
        self.validate_request(&start, goal)?;

        self.goal = Some(*goal);
        self.sampler.reset(start);
        self.arena.push_root(start);
        self.state = PlannerState::Growing;
        info!(
            "Planning from ({:.1}, {:.1}) with budget of {} nodes, strategy {:?}",
            start.x, start.y, self.config.max_nodes, self.strategy
        );
        let center = goal.center();
        if self.oracle.is_blocked(center.x, center.y) {
            warn!(
                "Goal center ({:.1}, {:.1}) is blocked, no node can reach it",
                center.x, center.y
            );
        }

        // Only connected samples count against the budget.
        while self.arena.len() < self.config.max_nodes {
            let sample = self.sampler.sample(&mut self.rng);
            let parent = match self.select_parent(&sample) {
                Some(parent) => parent,
                None => continue,
            };
            let index = self.arena.push(parent, sample);

            if self.reaches_goal(goal, &sample) {
                match self.strategy.goal_policy {
                    GoalPolicy::FirstHit => {
                        self.extract_path(index);
                        return Ok(self.path.clone());
                    }
                    GoalPolicy::BestCandidate => self.goal_candidates.push(index),
                }
            }

            if self.strategy.rewire {
                let radius = rewiring_radius(self.config.reroute_factor(), self.arena.len());
                rewire(
                    &mut self.arena,
                    self.oracle,
                    index,
                    radius,
                    self.config.collision_step,
                );
            }
        }

        let best = self
            .goal_candidates
            .iter()
            .copied()
            .min_by_key(|&i| OrderedFloat(self.arena.nodes()[i].cost));
        match best {
            Some(index) => {
                debug!("{} goal candidates", self.goal_candidates.len());
                self.extract_path(index);
                Ok(self.path.clone())
            }
            None => {
                self.state = PlannerState::Exhausted;
                warn!("No path found within node limit ({} nodes)", self.arena.len());
                Err(PlanningError::NoPathFound {
                    nodes: self.arena.len(),
                })
            }
        }
    }

    /// Run up to `runs` optimization passes over the current path.
    ///
    /// Returns the number of passes executed; stops early once a pass leaves
    /// the path unchanged.
    pub fn optimize(&mut self, runs: usize) -> PlanningResult<usize> {
        if !self.has_path() {
            return Err(PlanningError::NoPathFound {
                nodes: self.arena.len(),
            });
        }
        let optimizer = PathOptimizer::new(self.oracle, &self.config);
        optimizer.optimize(&mut self.path, runs)
    }

    fn validate_request(&self, start: &Point2D, goal: &GoalRegion) -> PlanningResult<()> {
        if goal.is_degenerate() {
            return Err(PlanningError::InvalidConfiguration(format!(
                "goal region must have positive size, got {:?}",
                goal
            )));
        }
        if !self.bounds.contains_rect(goal) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "goal region {:?} lies outside world bounds {:?}",
                goal, self.bounds
            )));
        }
        if !self.bounds.contains(start) || self.oracle.is_blocked(start.x, start.y) {
            return Err(PlanningError::InvalidConfiguration(format!(
                "start ({}, {}) is blocked or outside the world",
                start.x, start.y
            )));
        }
        Ok(())
    }

    /// A node counts for the goal only when it lies inside the region and
    /// the closing leg to the goal center is free.
    fn reaches_goal(&self, goal: &GoalRegion, position: &Point2D) -> bool {
        goal.contains(position)
            && self
                .oracle
                .segment_is_free(position, &goal.center(), self.config.collision_step)
    }

    /// Best feasible parent for `sample` under the connection rule.
    ///
    /// Ties keep the earliest node; nodes sitting exactly on the sample never
    /// qualify.
    fn select_parent(&self, sample: &Point2D) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, node) in self.arena.nodes().iter().enumerate() {
            let edge_length = node.position.distance(sample);
            if edge_length <= 0.0 {
                continue;
            }
            let score = self.strategy.connection.score(node, edge_length);
            let improves = best.map_or(true, |(_, best_score)| score < best_score);
            if improves
                && self
                    .oracle
                    .segment_is_free(&node.position, sample, self.config.collision_step)
            {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    fn extract_path(&mut self, index: usize) {
        let mut points = self.arena.path_to_root(index);
        if let Some(goal) = self.goal {
            points.push(goal.center());
        }
        self.path = Path2D::from_points(points);
        self.goal_index = Some(index);
        self.state = PlannerState::PathFound;
        info!(
            "Path found: {} waypoints, {} nodes, length {:.2}",
            self.path.len(),
            self.arena.len(),
            self.path.total_length()
        );
    }
}

impl<'a, C, R> PathPlanner for RrtPlanner<'a, C, R>
where
    C: CollisionChecker + ?Sized,
    R: Rng,
{
    fn plan(&mut self, start: Point2D, goal: &GoalRegion) -> PlanningResult<Path2D> {
        RrtPlanner::plan(self, start, goal)
    }
}

impl<'a, C, R> SamplingBasedPlanner for RrtPlanner<'a, C, R>
where
    C: CollisionChecker + ?Sized,
    R: Rng,
{
    fn tree(&self) -> &[Node] {
        self.arena.nodes()
    }

    fn set_max_nodes(&mut self, max_nodes: usize) {
        self.config.max_nodes = max_nodes.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use itertools::Itertools;

    fn open_world(x: f64, y: f64) -> bool {
        !(0.0..=200.0).contains(&x) || !(0.0..=200.0).contains(&y)
    }

    fn bounds() -> AreaBounds {
        AreaBounds::from_size(200.0, 200.0)
    }

    #[test]
    fn test_variant_parsing() {
        assert_eq!("basic".parse::<PlannerVariant>().unwrap(), PlannerVariant::Basic);
        assert_eq!("star".parse::<PlannerVariant>().unwrap(), PlannerVariant::Rewiring);
        assert!("dijkstra".parse::<PlannerVariant>().is_err());
        for variant in PlannerVariant::all().iter() {
            assert_eq!(variant.to_string().parse::<PlannerVariant>().unwrap(), *variant);
        }
    }

    #[test]
    fn test_connection_scores() {
        let node = Node {
            position: Point2D::new(0.0, 0.0),
            cost: 7.0,
            parent: Some(0),
        };
        assert_relative_eq!(Connection::Nearest.score(&node, 3.0), 3.0);
        assert_relative_eq!(Connection::MinCost.score(&node, 3.0), 10.0);
    }

    #[test]
    fn test_basic_planner_finds_path() {
        let oracle = open_world;
        let config = RrtConfig::default();
        let mut planner =
            RrtPlanner::seeded(&oracle, bounds(), PlannerVariant::Basic, config, 3).unwrap();
        let goal = GoalRegion::new(90.0, 90.0, 20.0, 20.0);

        let path = planner.plan(Point2D::new(10.0, 10.0), &goal).unwrap();
        assert_eq!(planner.state(), PlannerState::PathFound);
        assert_eq!(path.first(), Some(&Point2D::new(10.0, 10.0)));
        assert_eq!(path.last(), Some(&Point2D::new(100.0, 100.0)));
        assert_eq!(planner.goal_index(), planner.arena().last_index());
    }

    #[test]
    fn test_select_parent_prefers_cost_over_distance() {
        let oracle = open_world;
        let mut planner = RrtPlanner::seeded(
            &oracle,
            bounds(),
            PlannerVariant::CostGreedy,
            RrtConfig::default(),
            0,
        )
        .unwrap();
        // root, an expensive detour node close to the sample
        planner.arena.push_root(Point2D::new(10.0, 10.0));
        let far = planner.arena.push(0, Point2D::new(10.0, 100.0));
        planner.arena.push(far, Point2D::new(50.0, 60.0));
        let sample = Point2D::new(50.0, 50.0);

        assert_eq!(planner.select_parent(&sample), Some(0));
        planner.strategy = PlannerVariant::Basic.into();
        assert_eq!(planner.select_parent(&sample), Some(2));
    }

    #[test]
    fn test_select_parent_skips_blocked_and_coincident() {
        let wall = |x: f64, y: f64| (40.0..60.0).contains(&x) && y < 150.0;
        let mut planner =
            RrtPlanner::seeded(&wall, bounds(), PlannerVariant::Basic, RrtConfig::default(), 0)
                .unwrap();
        planner.arena.push_root(Point2D::new(10.0, 10.0));
        planner.arena.push(0, Point2D::new(90.0, 10.0));

        assert_eq!(planner.select_parent(&Point2D::new(80.0, 10.0)), Some(1));
        assert_eq!(planner.select_parent(&Point2D::new(30.0, 10.0)), Some(0));
        assert_eq!(planner.select_parent(&Point2D::new(90.0, 10.0)), None);
    }

    #[test]
    fn test_invalid_requests() {
        let oracle = open_world;
        let mut planner =
            RrtPlanner::seeded(&oracle, bounds(), PlannerVariant::Basic, RrtConfig::default(), 0)
                .unwrap();
        let start = Point2D::new(10.0, 10.0);

        let outside = GoalRegion::new(190.0, 190.0, 20.0, 20.0);
        assert!(matches!(
            planner.plan(start, &outside),
            Err(PlanningError::InvalidConfiguration(_))
        ));
        let flat = GoalRegion::new(90.0, 90.0, 0.0, 20.0);
        assert!(planner.plan(start, &flat).is_err());
        let goal = GoalRegion::new(90.0, 90.0, 20.0, 20.0);
        assert!(planner.plan(Point2D::new(-5.0, 10.0), &goal).is_err());
        assert_eq!(planner.state(), PlannerState::Idle);
    }

    #[test]
    fn test_invalid_construction() {
        let oracle = open_world;
        let config = RrtConfig {
            expansion_rate: 0.0,
            ..Default::default()
        };
        assert!(RrtPlanner::seeded(&oracle, bounds(), PlannerVariant::Basic, config, 0).is_err());
        assert!(RrtPlanner::seeded(
            &oracle,
            AreaBounds::from_size(0.0, 10.0),
            PlannerVariant::Basic,
            RrtConfig::default(),
            0
        )
        .is_err());
    }

    #[test]
    fn test_reset_clears_state() {
        let oracle = open_world;
        let mut planner =
            RrtPlanner::seeded(&oracle, bounds(), PlannerVariant::Basic, RrtConfig::default(), 5)
                .unwrap();
        planner
            .plan(Point2D::new(10.0, 10.0), &GoalRegion::new(90.0, 90.0, 20.0, 20.0))
            .unwrap();
        assert!(!planner.tree().is_empty());

        planner.reset();
        assert_eq!(planner.state(), PlannerState::Idle);
        assert!(planner.tree().is_empty());
        assert!(planner.path().is_empty());
        assert!(planner.goal_cost().is_none());
        assert!(matches!(
            planner.optimize(1),
            Err(PlanningError::NoPathFound { .. })
        ));
    }

    #[test]
    fn test_cost_greedy_uses_whole_budget() {
        let oracle = open_world;
        let config = RrtConfig {
            max_nodes: 300,
            ..RrtConfig::for_variant(PlannerVariant::CostGreedy)
        };
        let mut planner =
            RrtPlanner::seeded(&oracle, bounds(), PlannerVariant::CostGreedy, config, 11).unwrap();
        let goal = GoalRegion::new(90.0, 90.0, 40.0, 40.0);
        let path = planner.plan(Point2D::new(10.0, 10.0), &goal).unwrap();

        assert_eq!(planner.tree().len(), 300);
        assert!(!planner.goal_candidates().is_empty());
        let best = planner
            .goal_candidates()
            .iter()
            .map(|&i| planner.tree()[i].cost)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(planner.goal_cost().unwrap(), best);
        assert_eq!(path.last(), Some(&goal.center()));
    }

    #[test]
    fn test_nearest_growth_with_best_candidate() {
        let oracle = open_world;
        let strategy = GrowthStrategy {
            connection: Connection::Nearest,
            goal_policy: GoalPolicy::BestCandidate,
            rewire: false,
        };
        let config = RrtConfig {
            max_nodes: 200,
            ..Default::default()
        };
        let mut planner = RrtPlanner::with_strategy(&oracle, bounds(), strategy, config).unwrap();
        assert_eq!(planner.strategy(), strategy);

        let goal = GoalRegion::new(60.0, 60.0, 60.0, 60.0);
        let path = planner.plan(Point2D::new(10.0, 10.0), &goal).unwrap();
        assert_eq!(planner.tree().len(), 200);
        assert_eq!(planner.state(), PlannerState::PathFound);
        assert_eq!(path.last(), Some(&goal.center()));
    }

    #[test]
    fn test_goal_hit_needs_free_leg_to_center() {
        // wall inside the goal rectangle, just left of its center
        let oracle = |x: f64, y: f64| {
            open_world(x, y) || (x > 85.0 && x < 95.0 && y > 85.0 && y < 115.0)
        };
        let goal = GoalRegion::new(80.0, 80.0, 40.0, 40.0);
        let mut found = 0;

        for seed in 1..=5 {
            let mut planner = RrtPlanner::seeded(
                &oracle,
                bounds(),
                PlannerVariant::Basic,
                RrtConfig::default(),
                seed,
            )
            .unwrap();
            if let Ok(path) = planner.plan(Point2D::new(10.0, 10.0), &goal) {
                found += 1;
                assert_eq!(path.last(), Some(&goal.center()));
                for (a, b) in path.points.iter().tuple_windows() {
                    assert!(oracle.segment_is_free(a, b, planner.config().collision_step));
                }
            }
        }
        assert!(found > 0);
    }

    #[test]
    fn test_blocked_goal_center_is_never_reached() {
        let oracle = |x: f64, y: f64| {
            open_world(x, y) || (x > 95.0 && x < 105.0 && y > 95.0 && y < 105.0)
        };
        let goal = GoalRegion::new(80.0, 80.0, 40.0, 40.0);

        for variant in PlannerVariant::all().iter() {
            let config = RrtConfig {
                max_nodes: 300,
                ..RrtConfig::for_variant(*variant)
            };
            let mut planner = RrtPlanner::seeded(&oracle, bounds(), *variant, config, 1).unwrap();
            let result = planner.plan(Point2D::new(10.0, 10.0), &goal);

            assert!(matches!(result, Err(PlanningError::NoPathFound { nodes: 300 })));
            assert_eq!(planner.state(), PlannerState::Exhausted);
            assert!(planner.goal_candidates().is_empty());
        }
    }

    #[test]
    fn test_huge_node_budget_is_not_reserved() {
        let oracle = open_world;
        let config = RrtConfig::from_toml_str("max_nodes = 9000000000000000000").unwrap();
        let mut planner =
            RrtPlanner::seeded(&oracle, bounds(), PlannerVariant::Basic, config, 4).unwrap();
        assert!(planner.arena().is_empty());

        let goal = GoalRegion::new(60.0, 60.0, 60.0, 60.0);
        let path = planner.plan(Point2D::new(10.0, 10.0), &goal).unwrap();
        assert_eq!(path.last(), Some(&goal.center()));
    }
}
