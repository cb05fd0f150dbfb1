//! Local rewiring around a freshly inserted node
//!
//! After every insertion the rewiring variant looks at the nodes within a
//! shrinking radius of the new node and, for every ordered pair of them,
//! reattaches the second to the first when that strictly lowers its cost and
//! the straight edge between them is collision free.

use itertools::iproduct;
use log::trace;

use crate::common::CollisionChecker;
use crate::path_planning::NodeArena;

/// Rewiring radius `factor / node_count`.
///
/// With the default factor of `max_nodes * reroute_distance` the radius
/// shrinks to `reroute_distance` once the node budget is reached.
pub fn rewiring_radius(factor: f64, node_count: usize) -> f64 {
    factor / node_count.max(1) as f64
}

/// Rewire the neighbourhood of `new_index`, returning the number of edges
/// that changed.
pub fn rewire<C>(
    arena: &mut NodeArena,
    oracle: &C,
    new_index: usize,
    radius: f64,
    collision_step: f64,
) -> usize
where
    C: CollisionChecker + ?Sized,
{
    let center = arena.nodes()[new_index].position;
    let near: Vec<usize> = arena
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| node.position.distance(&center) < radius)
        .map(|(i, _)| i)
        .collect();

    let mut rewired = 0;
    for (i, j) in iproduct!(near.iter().copied(), near.iter().copied()) {
        if i == j {
            continue;
        }
        let (from, to) = (&arena.nodes()[i], &arena.nodes()[j]);
        let distance = from.position.distance(&to.position);
        if distance <= 0.0 || from.cost + distance >= to.cost {
            continue;
        }
        if oracle.segment_is_free(&from.position, &to.position, collision_step)
            && arena.reparent(j, i)
        {
            rewired += 1;
        }
    }

    if rewired > 0 {
        trace!(
            "Rewired {} edges around node {} (radius {:.1}, {} neighbours)",
            rewired,
            new_index,
            radius,
            near.len()
        );
    }
    rewired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Point2D;
    use approx::assert_relative_eq;

    fn open(_x: f64, _y: f64) -> bool {
        false
    }

    #[test]
    fn test_rewiring_radius_formula() {
        assert_relative_eq!(rewiring_radius(750.0 * 50.0, 750), 50.0);
        assert_relative_eq!(rewiring_radius(750.0 * 50.0, 75), 500.0);
        assert_relative_eq!(rewiring_radius(100.0, 0), 100.0);
    }

    #[test]
    fn test_rewire_shortcuts_detour() {
        // 0 -> 1 -> 2 goes around, 3 sits next to the root
        let mut arena = NodeArena::new();
        arena.push_root(Point2D::new(0.0, 0.0));
        arena.push(0, Point2D::new(0.0, 50.0));
        arena.push(1, Point2D::new(20.0, 10.0));
        let new_index = arena.push(0, Point2D::new(10.0, 0.0));

        let changed = rewire(&mut arena, &open, new_index, 100.0, 5.0);
        assert!(changed >= 1);
        let node = &arena.nodes()[2];
        let parent = &arena.nodes()[node.parent.unwrap()];
        assert_relative_eq!(node.cost, parent.cost + parent.position.distance(&node.position));
        assert!(node.cost <= 500.0_f64.sqrt() + 1e-9);
        assert_eq!(arena.nodes()[0].parent, None);
    }

    #[test]
    fn test_rewire_respects_obstacles_and_radius() {
        let wall = |x: f64, y: f64| (5.0..15.0).contains(&x) && y > 5.0 && y < 45.0;
        let mut arena = NodeArena::new();
        arena.push_root(Point2D::new(0.0, 0.0));
        arena.push(0, Point2D::new(0.0, 50.0));
        arena.push(1, Point2D::new(20.0, 50.0));
        let new_index = arena.push(0, Point2D::new(20.0, 20.0));
        let before: Vec<f64> = arena.nodes().iter().map(|n| n.cost).collect();

        // tiny radius: only the new node itself is near
        assert_eq!(rewire(&mut arena, &open, new_index, 1.0, 2.0), 0);

        rewire(&mut arena, &wall, new_index, 100.0, 2.0);
        for (node, old) in arena.nodes().iter().zip(before.iter()) {
            assert!(node.cost <= *old);
        }
        // 2 can hang off 3 instead of going round through 1
        assert_eq!(arena.nodes()[2].parent, Some(3));
        assert_relative_eq!(arena.nodes()[2].cost, 800.0_f64.sqrt() + 30.0);
    }
}
