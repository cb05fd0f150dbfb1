//! Index-addressed node store for the planner tree
//!
//! Nodes are appended and never removed during a run, so a node's index is
//! its identity and parent links are plain indices into the arena.

use serde::{Deserialize, Serialize};

use crate::common::Point2D;

/// Tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub position: Point2D,
    /// Accumulated path length from the root
    pub cost: f64,
    /// `None` only for the root
    pub parent: Option<usize>,
}

impl Node {
    pub fn root(position: Point2D) -> Self {
        Node {
            position,
            cost: 0.0,
            parent: None,
        }
    }
}

/// Append-only node arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Insert the root; the arena must be empty
    pub fn push_root(&mut self, position: Point2D) -> usize {
        debug_assert!(self.nodes.is_empty(), "root pushed into non-empty arena");
        self.nodes.push(Node::root(position));
        0
    }

    /// Append a node attached to `parent`, returning its index
    pub fn push(&mut self, parent: usize, position: Point2D) -> usize {
        let from = &self.nodes[parent];
        let cost = from.cost + from.position.distance(&position);
        self.nodes.push(Node {
            position,
            cost,
            parent: Some(parent),
        });
        self.nodes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn last_index(&self) -> Option<usize> {
        self.nodes.len().checked_sub(1)
    }

    /// Largest accumulated cost in the tree, used for cost coloring
    pub fn highest_cost(&self) -> f64 {
        self.nodes.iter().map(|n| n.cost).fold(0.0, f64::max)
    }

    /// Positions from the root down to `index`.
    ///
    /// The walk takes at most `len()` steps.
    pub fn path_to_root(&self, index: usize) -> Vec<Point2D> {
        let mut points = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            if points.len() > self.nodes.len() {
                break;
            }
            let node = &self.nodes[i];
            points.push(node.position);
            current = node.parent;
        }
        points.reverse();
        points
    }

    /// True if `ancestor` lies on the parent chain of `index` (or is `index`)
    pub fn is_ancestor(&self, ancestor: usize, index: usize) -> bool {
        let mut current = Some(index);
        let mut steps = 0;
        while let Some(i) = current {
            if i == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.nodes[i].parent;
        }
        false
    }

    /// Attach `child` to `new_parent` if that strictly lowers its cost.
    ///
    /// The root is never reparented and a node never becomes its own
    /// ancestor. Descendants of `child` get their costs lowered by the same
    /// amount. Returns whether the edge was changed.
    pub fn reparent(&mut self, child: usize, new_parent: usize) -> bool {
        if child == new_parent || self.nodes[child].parent.is_none() {
            return false;
        }
        let candidate = {
            let from = &self.nodes[new_parent];
            from.cost + from.position.distance(&self.nodes[child].position)
        };
        if candidate >= self.nodes[child].cost || self.is_ancestor(child, new_parent) {
            return false;
        }

        self.nodes[child].parent = Some(new_parent);
        self.nodes[child].cost = candidate;
        self.propagate_cost_to_leaves(child);
        true
    }

    fn propagate_cost_to_leaves(&mut self, parent_index: usize) {
        let mut stack = vec![parent_index];
        while let Some(p) = stack.pop() {
            let (parent_pos, parent_cost) = (self.nodes[p].position, self.nodes[p].cost);
            for i in 0..self.nodes.len() {
                if self.nodes[i].parent == Some(p) {
                    let node = &mut self.nodes[i];
                    node.cost = parent_cost + parent_pos.distance(&node.position);
                    stack.push(i);
                }
            }
        }
    }
}
