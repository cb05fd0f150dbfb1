//! Obstacle map with inflated pathfinding obstacles
//!
//! Holds rectangular and circular obstacles together with copies grown by a
//! safety offset. The grown copies and a border strip of the same width are
//! what the planners see through [`CollisionChecker`].

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::common::{AreaBounds, CollisionChecker, PlanningError, PlanningResult, Point2D};

/// Default safety offset around obstacles and world borders
pub const DEFAULT_INFLATION: f64 = 20.0;

/// Rectangle anchored at its lower corner, or circle around its center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Rectangle { x: f64, y: f64, w: f64, h: f64 },
    Circle { x: f64, y: f64, r: f64 },
}

impl Obstacle {
    pub fn rectangle(x: f64, y: f64, w: f64, h: f64) -> Self {
        Obstacle::Rectangle { x, y, w, h }
    }

    pub fn circle(x: f64, y: f64, r: f64) -> Self {
        Obstacle::Circle { x, y, r }
    }

    /// Strict interior containment
    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        match *self {
            Obstacle::Rectangle { x, y, w, h } => px > x && px < x + w && py > y && py < y + h,
            Obstacle::Circle { x, y, r } => Point2D::new(x, y).distance_to(px, py) < r,
        }
    }

    /// Copy grown by `offset` on every side
    pub fn inflated(&self, offset: f64) -> Self {
        match *self {
            Obstacle::Rectangle { x, y, w, h } => {
                Obstacle::rectangle(x - offset, y - offset, w + 2.0 * offset, h + 2.0 * offset)
            }
            Obstacle::Circle { x, y, r } => Obstacle::circle(x, y, r + offset),
        }
    }

    /// Axis-aligned bounding box as `(xmin, ymin, xmax, ymax)`
    pub fn bounding_box(&self) -> (f64, f64, f64, f64) {
        match *self {
            Obstacle::Rectangle { x, y, w, h } => (x, y, x + w, y + h),
            Obstacle::Circle { x, y, r } => (x - r, y - r, x + r, y + r),
        }
    }

    /// Bounding-box overlap, used to keep random maps free of stacked obstacles
    pub fn overlaps(&self, other: &Obstacle) -> bool {
        let (ax0, ay0, ax1, ay1) = self.bounding_box();
        let (bx0, by0, bx1, by1) = other.bounding_box();
        ax0 < bx1 && ax1 > bx0 && ay0 < by1 && ay1 > by0
    }
}

/// World of a given size populated with obstacles
#[derive(Debug, Clone)]
pub struct ObstacleMap {
    width: f64,
    height: f64,
    inflation: f64,
    obstacles: Vec<Obstacle>,
    inflated: Vec<Obstacle>,
}

impl ObstacleMap {
    /// Create an empty map
    pub fn new(width: f64, height: f64, inflation: f64) -> Self {
        ObstacleMap {
            width,
            height,
            inflation,
            obstacles: Vec::new(),
            inflated: Vec::new(),
        }
    }

    /// Build one of the predefined layouts
    pub fn preset(id: u32, width: f64, height: f64, inflation: f64) -> PlanningResult<Self> {
        let mut map = Self::new(width, height, inflation);
        match id {
            0 => {
                map.add_rectangle(300.0, 0.0, 25.0, 125.0);
                map.add_rectangle(0.0, 200.0, 500.0, 25.0);
                map.add_rectangle(500.0, 200.0, 25.0, 300.0);
                map.add_rectangle(525.0, 350.0, 150.0, 25.0);
                map.add_rectangle(675.0, 350.0, 25.0, 300.0);
                map.add_rectangle(250.0, 350.0, 25.0, 350.0);
                map.add_rectangle(275.0, 500.0, 250.0, 25.0);

                map.add_circle(500.0, 650.0, 60.0);
                map.add_rectangle(440.0, 650.0, 120.0, 150.0);

                map.add_circle(700.0, 150.0, 50.0);
                map.add_rectangle(650.0, 0.0, 150.0, 150.0);
                map.add_rectangle(700.0, 150.0, 100.0, 50.0);

                map.add_circle(200.0, 400.0, 50.0);
                map.add_rectangle(200.0, 350.0, 75.0, 100.0);

                map.add_circle(50.0, 600.0, 100.0);
                map.add_rectangle(0.0, 500.0, 50.0, 200.0);

                map.add_circle(500.0, 200.0, 75.0);
            }
            1 => {
                map.add_circle(width / 2.0, height / 2.0, 100.0);
                map.add_circle(width / 2.0 + 100.0, height / 2.0, 100.0);
                map.add_rectangle(width / 2.0, height / 2.0 - 100.0, 100.0, 200.0);
            }
            3 => {
                map.add_rectangle(0.0, 300.0, 400.0, 25.0);
                map.add_rectangle(375.0, 100.0, 25.0, 200.0);
                map.add_rectangle(100.0, 100.0, 150.0, 100.0);
                map.add_rectangle(525.0, 125.0, 250.0, 150.0);
                map.add_rectangle(575.0, 350.0, 25.0, 150.0);
                map.add_circle(200.0, 500.0, 75.0);
                map.add_rectangle(200.0, 425.0, 175.0, 150.0);
                map.add_rectangle(500.0, 500.0, 300.0, 25.0);
                map.add_rectangle(700.0, 525.0, 25.0, 200.0);
                map.add_rectangle(450.0, 600.0, 150.0, 75.0);
            }
            other => {
                return Err(PlanningError::InvalidConfiguration(format!(
                    "unknown map preset {}",
                    other
                )))
            }
        }
        debug!("Map preset {}: {} obstacles", id, map.obstacles.len());
        Ok(map)
    }

    /// Random map of non-overlapping rectangles and circles
    pub fn random<R: Rng>(
        amount: usize,
        width: f64,
        height: f64,
        inflation: f64,
        rng: &mut R,
    ) -> Self {
        let mut map = Self::new(width, height, inflation);
        let max_attempts = amount.saturating_mul(1000);
        let mut attempts = 0;

        while map.obstacles.len() < amount && attempts < max_attempts {
            attempts += 1;
            let x = rng.gen_range(0.0..=width).round();
            let y = rng.gen_range(0.0..=height).round();
            let obstacle = if rng.gen_bool(0.5) {
                Obstacle::rectangle(
                    x,
                    y,
                    rng.gen_range(25.0..=150.0_f64).round(),
                    rng.gen_range(25.0..=150.0_f64).round(),
                )
            } else {
                Obstacle::circle(x, y, rng.gen_range(25.0..=90.0_f64).round())
            };

            if !map.obstacles.iter().any(|o| o.overlaps(&obstacle)) {
                map.add_obstacle(obstacle);
            }
        }

        if map.obstacles.len() < amount {
            warn!(
                "Random map: placed {} of {} obstacles after {} attempts",
                map.obstacles.len(),
                amount,
                attempts
            );
        }
        map
    }

    pub fn add_rectangle(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.add_obstacle(Obstacle::rectangle(x, y, w, h));
    }

    pub fn add_circle(&mut self, x: f64, y: f64, r: f64) {
        self.add_obstacle(Obstacle::circle(x, y, r));
    }

    /// Add an obstacle together with its inflated pathfinding copy
    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.inflated.push(obstacle.inflated(self.inflation));
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn inflation(&self) -> f64 {
        self.inflation
    }

    pub fn bounds(&self) -> AreaBounds {
        AreaBounds::from_size(self.width, self.height)
    }

    /// Collision against the raw obstacles, without the safety offset
    pub fn is_point_in_obstacle(&self, x: f64, y: f64) -> bool {
        if x < 0.0 || x > self.width || y < 0.0 || y > self.height {
            return true;
        }
        self.obstacles.iter().any(|o| o.contains_point(x, y))
    }
}

impl CollisionChecker for ObstacleMap {
    fn is_blocked(&self, x: f64, y: f64) -> bool {
        if x < self.inflation
            || x > self.width - self.inflation
            || y < self.inflation
            || y > self.height - self.inflation
        {
            return true;
        }
        self.inflated.iter().any(|o| o.contains_point(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_inflation_blocks_margin() {
        let mut map = ObstacleMap::new(800.0, 800.0, 20.0);
        map.add_rectangle(100.0, 100.0, 50.0, 50.0);

        assert!(map.is_blocked(90.0, 120.0));
        assert!(!map.is_point_in_obstacle(90.0, 120.0));
        assert!(map.is_point_in_obstacle(120.0, 120.0));
        assert!(!map.is_blocked(75.0, 120.0));
    }

    #[test]
    fn test_border_strip_is_blocked() {
        let map = ObstacleMap::new(800.0, 800.0, 20.0);
        assert!(map.is_blocked(10.0, 400.0));
        assert!(map.is_blocked(400.0, 790.0));
        assert!(!map.is_blocked(20.0, 20.0));
        assert!(map.is_blocked(-5.0, 400.0));
    }

    #[test]
    fn test_circle_inflation() {
        let circle = Obstacle::circle(0.0, 0.0, 10.0).inflated(5.0);
        assert!(circle.contains_point(14.0, 0.0));
        assert!(!circle.contains_point(15.0, 0.0));
    }

    #[test]
    fn test_presets() {
        assert_eq!(ObstacleMap::preset(0, 800.0, 800.0, 20.0).unwrap().obstacles().len(), 17);
        assert_eq!(ObstacleMap::preset(1, 800.0, 800.0, 20.0).unwrap().obstacles().len(), 3);
        assert_eq!(ObstacleMap::preset(3, 800.0, 800.0, 20.0).unwrap().obstacles().len(), 10);
        assert!(ObstacleMap::preset(2, 800.0, 800.0, 20.0).is_err());
    }

    #[test]
    fn test_random_map_has_no_overlaps() {
        let mut rng = StdRng::seed_from_u64(7);
        let map = ObstacleMap::random(10, 800.0, 800.0, 20.0, &mut rng);
        let obstacles = map.obstacles();
        for (i, a) in obstacles.iter().enumerate() {
            for b in &obstacles[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }
}
