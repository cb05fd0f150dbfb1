//! Radial expansion sampler
//!
//! Draws uniform points over the world and keeps only those inside a disk
//! around the start. Every accepted sample widens the disk by a fixed
//! increment, so the tree grows outward from the start.

use rand::Rng;

use crate::common::{AreaBounds, Point2D};

#[derive(Debug, Clone)]
pub struct RadialSampler {
    center: Point2D,
    bounds: AreaBounds,
    increment: f64,
    radius: f64,
}

impl RadialSampler {
    /// The disk starts with a radius of one increment
    pub fn new(center: Point2D, bounds: AreaBounds, increment: f64) -> Self {
        RadialSampler {
            center,
            bounds,
            increment,
            radius: increment,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn center(&self) -> Point2D {
        self.center
    }

    /// Restart from the initial disk around a (possibly new) center
    pub fn reset(&mut self, center: Point2D) {
        self.center = center;
        self.radius = self.increment;
    }

    /// Rejection-sample a point strictly inside the current disk.
    ///
    /// The loop has no iteration cap: it only ends once a world sample falls
    /// inside the disk.
    pub fn sample<R: Rng>(&mut self, rng: &mut R) -> Point2D {
        loop {
            let p = Point2D::new(
                rng.gen_range(self.bounds.xmin..=self.bounds.xmax),
                rng.gen_range(self.bounds.ymin..=self.bounds.ymax),
            );
            if self.center.distance(&p) < self.radius {
                self.radius += self.increment;
                return p;
            }
        }
    }
}
