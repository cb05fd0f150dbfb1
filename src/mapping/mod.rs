// Obstacle world module

pub mod obstacle_map;

pub use obstacle_map::*;
