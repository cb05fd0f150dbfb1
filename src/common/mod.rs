//! Common types, traits, and error definitions for radial_rrt
//!
//! This module provides the foundational building blocks shared by the
//! obstacle map, the planners and the path optimizer.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
