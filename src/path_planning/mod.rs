// Path Planning algorithms module

pub mod config;
pub mod node_arena;
pub mod sampler;
pub mod rewire;
pub mod rrt;
pub mod path_optimizer;

pub use config::*;
pub use node_arena::*;
pub use sampler::*;
pub use rrt::*;
pub use path_optimizer::*;
