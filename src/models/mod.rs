// Core models
pub mod player;
pub mod match_model;
pub mod stats;

// Re-export commonly used types
pub use player::*;
pub use match_model::*;
pub use stats::*;
