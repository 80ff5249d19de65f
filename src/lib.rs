// Domain layer - rule engines and the shared data model
pub mod domain;

// Application layer - engine orchestration and camera
pub mod application;

// Identification - occupancy frames, cell counts and content hashes
pub mod identify;

// Rendering - colour pyramid and rasteriser
pub mod rendering;

// Re-exports for convenience
pub use application::{Camera, EdgePolicy, Engine, RuleKind};
pub use domain::{
    BitGrid, ColourGrid, GenerationsRule, GridBounds, HrotRule, LifeRule, Neighbourhood,
    Pattern, StepStats, TileGrid, presets,
};
pub use rendering::ColourPyramid;
