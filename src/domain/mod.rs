pub mod annotated;
pub mod bit_grid;
pub mod bounds;
pub mod generations;
pub mod grid;
pub mod hrot;
pub mod life;
pub mod lookup;
pub mod patterns;
pub mod pens;
pub mod rules;
pub mod simd;
pub mod table;
pub mod tile;

pub use bit_grid::BitGrid;
pub use bounds::{BoxTracker, GridBounds, StepStats};
pub use grid::{ColourGrid, CountGrid, TILE_SIZE};
pub use patterns::{Pattern, presets};
pub use pens::{ALIVE_MAX, ALIVE_START, DEAD_MIN, DEAD_START, GenStates, PenRange};
pub use rules::{ComboList, GenerationsRule, HrotRule, LifeRule, Neighbourhood, RuleError};
pub use tile::{TileGrid, shrink_tile_grid};
