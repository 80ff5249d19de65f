//! Table-driven rule families: decision trees, compressed rule matrices
//! and packed lookup tables.
//!
//! All three iterate the active rectangle double-buffered (read the
//! current grid, write the next) and report the same statistics bundle as
//! the other engines. Cells are state indices; population counts non-zero
//! cells and the alive box equals the occupied box.

pub mod rule_loader;
pub mod rule_table;
pub mod rule_tree;

pub use rule_loader::{LoaderNeighbourhood, PackedLookup, next_generation_rule_loader};
pub use rule_table::{RuleTableLut, TableNeighbourhood, next_generation_rule_table};
pub use rule_tree::{
    RuleTree, next_generation_rule_tree_moore, next_generation_rule_tree_moore_partial4,
    next_generation_rule_tree_vn,
};

use crate::domain::bounds::{BoxTracker, StepStats};
use crate::domain::grid::TILE_SIZE;
use crate::domain::tile::TileGrid;

/// Shared stats accumulator for the state-index families
pub(crate) struct StateTracker {
    width: usize,
    height: usize,
    population: u32,
    births: u32,
    deaths: u32,
    occupied: BoxTracker,
}

impl StateTracker {
    pub(crate) fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            population: 0,
            births: 0,
            deaths: 0,
            occupied: BoxTracker::new(width, height),
        }
    }

    #[inline]
    pub(crate) fn record(&mut self, tiles: &mut TileGrid, x: i32, y: i32, old: u8, new: u8) {
        if new != 0 {
            self.population += 1;
            self.occupied.include_x(x);
            self.occupied.include_y(y);
            tiles.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
            if old == 0 {
                self.births += 1;
            }
        } else if old != 0 {
            self.deaths += 1;
        }
    }

    pub(crate) fn finish(self) -> StepStats {
        let occupied = self.occupied.finish(self.width, self.height);
        StepStats {
            population: self.population,
            births: self.births,
            deaths: self.deaths,
            occupied,
            alive: occupied,
        }
    }
}
