//! Multi-resolution colour pyramid.
//!
//! Each level stores, per NxN block of the base grid, the maximum cell
//! value in that block; the renderer samples a level instead of the base
//! grid at low zoom. Levels rebuild only over active tiles. The Super
//! variants promote bit 0 into bit 5 before the reduction so odd (live or
//! marked) states outvote even trail states, and mask the bit off again
//! afterwards.

use rayon::prelude::*;

use crate::domain::grid::{ColourGrid, TILE_SIZE};
use crate::domain::tile::TileGrid;

/// One reduction level: cell (x, y) covers base block
/// `[x*factor .. (x+1)*factor) x [y*factor .. (y+1)*factor)`
#[derive(Clone)]
pub struct PyramidLevel {
    factor: usize,
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PyramidLevel {
    pub fn new(grid_width: usize, grid_height: usize, factor: usize) -> Self {
        debug_assert!(factor.is_power_of_two());
        let width = grid_width / factor;
        let height = grid_height / factor;
        Self {
            factor,
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    pub const fn factor(&self) -> usize {
        self.factor
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

#[inline]
fn block_max(colour: &ColourGrid, bx: usize, by: usize, factor: usize, promote: bool) -> u8 {
    let mut max = 0u8;
    for y in by..by + factor {
        let row = colour.row(y as i32);
        for &cell in &row[bx..bx + factor] {
            let v = if promote && cell & 1 != 0 { cell | 0x20 } else { cell };
            if v > max {
                max = v;
            }
        }
    }
    if promote { max & 0x1F } else { max }
}

fn reduce_tiles(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid, promote: bool) {
    let factor = level.factor;
    debug_assert!(factor <= TILE_SIZE);

    tiles.for_each_set(|tx, ty| {
        let x0 = tx * TILE_SIZE;
        let y0 = ty * TILE_SIZE;
        for by in (y0..y0 + TILE_SIZE).step_by(factor) {
            for bx in (x0..x0 + TILE_SIZE).step_by(factor) {
                let max = block_max(colour, bx, by, factor, promote);
                level.set(bx / factor, by / factor, max);
            }
        }
    });
}

/// Level 32 covers 2x2 tile groups: a group rebuilds when any of its four
/// tiles is set
fn reduce_tile_pairs(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid, promote: bool) {
    debug_assert_eq!(level.factor, 2 * TILE_SIZE);

    let set = |tx: usize, ty: usize| {
        tx < tiles.tile_cols() && ty < tiles.tile_rows() && tiles.tile_set(tx, ty)
    };

    for ty in (0..tiles.tile_rows()).step_by(2) {
        for tx in (0..tiles.tile_cols()).step_by(2) {
            let any = set(tx, ty) || set(tx + 1, ty) || set(tx, ty + 1) || set(tx + 1, ty + 1);
            if any {
                let bx = tx * TILE_SIZE;
                let by = ty * TILE_SIZE;
                let max = block_max(colour, bx, by, 2 * TILE_SIZE, promote);
                level.set(tx / 2, ty / 2, max);
            }
        }
    }
}

pub fn create_2x2_colour_grid(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, false);
}

pub fn create_4x4_colour_grid(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, false);
}

pub fn create_8x8_colour_grid(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, false);
}

pub fn create_16x16_colour_grid(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, false);
}

pub fn create_32x32_colour_grid(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tile_pairs(colour, level, tiles, false);
}

pub fn create_2x2_colour_grid_super(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, true);
}

pub fn create_4x4_colour_grid_super(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, true);
}

pub fn create_8x8_colour_grid_super(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, true);
}

pub fn create_16x16_colour_grid_super(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tiles(colour, level, tiles, true);
}

pub fn create_32x32_colour_grid_super(colour: &ColourGrid, level: &mut PyramidLevel, tiles: &TileGrid) {
    reduce_tile_pairs(colour, level, tiles, true);
}

/// The five reduction levels used by the renderer
pub struct ColourPyramid {
    pub levels: [PyramidLevel; 5],
}

impl ColourPyramid {
    pub fn new(grid_width: usize, grid_height: usize) -> Self {
        Self {
            levels: [
                PyramidLevel::new(grid_width, grid_height, 2),
                PyramidLevel::new(grid_width, grid_height, 4),
                PyramidLevel::new(grid_width, grid_height, 8),
                PyramidLevel::new(grid_width, grid_height, 16),
                PyramidLevel::new(grid_width, grid_height, 32),
            ],
        }
    }

    /// Rebuild every level over the active tiles; levels are independent
    /// so they reduce in parallel
    pub fn rebuild(&mut self, colour: &ColourGrid, tiles: &TileGrid, super_promotion: bool) {
        self.levels.par_iter_mut().for_each(|level| {
            if level.factor < 2 * TILE_SIZE {
                reduce_tiles(colour, level, tiles, super_promotion);
            } else {
                reduce_tile_pairs(colour, level, tiles, super_promotion);
            }
        });
    }

    /// Level whose factor matches, if any
    pub fn level(&self, factor: usize) -> Option<&PyramidLevel> {
        self.levels.iter().find(|l| l.factor == factor)
    }
}
