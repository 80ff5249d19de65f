//! Life-like engine: two-state outer-totalistic rules on the Moore
//! neighbourhood, evaluated 16 cells at a time over the active tiles.
//!
//! Per chunk the engine forms three 18-bit windows (row above, current row,
//! row below), splits them into four slice triples and resolves each triple
//! through the rule's 2^18-entry table. Cells outside the grid read as dead;
//! the bounded-grid kernels pre-fill borders when wrapping is wanted.

use super::bit_grid::BitGrid;
use super::bounds::{BoxTracker, GridBounds, StepStats};
use super::grid::{ColourGrid, TILE_SIZE};
use super::lookup::LifeLookup;
use super::pens::PenRange;
use super::tile::TileGrid;

/// Results of one Life-like generation.
pub struct LifeStep {
    pub stats: StepStats,
    /// One bit per 16-wide column chunk that changed state (tile-word encoding)
    pub columns_touched: Vec<u16>,
    /// One bit per 16-tall row chunk that changed state
    pub rows_touched: Vec<u16>,
}

pub struct LifeEngine {
    pub lookup: LifeLookup,
}

/// 18-bit window for a chunk row: one bit borrowed from each horizontal
/// neighbour so edge cells see their true neighbourhood
#[inline]
fn window18(grid: &BitGrid, wx: i32, y: i32) -> u32 {
    let left = (grid.word(wx - 1, y) & 1) as u32;
    let chunk = grid.word(wx, y) as u32;
    let right = (grid.word(wx + 1, y) >> 15) as u32;
    (left << 17) | (chunk << 1) | right
}

/// Resolve the three windows through the lookup table, four cells at a time
#[inline]
fn evaluate_windows(table: &[u8], above: u32, current: u32, below: u32) -> u16 {
    let mut out = 0u16;
    for k in 0..4 {
        let shift = 12 - 4 * k;
        let idx = (((above >> shift) & 0x3F) << 12)
            | (((current >> shift) & 0x3F) << 6)
            | ((below >> shift) & 0x3F);
        out |= (table[idx as usize] as u16) << shift;
    }
    out
}

impl LifeEngine {
    pub fn new(lookup: LifeLookup) -> Self {
        Self { lookup }
    }

    /// Advance one generation over the active tiles.
    ///
    /// Reads `src`, writes every word of every active tile into `dst`, and
    /// rebuilds `next_tiles` from the surviving output plus one-tile
    /// expansion wherever a tile's edge cells changed.
    pub fn next_generation(
        &self,
        src: &BitGrid,
        dst: &mut BitGrid,
        tiles: &TileGrid,
        next_tiles: &mut TileGrid,
        generation: u64,
    ) -> LifeStep {
        let table = self.lookup.table_for(generation);
        let (width, height) = src.dimensions();
        let word_width = src.word_width();

        next_tiles.clear();

        let mut col_or = vec![0u16; word_width];
        let mut y_box = BoxTracker::new(width, height);
        let mut columns_touched = vec![0u16; word_width.div_ceil(16)];
        let mut rows_touched = vec![0u16; tiles.tile_rows().div_ceil(16)];

        let mut population = 0u32;
        let mut births = 0u32;
        let mut deaths = 0u32;

        tiles.for_each_set(|tx, ty| {
            let wx = tx as i32;
            let y0 = (ty * TILE_SIZE) as i32;

            let mut tile_out = 0u16;
            let mut tile_diff = 0u16;
            let mut first_diff = 0u16;
            let mut last_diff = 0u16;

            for dy in 0..TILE_SIZE as i32 {
                let y = y0 + dy;
                let above = window18(src, wx, y - 1);
                let current = window18(src, wx, y);
                let below = window18(src, wx, y + 1);

                let new = evaluate_windows(table, above, current, below);
                let old = src.word(wx, y);
                dst.set_word(tx, y as usize, new);

                let diff = new ^ old;
                tile_out |= new;
                tile_diff |= diff;
                if dy == 0 {
                    first_diff = diff;
                }
                if dy == TILE_SIZE as i32 - 1 {
                    last_diff = diff;
                }

                births += (new & !old).count_ones();
                deaths += (old & !new).count_ones();
                population += new.count_ones();

                if new != 0 {
                    col_or[tx] |= new;
                    y_box.include_y(y);
                }
            }

            if tile_out != 0 {
                next_tiles.set_tile(tx, ty);
            }
            next_tiles.mark_changed(tx, ty, tile_diff, first_diff, last_diff);

            if tile_diff != 0 {
                columns_touched[tx >> 4] |= 1 << (15 - (tx & 15));
                rows_touched[ty >> 4] |= 1 << (15 - (ty & 15));
            }
        });

        // refine the x extents inside the extremal chunk words
        let mut x_box = BoxTracker::new(width, height);
        for (wx, &or) in col_or.iter().enumerate() {
            if or != 0 {
                x_box.include_x((wx * 16) as i32 + or.leading_zeros() as i32);
                x_box.include_x((wx * 16) as i32 + 15 - or.trailing_zeros() as i32);
            }
        }

        let x_bounds = x_box.finish(width, height);
        let y_bounds = y_box.finish(width, height);
        let alive = GridBounds {
            left: x_bounds.left,
            right: x_bounds.right,
            bottom: y_bounds.bottom,
            top: y_bounds.top,
        };

        LifeStep {
            stats: StepStats {
                population,
                births,
                deaths,
                occupied: alive,
                alive,
            },
            columns_touched,
            rows_touched,
        }
    }
}

/// Recompute the live bounding box from the bit grid, refining the extremal
/// words with leading/trailing-zero counts. Collapses to the grid centre
/// when empty.
pub fn reset_boxes_bit(grid: &BitGrid) -> GridBounds {
    let (width, height) = grid.dimensions();
    let mut tracker = BoxTracker::new(width, height);
    let mut col_or = vec![0u16; grid.word_width()];

    for y in 0..height as i32 {
        let mut row_occupied = false;
        for (wx, or) in col_or.iter_mut().enumerate() {
            let word = grid.word(wx as i32, y);
            if word != 0 {
                *or |= word;
                row_occupied = true;
            }
        }
        if row_occupied {
            tracker.include_y(y);
        }
    }

    for (wx, &or) in col_or.iter().enumerate() {
        if or != 0 {
            tracker.include_x((wx * 16) as i32 + or.leading_zeros() as i32);
            tracker.include_x((wx * 16) as i32 + 15 - or.trailing_zeros() as i32);
        }
    }

    tracker.finish(width, height)
}

/// Recompute the population from the bit grid
pub fn reset_population_bit(grid: &BitGrid) -> u32 {
    grid.population()
}

/// Rebuild the colour grid from the bit grid: live cells take the base pen,
/// everything else is cleared
pub fn reset_colour_grid_normal(bits: &BitGrid, colour: &mut ColourGrid, pens: &PenRange) {
    let (width, height) = bits.dimensions();
    for y in 0..height {
        let row = colour.row_mut(y as i32);
        for wx in 0..width / 16 {
            let word = bits.word(wx as i32, y as i32);
            for b in 0..16 {
                row[wx * 16 + b] = if word & (0x8000 >> b) != 0 {
                    pens.alive_start
                } else {
                    0
                };
            }
        }
    }
}

/// Bit grid to pens: newly live cells get the base pen value, dead cells
/// are cleared (no fade history)
pub fn convert_to_pens_2(bits: &BitGrid, colour: &mut ColourGrid, tiles: &TileGrid, pens: &PenRange) {
    for_each_tile_cell(bits, colour, tiles, |live, pen| {
        if live {
            if pen < pens.alive_start { pens.alive_start } else { pen }
        } else {
            0
        }
    });
}

/// Bit grid to pens with ageing: live cells count up to the pen maximum,
/// dead cells fade down to the pen minimum; never-alive cells stay 0
pub fn convert_to_pens_age(bits: &BitGrid, colour: &mut ColourGrid, tiles: &TileGrid, pens: &PenRange) {
    let alive_start = pens.alive_start;
    let alive_max = pens.alive_max;
    let dead_start = pens.dead_start;
    let dead_min = pens.dead_min;
    for_each_tile_cell(bits, colour, tiles, |live, pen| {
        if live {
            if pen < alive_start {
                alive_start
            } else if pen < alive_max {
                pen + 1
            } else {
                pen
            }
        } else if pen >= alive_start {
            dead_start
        } else if pen > dead_min {
            pen - 1
        } else {
            pen
        }
    });
}

/// Neighbour-density shading: live cells take the base pen plus a weighted
/// live-neighbour sum, dead cells fade as in the age palette
pub fn convert_to_pens_neighbours(
    bits: &BitGrid,
    colour: &mut ColourGrid,
    tiles: &TileGrid,
    pens: &PenRange,
) {
    const WEIGHTS: [[u8; 3]; 3] = [[1, 5, 1], [5, 0, 5], [1, 5, 1]];

    tiles.for_each_set(|tx, ty| {
        let x0 = tx * TILE_SIZE;
        let y0 = ty * TILE_SIZE;
        for y in y0..y0 + TILE_SIZE {
            for x in x0..x0 + TILE_SIZE {
                let pen = colour.get(x as i32, y as i32);
                let next = if bits.get(x, y) {
                    let mut sum = pens.alive_start as u32;
                    for (dy, row) in WEIGHTS.iter().enumerate() {
                        for (dx, &w) in row.iter().enumerate() {
                            let nx = x as i32 + dx as i32 - 1;
                            let ny = y as i32 + dy as i32 - 1;
                            if nx >= 0 && ny >= 0 && bits.get(nx as usize, ny as usize) {
                                sum += w as u32;
                            }
                        }
                    }
                    sum.min(pens.alive_max as u32) as u8
                } else if pen >= pens.alive_start {
                    pens.dead_start
                } else if pen > pens.dead_min {
                    pen - 1
                } else {
                    pen
                };
                colour.set(x as i32, y as i32, next);
            }
        }
    });
}

fn for_each_tile_cell(
    bits: &BitGrid,
    colour: &mut ColourGrid,
    tiles: &TileGrid,
    f: impl Fn(bool, u8) -> u8,
) {
    tiles.for_each_set(|tx, ty| {
        let x0 = tx * TILE_SIZE;
        let y0 = ty * TILE_SIZE;
        for y in y0..y0 + TILE_SIZE {
            let word = bits.word(tx as i32, y as i32);
            let row = colour.row_mut(y as i32);
            for b in 0..TILE_SIZE {
                let live = word & (0x8000 >> b) != 0;
                row[x0 + b] = f(live, row[x0 + b]);
            }
        }
    });
}
