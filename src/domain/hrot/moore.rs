//! Fused HROT Moore kernel.
//!
//! Consumes the summed-area table directly: the range-r window sum at
//! (x, y) is the four-corner difference
//! `C(y+r, x+r) − C(y+r, x−r−1) − C(y−r−1, x+r) + C(y−r−1, x−r−1)`.
//! The aligned middle of each row resolves 16 cells per step through the
//! shared pen-blend block; X extents are reported through the column-used
//! byte vector (bit 0 occupied, bit 1 alive) rather than the stats.

use crate::domain::bounds::{BoxTracker, GridBounds, StepStats};
use crate::domain::grid::{ColourGrid, CountGrid, TILE_SIZE};
use crate::domain::pens::{GenStates, PenRange};
use crate::domain::rules::ComboList;
use crate::domain::tile::TileGrid;

use super::update::{apply_combo_block, step_cell_2, step_cell_n};

pub const COL_OCCUPIED: u8 = 1;
pub const COL_ALIVE: u8 = 2;

#[inline]
fn window_sum(counts: &CountGrid, x: i32, y: i32, rx: i32, ry: i32) -> i32 {
    counts.get(x + rx, y + ry) + counts.get(x - rx - 1, y - ry - 1)
        - counts.get(x - rx - 1, y + ry)
        - counts.get(x + rx, y - ry - 1)
}

/// Advance the two-state grid over the rectangle. `col_used` accumulates
/// per-column occupied/alive flags for the bounding-box refinement.
pub fn next_generation_hrot_moore_2(
    colour: &mut ColourGrid,
    tile_history: &mut TileGrid,
    counts: &CountGrid,
    combo: &ComboList,
    col_used: &mut [u8],
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    pens: &PenRange,
) -> StepStats {
    let width = colour.width();
    let height = colour.height();

    let mut population = 0u32;
    let mut births = 0u32;
    let mut deaths = 0u32;
    let mut occupied = BoxTracker::new(width, height);
    let mut alive = BoxTracker::new(width, height);

    let mut aligned_start = (bounds.left + 15) & !15;
    let aligned_end = bounds.right & !15;
    if aligned_start > bounds.right {
        aligned_start = bounds.right + 1;
    }

    for y in bounds.bottom..=bounds.top {
        let mut row_occupied = false;
        let mut row_alive = false;

        let mut x = bounds.left;

        while x < aligned_start {
            let state = colour.get(x, y);
            let sb = combo.get(window_sum(counts, x, y, xrange, yrange));
            let state = step_cell_2(state, sb, pens, &mut births, &mut deaths);
            colour.set(x, y, state);

            if state > pens.dead_min {
                row_occupied = true;
                col_used[x as usize] |= COL_OCCUPIED;
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                if state >= pens.alive_start {
                    population += 1;
                    row_alive = true;
                    col_used[x as usize] |= COL_ALIVE;
                }
            }
            x += 1;
        }

        while x < aligned_end {
            let mut sb = [0u8; 16];
            for (i, entry) in sb.iter_mut().enumerate() {
                *entry = combo.get(window_sum(counts, x + i as i32, y, xrange, yrange));
            }

            let row = colour.row_mut(y);
            let outcome = apply_combo_block(&mut row[x as usize..], sb, pens);
            births += outcome.births;
            deaths += outcome.deaths;
            population += outcome.population;

            if outcome.occupied_bits != 0 {
                row_occupied = true;
                let mut bits = outcome.occupied_bits;
                while bits != 0 {
                    let i = bits.trailing_zeros() as usize;
                    col_used[x as usize + i] |= COL_OCCUPIED;
                    bits &= bits - 1;
                }

                if outcome.alive_bits != 0 {
                    row_alive = true;
                    tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                    let mut bits = outcome.alive_bits;
                    while bits != 0 {
                        let i = bits.trailing_zeros() as usize;
                        col_used[x as usize + i] |= COL_ALIVE;
                        bits &= bits - 1;
                    }
                }
            }

            x += 16;
        }

        while x <= bounds.right {
            let state = colour.get(x, y);
            let sb = combo.get(window_sum(counts, x, y, xrange, yrange));
            let state = step_cell_2(state, sb, pens, &mut births, &mut deaths);
            colour.set(x, y, state);

            if state > pens.dead_min {
                row_occupied = true;
                col_used[x as usize] |= COL_OCCUPIED;
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                if state >= pens.alive_start {
                    population += 1;
                    row_alive = true;
                    col_used[x as usize] |= COL_ALIVE;
                }
            }
            x += 1;
        }

        if row_occupied {
            occupied.include_y(y);
            if row_alive {
                alive.include_y(y);
            }
        }
    }

    // refine the x extents from the column flags
    for (x, &flags) in col_used.iter().enumerate() {
        if flags & COL_OCCUPIED != 0 {
            occupied.include_x(x as i32);
        }
        if flags & COL_ALIVE != 0 {
            alive.include_x(x as i32);
        }
    }

    StepStats {
        population,
        births,
        deaths,
        occupied: occupied.finish(width, height),
        alive: alive.finish(width, height),
    }
}

/// N-state fused Moore kernel
pub fn next_generation_hrot_moore_n(
    colour: &mut ColourGrid,
    tile_history: &mut TileGrid,
    counts: &CountGrid,
    combo: &ComboList,
    col_used: &mut [u8],
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    states: &GenStates,
) -> StepStats {
    let width = colour.width();
    let height = colour.height();

    let mut population = 0u32;
    let mut births = 0u32;
    let mut deaths = 0u32;
    let mut occupied = BoxTracker::new(width, height);
    let mut alive = BoxTracker::new(width, height);

    for y in bounds.bottom..=bounds.top {
        let mut row_occupied = false;
        let mut row_alive = false;

        for x in bounds.left..=bounds.right {
            let state = colour.get(x, y);
            let sb = combo.get(window_sum(counts, x, y, xrange, yrange));
            let next = step_cell_n(state, sb, states, &mut births, &mut deaths);
            colour.set(x, y, next);

            if next > states.min_dead_state {
                row_occupied = true;
                col_used[x as usize] |= COL_OCCUPIED;
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                if next == states.max_gen_state {
                    population += 1;
                }
                if next > states.dead_state {
                    row_alive = true;
                    col_used[x as usize] |= COL_ALIVE;
                }
            }
        }

        if row_occupied {
            occupied.include_y(y);
            if row_alive {
                alive.include_y(y);
            }
        }
    }

    for (x, &flags) in col_used.iter().enumerate() {
        if flags & COL_OCCUPIED != 0 {
            occupied.include_x(x as i32);
        }
        if flags & COL_ALIVE != 0 {
            alive.include_x(x as i32);
        }
    }

    StepStats {
        population,
        births,
        deaths,
        occupied: occupied.finish(width, height),
        alive: alive.finish(width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::hrot::counts::{clear_top_and_left, cumulative_moore_counts_2};
    use crate::domain::pens::ALIVE_START;

    /// Naive reference: window sum including the centre, then the combo rule
    fn reference_step(
        colour: &ColourGrid,
        combo: &ComboList,
        bounds: &GridBounds,
        r: i32,
        pens: &PenRange,
    ) -> (Vec<(i32, i32, u8)>, u32, u32, u32) {
        let mut cells = Vec::new();
        let mut population = 0;
        let mut births = 0;
        let mut deaths = 0;
        for y in bounds.bottom..=bounds.top {
            for x in bounds.left..=bounds.right {
                let mut count = 0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if colour.get(x + dx, y + dy) >= ALIVE_START {
                            count += 1;
                        }
                    }
                }
                let state = colour.get(x, y);
                let sb = combo.get(count);
                let next = step_cell_2(state, sb, pens, &mut births, &mut deaths);
                if next >= ALIVE_START {
                    population += 1;
                }
                cells.push((x, y, next));
            }
        }
        (cells, population, births, deaths)
    }

    #[test]
    fn test_block_seed_matches_reference() {
        // R2 with birth on 6, survival on 5 or 6 live cells in the window
        let pens = PenRange::default();
        let combo = ComboList::from_sets(&[6], &[5, 6], 25);
        let r = 2;

        let mut colour = ColourGrid::new(128, 128);
        for y in 62..67 {
            for x in 62..67 {
                colour.set(x, y, ALIVE_START);
            }
        }
        let reference_grid = colour.clone();

        // evaluate the block plus a range of margin
        let eval = GridBounds::new(58, 58, 70, 70);
        let sat = eval.expanded(r + 1);

        let mut counts = CountGrid::new(128, 128);
        clear_top_and_left(&mut counts, &sat.expanded(1), 1, 0);
        cumulative_moore_counts_2(&mut counts, &colour, &sat, ALIVE_START);

        let mut history = TileGrid::new(128, 128);
        let mut col_used = vec![0u8; 128];
        let stats = next_generation_hrot_moore_2(
            &mut colour,
            &mut history,
            &counts,
            &combo,
            &mut col_used,
            &eval,
            r,
            r,
            &pens,
        );

        let (cells, population, births, deaths) =
            reference_step(&reference_grid, &combo, &eval, r, &pens);

        for (x, y, expected) in cells {
            assert_eq!(colour.get(x, y), expected, "cell ({}, {})", x, y);
        }
        assert_eq!(stats.population, population);
        assert_eq!(stats.births, births);
        assert_eq!(stats.deaths, deaths);
        assert_eq!(
            stats.population,
            25 + stats.births - stats.deaths,
            "population balance from the block seed"
        );
    }

    #[test]
    fn test_column_used_flags() {
        let pens = PenRange::default();
        let combo = ComboList::from_sets(&[], &[9], 25); // everything survives a full window
        let r = 1;

        let mut colour = ColourGrid::new(128, 128);
        for y in 40..43 {
            for x in 40..43 {
                colour.set(x, y, ALIVE_START);
            }
        }

        let eval = GridBounds::new(36, 36, 46, 46);
        let sat = eval.expanded(r + 1);
        let mut counts = CountGrid::new(128, 128);
        clear_top_and_left(&mut counts, &sat.expanded(1), 1, 0);
        cumulative_moore_counts_2(&mut counts, &colour, &sat, ALIVE_START);

        let mut history = TileGrid::new(128, 128);
        let mut col_used = vec![0u8; 128];
        let stats = next_generation_hrot_moore_2(
            &mut colour,
            &mut history,
            &counts,
            &combo,
            &mut col_used,
            &eval,
            r,
            r,
            &pens,
        );

        // the centre cell sees the full 9-cell window and survives
        assert_eq!(col_used[41] & COL_ALIVE, COL_ALIVE);
        assert_eq!(stats.alive, GridBounds::new(41, 41, 41, 41));
    }
}
