//! Grid update from a prepared counts surface.
//!
//! The count builders (`shapes`, `counts`, `vn`) leave the neighbourhood
//! sum of every cell in the expanded active rectangle; this pass maps each
//! sum through the combo list and rewrites the cell, 16 lanes at a time in
//! the aligned middle of each row with scalar head and tail sections.
//!
//! Counts include the centre cell wherever the shape kernel adds it, so the
//! caller's combo list is expected to carry any survival offset already.

use crate::domain::bounds::{BoxTracker, GridBounds, StepStats};
use crate::domain::grid::{ColourGrid, CountGrid, TILE_SIZE};
use crate::domain::pens::{GenStates, PenRange};
use crate::domain::rules::{BIRTH_BIT, ComboList, SURVIVAL_BIT};
use crate::domain::simd;
use crate::domain::tile::TileGrid;

/// Outcome of one 16-lane pen update
pub(crate) struct BlockOutcome {
    pub births: u32,
    pub deaths: u32,
    pub population: u32,
    pub occupied_bits: u16,
    pub alive_bits: u16,
}

/// Apply 16 combo-list entries to 16 pens in place: derive the
/// born/survived masks, blend the aged alive-case and dead-case candidate
/// vectors, and report the stats bitmasks. Shared by the counts updater and
/// the fused Moore kernel.
#[inline]
pub(crate) fn apply_combo_block(row: &mut [u8], sb: simd::Block, pens: &PenRange) -> BlockOutcome {
    let one = simd::splat(1);
    let two = simd::splat(2);
    let zero = simd::splat(0);
    let pen_base_set = simd::splat(pens.alive_start);
    let pen_max_set = simd::splat(pens.alive_max);
    let pen_base_clear = simd::splat(pens.dead_start);
    let pen_min_clear = simd::splat(pens.dead_min);

    let survivals = simd::eq(simd::and(sb, one), one);
    let births_vec = simd::eq(simd::and(sb, two), two);

    let pens_block = simd::load(row);

    let pens_if_alive = simd::ge(pens_block, pen_base_set);
    let pens_if_survived = simd::and(pens_if_alive, survivals);
    let deaths = simd::bitmask(simd::andnot(pens_if_alive, survivals)).count_ones();

    let pens_if_born = simd::andnot(births_vec, pens_if_alive);
    let births = simd::bitmask(pens_if_born).count_ones();

    let cells = simd::or(pens_if_survived, pens_if_born);

    // alive case: dead lanes jump to the base pen, live lanes age up
    let mut pens_alive = simd::blend(pens_if_alive, simd::add_sat(pens_block, one), pen_base_set);
    pens_alive = simd::min(pens_alive, pen_max_set);

    // dead case: live lanes drop to the fade base, dead lanes age down
    // saturating at the minimum, never-alive lanes stay zero
    let pens_were_not_zero = simd::gt(pens_block, zero);
    let mut pens_dead = simd::blend(pens_if_alive, pen_base_clear, simd::sub_sat(pens_block, one));
    let needs_sat = simd::and(simd::lt(pens_dead, pen_min_clear), pens_were_not_zero);
    pens_dead = simd::blend(needs_sat, pen_min_clear, pens_dead);

    let new_pens = simd::blend(cells, pens_alive, pens_dead);
    simd::store(row, new_pens);

    let cells_occupied = simd::gt(new_pens, pen_min_clear);
    let cells_alive = simd::ge(new_pens, pen_base_set);

    BlockOutcome {
        births,
        deaths,
        population: simd::bitmask(cells_alive).count_ones(),
        occupied_bits: simd::bitmask(cells_occupied),
        alive_bits: simd::bitmask(cells_alive),
    }
}

/// Scalar two-state cell step shared by the unaligned row sections
#[inline]
pub(crate) fn step_cell_2(state: u8, sb: u8, pens: &PenRange, births: &mut u32, deaths: &mut u32) -> u8 {
    if state < pens.alive_start {
        if sb & BIRTH_BIT != 0 {
            *births += 1;
            pens.alive_start
        } else if state > pens.dead_min {
            state - 1
        } else {
            state
        }
    } else if sb & SURVIVAL_BIT == 0 {
        *deaths += 1;
        pens.dead_start
    } else if state < pens.alive_max {
        state + 1
    } else {
        state
    }
}

/// Scalar N-state cell step
#[inline]
pub(crate) fn step_cell_n(state: u8, sb: u8, states: &GenStates, births: &mut u32, deaths: &mut u32) -> u8 {
    if state <= states.dead_state {
        if sb & BIRTH_BIT != 0 {
            *births += 1;
            states.max_gen_state
        } else if state > states.min_dead_state {
            state - 1
        } else {
            state
        }
    } else if state == states.max_gen_state {
        if sb & SURVIVAL_BIT == 0 {
            *deaths += 1;
            state - 1
        } else {
            state
        }
    } else if state > states.min_dead_state {
        state - 1
    } else {
        state
    }
}

/// Update every cell of the expanded rectangle from its count, two-state
/// pen encoding. Returns the generation statistics; occupied tiles are
/// OR-ed into the tile history map.
pub fn update_grid_from_counts_2(
    colour: &mut ColourGrid,
    tile_history: &mut TileGrid,
    counts: &CountGrid,
    combo: &ComboList,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    pens: &PenRange,
) -> StepStats {
    let width = colour.width();
    let height = colour.height();

    let left = bounds.left - xrange;
    let right = bounds.right + xrange;
    let bottom = bounds.bottom - yrange;
    let top = bounds.top + yrange;

    let mut population = 0u32;
    let mut births = 0u32;
    let mut deaths = 0u32;
    let mut occupied = BoxTracker::new(width, height);
    let mut alive = BoxTracker::new(width, height);

    let mut aligned_start = (left + 15) & !15;
    let aligned_end = right & !15;
    if aligned_start > right {
        aligned_start = right + 1;
    }

    for y in bottom..=top {
        let mut row_occupied = false;
        let mut row_alive = false;
        let count_row = counts.row(y);

        let mut x = left;
        while x < aligned_start {
            let state = colour.get(x, y);
            let sb = combo.get(count_row[x as usize]);
            let state = step_cell_2(state, sb, pens, &mut births, &mut deaths);
            colour.set(x, y, state);

            if state > pens.dead_min {
                row_occupied = true;
                occupied.include_x(x);
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                if state >= pens.alive_start {
                    population += 1;
                    row_alive = true;
                    alive.include_x(x);
                }
            }
            x += 1;
        }

        while x < aligned_end {
            // gather the survival/birth entries for the next 16 counts
            let mut sb = [0u8; 16];
            for (i, entry) in sb.iter_mut().enumerate() {
                *entry = combo.get(count_row[x as usize + i]);
            }

            let row = colour.row_mut(y);
            let outcome = apply_combo_block(&mut row[x as usize..], sb, pens);
            births += outcome.births;
            deaths += outcome.deaths;
            population += outcome.population;

            if outcome.occupied_bits != 0 {
                row_occupied = true;
                occupied.include_x(x + outcome.occupied_bits.trailing_zeros() as i32);
                occupied.include_x(x + 15 - outcome.occupied_bits.leading_zeros() as i32);
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);

                if outcome.alive_bits != 0 {
                    row_alive = true;
                    alive.include_x(x + outcome.alive_bits.trailing_zeros() as i32);
                    alive.include_x(x + 15 - outcome.alive_bits.leading_zeros() as i32);
                }
            }

            x += 16;
        }

        while x <= right {
            let state = colour.get(x, y);
            let sb = combo.get(count_row[x as usize]);
            let state = step_cell_2(state, sb, pens, &mut births, &mut deaths);
            colour.set(x, y, state);

            if state > pens.dead_min {
                row_occupied = true;
                occupied.include_x(x);
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                if state >= pens.alive_start {
                    population += 1;
                    row_alive = true;
                    alive.include_x(x);
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

    StepStats {
        population,
        births,
        deaths,
        occupied: occupied.finish(width, height),
        alive: alive.finish(width, height),
    }
}

/// N-state form: population counts top-state cells, the alive box tracks
/// anything above the dead threshold
pub fn update_grid_from_counts_n(
    colour: &mut ColourGrid,
    tile_history: &mut TileGrid,
    counts: &CountGrid,
    combo: &ComboList,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    states: &GenStates,
) -> StepStats {
    let width = colour.width();
    let height = colour.height();

    let left = bounds.left - xrange;
    let right = bounds.right + xrange;
    let bottom = bounds.bottom - yrange;
    let top = bounds.top + yrange;

    let mut population = 0u32;
    let mut births = 0u32;
    let mut deaths = 0u32;
    let mut occupied = BoxTracker::new(width, height);
    let mut alive = BoxTracker::new(width, height);

    for y in bottom..=top {
        let mut row_occupied = false;
        let mut row_alive = false;
        let count_row = counts.row(y);

        for x in left..=right {
            let state = colour.get(x, y);
            let sb = combo.get(count_row[x as usize]);
            let next = step_cell_n(state, sb, states, &mut births, &mut deaths);
            colour.set(x, y, next);

            if next > states.min_dead_state {
                row_occupied = true;
                occupied.include_x(x);
                tile_history.set_tile(x as usize / TILE_SIZE, y as usize / TILE_SIZE);
                if next == states.max_gen_state {
                    population += 1;
                }
                if next > states.dead_state {
                    row_alive = true;
                    alive.include_x(x);
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

    fn pens() -> PenRange {
        PenRange::default()
    }

    #[test]
    fn test_birth_and_death_from_counts() {
        let mut colour = ColourGrid::new(64, 64);
        let mut counts = CountGrid::new(64, 64);
        let mut history = TileGrid::new(64, 64);

        // combo: birth on 3, survival on 3 and 4 (counts include the centre)
        let combo = ComboList::from_sets(&[3], &[3, 4], 10);

        colour.set(30, 30, 64); // alive, count 2: dies
        counts.set(30, 30, 2);
        counts.set(32, 30, 3); // dead, count 3: born

        let bounds = GridBounds::new(30, 30, 32, 30);
        let stats = update_grid_from_counts_2(
            &mut colour,
            &mut history,
            &counts,
            &combo,
            &bounds,
            1,
            1,
            &pens(),
        );

        assert_eq!(colour.get(30, 30), 63, "dying cell takes the fade base");
        assert_eq!(colour.get(32, 30), 64, "born cell takes the base pen");
        assert_eq!(stats.births, 1);
        assert_eq!(stats.deaths, 1);
        assert_eq!(stats.population, 1);
        assert!(history.tile_set(1, 1));
    }

    #[test]
    fn test_never_alive_cells_stay_zero() {
        let mut colour = ColourGrid::new(64, 64);
        let counts = CountGrid::new(64, 64);
        let mut history = TileGrid::new(64, 64);
        let combo = ComboList::from_sets(&[], &[], 10);

        colour.set(20, 20, 1); // fully faded: stays 1
        let bounds = GridBounds::new(18, 18, 22, 22);
        update_grid_from_counts_2(
            &mut colour,
            &mut history,
            &counts,
            &combo,
            &bounds,
            1,
            1,
            &pens(),
        );

        assert_eq!(colour.get(19, 19), 0, "never-alive cells are not decremented");
        assert_eq!(colour.get(20, 20), 1, "faded cells saturate at the minimum");
    }

    #[test]
    fn test_simd_middle_matches_scalar_edges() {
        // two identical rows of cells, one evaluated in the aligned middle
        // and one forced through the scalar path by offsetting the rectangle
        let combo = ComboList::from_sets(&[3], &[3, 4], 60);

        let build = |left: i32| {
            let mut colour = ColourGrid::new(128, 64);
            let mut counts = CountGrid::new(128, 64);
            for i in 0..40 {
                let x = left + i;
                colour.set(x, 30, if i % 3 == 0 { 64 } else { 0 });
                counts.set(x, 30, (i % 7) as i32);
            }
            (colour, counts)
        };

        let (mut a, counts_a) = build(32);
        let (mut b, counts_b) = build(33);
        let mut history = TileGrid::new(128, 64);

        let stats_a = update_grid_from_counts_2(
            &mut a,
            &mut history,
            &counts_a,
            &combo,
            &GridBounds::new(33, 30, 70, 30),
            1,
            0,
            &pens(),
        );
        let stats_b = update_grid_from_counts_2(
            &mut b,
            &mut history,
            &counts_b,
            &combo,
            &GridBounds::new(34, 30, 71, 30),
            1,
            0,
            &pens(),
        );

        assert_eq!(stats_a.population, stats_b.population);
        assert_eq!(stats_a.births, stats_b.births);
        assert_eq!(stats_a.deaths, stats_b.deaths);
        for i in 0..40 {
            assert_eq!(a.get(32 + i, 30), b.get(33 + i, 30), "cell {} differs", i);
        }
    }

    #[test]
    fn test_n_state_update() {
        let mut colour = ColourGrid::new(64, 64);
        let mut counts = CountGrid::new(64, 64);
        let mut history = TileGrid::new(64, 64);
        let states = GenStates::new(4); // states 0..=3

        let combo = ComboList::from_sets(&[2], &[3], 10);

        colour.set(10, 10, 3); // alive, count 3: survives
        counts.set(10, 10, 3);
        colour.set(12, 10, 3); // alive, count 0: decays
        colour.set(14, 10, 2); // intermediate: always decays
        counts.set(14, 10, 2);
        colour.set(16, 10, 0); // dead, count 2: born
        counts.set(16, 10, 2);

        let bounds = GridBounds::new(10, 10, 16, 10);
        let stats = update_grid_from_counts_n(
            &mut colour,
            &mut history,
            &counts,
            &combo,
            &bounds,
            0,
            0,
            &states,
        );

        assert_eq!(colour.get(10, 10), 3);
        assert_eq!(colour.get(12, 10), 2);
        assert_eq!(colour.get(14, 10), 1, "intermediate states decay regardless of count");
        assert_eq!(colour.get(16, 10), 3);
        assert_eq!(stats.births, 1);
        assert_eq!(stats.deaths, 1);
        assert_eq!(stats.population, 2);
    }

    #[test]
    fn test_negative_counts_read_as_empty() {
        let mut colour = ColourGrid::new(64, 64);
        let mut counts = CountGrid::new(64, 64);
        let mut history = TileGrid::new(64, 64);
        let combo = ComboList::from_sets(&[0], &[0], 10);

        // a mixed-sign weighted kernel can leave negative sums
        colour.set(10, 10, 64);
        counts.set(10, 10, -3);

        let bounds = GridBounds::new(10, 10, 10, 10);
        let stats = update_grid_from_counts_2(
            &mut colour,
            &mut history,
            &counts,
            &combo,
            &bounds,
            0,
            0,
            &pens(),
        );

        assert_eq!(colour.get(10, 10), 63, "negative count is no birth, no survival");
        assert_eq!(stats.deaths, 1);
    }
}
