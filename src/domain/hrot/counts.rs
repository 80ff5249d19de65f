//! Summed-area table for the HROT Moore neighbourhood.
//!
//! `counts[y][x]` accumulates the live-cell indicator over the rectangle
//! from the build origin to (x, y), so a range-r window sum is four corner
//! lookups. Rows are produced 16 cells at a time with shortcuts for
//! all-live and all-dead blocks.

use crate::domain::bounds::GridBounds;
use crate::domain::grid::{ColourGrid, CountGrid};
use crate::domain::simd;

/// Zero the bottom `ry2` rows of the rectangle and the left `rx2 + 1`
/// columns of the remaining rows, so prefix sums and window queries read
/// zeros where the table has no history.
pub fn clear_top_and_left(
    counts: &mut CountGrid,
    bounds: &GridBounds,
    ry2: i32,
    rx2: i32,
) {
    for y in bounds.bottom..bounds.bottom + ry2 {
        let row = counts.row_mut(y);
        row[bounds.left as usize..=bounds.right as usize].fill(0);
    }

    for y in bounds.bottom + ry2..=bounds.top {
        let row = counts.row_mut(y);
        row[bounds.left as usize..=(bounds.left + rx2) as usize].fill(0);
    }
}

fn cumulative_counts(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    live: impl Fn(u8) -> bool,
    live_block: impl Fn(simd::Block) -> u16,
) {
    let left = bounds.left;
    let right = bounds.right;

    let align16_left = (left + 15) & !15;
    let align16_right = (right + 1) & !15;
    let left_target = align16_left.min(align16_right);

    for y in bounds.bottom..=bounds.top {
        let colour_row = colour.row(y);
        let (count_row, prev_row) = counts.row_pair_mut(y, y - 1);

        let mut count = 0i32;
        let mut x = left;

        while x < left_target {
            if live(colour_row[x as usize]) {
                count += 1;
            }
            count_row[x as usize] = prev_row[x as usize] + count;
            x += 1;
        }

        while x < align16_right {
            let block = simd::load(&colour_row[x as usize..]);
            let mask = live_block(block);

            if mask == 0 {
                // dead block: previous row plus the running count
                for i in x as usize..x as usize + 16 {
                    count_row[i] = prev_row[i] + count;
                }
            } else if mask == 0xFFFF {
                // live block: previous row plus count+1 .. count+16
                for (step, i) in (x as usize..x as usize + 16).enumerate() {
                    count_row[i] = prev_row[i] + count + step as i32 + 1;
                }
                count += 16;
            } else {
                let mut bits = mask;
                for i in x as usize..x as usize + 16 {
                    count += (bits & 1) as i32;
                    bits >>= 1;
                    count_row[i] = prev_row[i] + count;
                }
            }

            x += 16;
        }

        while x <= right {
            if live(colour_row[x as usize]) {
                count += 1;
            }
            count_row[x as usize] = prev_row[x as usize] + count;
            x += 1;
        }
    }
}

/// Build the summed-area table over the rectangle for two-state liveness.
/// The row below `bounds.bottom` and the cells left of `bounds.left` must
/// already be zero (see `clear_top_and_left`).
pub fn cumulative_moore_counts_2(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    alive_start: u8,
) {
    debug_assert!(bounds.bottom >= 1);
    let alive = simd::splat(alive_start);
    cumulative_counts(
        counts,
        colour,
        bounds,
        |c| c >= alive_start,
        |block| simd::bitmask(simd::ge(block, alive)),
    );
}

/// N-state form: a cell is live only in the top state
pub fn cumulative_moore_counts_n(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    max_gen_state: u8,
) {
    debug_assert!(bounds.bottom >= 1);
    let alive = simd::splat(max_gen_state);
    cumulative_counts(
        counts,
        colour,
        bounds,
        |c| c == max_gen_state,
        |block| simd::bitmask(simd::eq(block, alive)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepare(cells: &[(i32, i32)]) -> (ColourGrid, CountGrid) {
        let mut colour = ColourGrid::new(128, 128);
        for &(x, y) in cells {
            colour.set(x, y, 64);
        }
        (colour, CountGrid::new(128, 128))
    }

    fn naive_prefix(colour: &ColourGrid, bounds: &GridBounds, x: i32, y: i32) -> i32 {
        let mut sum = 0;
        for yy in bounds.bottom..=y {
            for xx in bounds.left..=x {
                if colour.get(xx, yy) >= 64 {
                    sum += 1;
                }
            }
        }
        sum
    }

    #[test]
    fn test_prefix_matches_naive() {
        let (colour, mut counts) = prepare(&[(10, 10), (11, 10), (40, 12), (17, 30), (63, 33)]);
        let bounds = GridBounds::new(8, 8, 70, 40);

        clear_top_and_left(&mut counts, &GridBounds::new(7, 7, 70, 40), 1, 0);
        cumulative_moore_counts_2(&mut counts, &colour, &bounds, 64);

        for &(x, y) in &[(10, 10), (12, 10), (41, 13), (70, 40), (8, 8), (25, 31)] {
            assert_eq!(
                counts.get(x, y),
                naive_prefix(&colour, &bounds, x, y),
                "prefix at ({}, {})",
                x,
                y
            );
        }
    }

    #[test]
    fn test_round_trip_recovers_cells() {
        let (colour, mut counts) = prepare(&[(20, 20), (21, 20), (22, 21), (36, 25)]);
        let bounds = GridBounds::new(16, 16, 47, 31);

        clear_top_and_left(&mut counts, &GridBounds::new(15, 15, 47, 31), 1, 0);
        cumulative_moore_counts_2(&mut counts, &colour, &bounds, 64);

        // C(y,x) - C(y-1,x) - C(y,x-1) + C(y-1,x-1) == live(x,y)
        for y in bounds.bottom + 1..=bounds.top {
            for x in bounds.left + 1..=bounds.right {
                let cell = counts.get(x, y) - counts.get(x, y - 1) - counts.get(x - 1, y)
                    + counts.get(x - 1, y - 1);
                let expected = if colour.get(x, y) >= 64 { 1 } else { 0 };
                assert_eq!(cell, expected, "round trip at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_window_sum_from_four_corners() {
        let (colour, mut counts) =
            prepare(&[(30, 30), (31, 30), (32, 30), (30, 31), (33, 33), (28, 29)]);
        let bounds = GridBounds::new(20, 20, 50, 45);

        clear_top_and_left(&mut counts, &GridBounds::new(19, 19, 50, 45), 1, 0);
        cumulative_moore_counts_2(&mut counts, &colour, &bounds, 64);

        let r = 2;
        for y in 27..=37 {
            for x in 27..=37 {
                let window = counts.get(x + r, y + r) - counts.get(x - r - 1, y + r)
                    - counts.get(x + r, y - r - 1)
                    + counts.get(x - r - 1, y - r - 1);

                let mut naive = 0;
                for dy in -r..=r {
                    for dx in -r..=r {
                        if colour.get(x + dx, y + dy) >= 64 {
                            naive += 1;
                        }
                    }
                }
                assert_eq!(window, naive, "window sum at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_full_blocks_take_the_shortcut_path() {
        // a 32-wide solid stripe exercises the all-live block case
        let mut colour = ColourGrid::new(128, 128);
        for x in 32..64 {
            colour.set(x, 20, 64);
        }
        let mut counts = CountGrid::new(128, 128);
        let bounds = GridBounds::new(16, 16, 80, 24);

        clear_top_and_left(&mut counts, &GridBounds::new(15, 15, 80, 24), 1, 0);
        cumulative_moore_counts_2(&mut counts, &colour, &bounds, 64);

        assert_eq!(counts.get(63, 20), 32);
        assert_eq!(counts.get(80, 24), 32);
        assert_eq!(counts.get(31, 20), 0);
    }

    #[test]
    fn test_n_state_counts_only_top_state() {
        let mut colour = ColourGrid::new(128, 128);
        colour.set(20, 20, 3);
        colour.set(21, 20, 2); // decaying, not live
        let mut counts = CountGrid::new(128, 128);
        let bounds = GridBounds::new(16, 16, 47, 31);

        clear_top_and_left(&mut counts, &GridBounds::new(15, 15, 47, 31), 1, 0);
        cumulative_moore_counts_n(&mut counts, &colour, &bounds, 3);

        assert_eq!(counts.get(47, 31), 1);
    }
}
