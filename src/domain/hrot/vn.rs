//! HROT von Neumann neighbourhood via a skewed triangular prefix.
//!
//! The counts surface is reused as a "cone prefix" array: entry (i, j)
//! holds the number of live cells in the upward cone with apex at box row
//! i, box column j, restricted to the matching diagonal parity. The
//! recurrence is `C(i,j) = C(i−1,j−1) + C(i−1,j+1) − C(i−2,j) + live(i,j)`;
//! a range-r diamond sum then combines eight cone lookups, two parities of
//! a rectangle sum in 45°-rotated coordinates.
//!
//! Reads outside the stored triangle resolve through reflection rules; all
//! the parameters those rules need live in `VnContext`, passed explicitly
//! to every call.

use crate::domain::bounds::{BoxTracker, StepStats};
use crate::domain::grid::{ColourGrid, CountGrid, TILE_SIZE};
use crate::domain::pens::{GenStates, PenRange};
use crate::domain::rules::ComboList;
use crate::domain::tile::TileGrid;

use super::update::{step_cell_2, step_cell_n};

/// Geometry of the cone-prefix array for one kernel invocation.
#[derive(Clone, Copy, Debug)]
pub struct VnContext {
    /// Grid x of box column 0
    pub left_x: i32,
    /// Grid y of box row 0
    pub bottom_y: i32,
    /// Box width in cells
    pub ncols: i32,
    /// Box height in cells
    pub nrows: i32,
    /// Rows of the prefix array actually built
    pub ccht: i32,
    /// Half the box width; columns past it use the reflected clauses
    pub halfccwd: i32,
}

impl VnContext {
    /// Context covering a box of the given dimensions. The prefix array
    /// needs `nrows + ncols/2 + 1` rows; the counts surface must be at
    /// least that tall.
    pub fn new(left_x: i32, bottom_y: i32, ncols: i32, nrows: i32) -> Self {
        let halfccwd = ncols / 2;
        Self {
            left_x,
            bottom_y,
            ncols,
            nrows,
            ccht: nrows + halfccwd + 1,
            halfccwd,
        }
    }

    /// Cone prefix at (i, j), resolving reads outside the stored triangle.
    #[inline]
    pub fn get_count(&self, counts: &CountGrid, i: i32, j: i32) -> i32 {
        if i < 0 || i + j < 0 || j - i >= self.ncols {
            return 0;
        }

        // apex left of the grid: same cone as one on column 0
        if j < 0 && i + j < self.ccht {
            return counts.get(0, i + j);
        }

        // apex right of the grid: reflect onto the last column
        if j >= self.ncols && j - i >= self.ncols - self.ccht {
            return counts.get(self.ncols - 1, i + self.ncols - 1 - j);
        }

        if i < self.ccht {
            return counts.get(j, i);
        }

        // apex below the built rows: the cone saturates horizontally and
        // the answer lives in the last built row
        let k = i - self.ccht + 1;
        if k + j <= self.halfccwd {
            return counts.get(k + j, self.ccht - 1);
        }
        if j - k >= self.halfccwd {
            return counts.get(j - k, self.ccht - 1);
        }
        counts.get(
            self.halfccwd + ((i + j + self.ccht + self.halfccwd + 1) & 1),
            self.ccht - 1,
        )
    }

    /// Range-r diamond sum around box cell (i, j): eight cone lookups
    #[inline]
    pub fn diamond_sum(&self, counts: &CountGrid, i: i32, j: i32, r: i32) -> i32 {
        self.get_count(counts, i + r, j)
            - self.get_count(counts, i - 1, j + r + 1)
            - self.get_count(counts, i - 1, j - r - 1)
            + self.get_count(counts, i - r - 2, j)
            + self.get_count(counts, i + r - 1, j)
            - self.get_count(counts, i - 1, j + r)
            - self.get_count(counts, i - 1, j - r)
            + self.get_count(counts, i - r - 1, j)
    }
}

fn cumulative_vn_counts(
    ctx: &VnContext,
    counts: &mut CountGrid,
    colour: &ColourGrid,
    live: impl Fn(u8) -> bool,
) {
    for i in 0..ctx.ccht {
        for j in 0..=ctx.ncols {
            let c1 = ctx.get_count(counts, i - 1, j - 1);
            let c2 = ctx.get_count(counts, i - 1, j + 1);
            let c3 = ctx.get_count(counts, i - 2, j);
            let mut value = c1 + c2 - c3;

            if i < ctx.nrows && live(colour.get(ctx.left_x + j, ctx.bottom_y + i)) {
                value += 1;
            }
            counts.set(j, i, value);
        }
    }
}

/// Build the cone-prefix array for two-state liveness
pub fn cumulative_vn_counts_2(
    ctx: &VnContext,
    counts: &mut CountGrid,
    colour: &ColourGrid,
    alive_start: u8,
) {
    cumulative_vn_counts(ctx, counts, colour, |c| c >= alive_start);
}

/// N-state form: only the top state is live
pub fn cumulative_vn_counts_n(
    ctx: &VnContext,
    counts: &mut CountGrid,
    colour: &ColourGrid,
    max_gen_state: u8,
) {
    cumulative_vn_counts(ctx, counts, colour, |c| c == max_gen_state);
}

/// Advance the two-state grid over the box interior (cells at least range
/// from the box edge; callers pass a box pre-expanded accordingly).
pub fn next_generation_hrot_vn_2(
    colour: &mut ColourGrid,
    tile_history: &mut TileGrid,
    counts: &CountGrid,
    combo: &ComboList,
    ctx: &VnContext,
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

    for i in yrange..=ctx.nrows - yrange {
        let y = ctx.bottom_y + i;
        let mut row_occupied = false;
        let mut row_alive = false;

        for j in xrange..=ctx.ncols - xrange {
            let x = ctx.left_x + j;
            let count = ctx.diamond_sum(counts, i, j, xrange);

            let state = colour.get(x, y);
            let sb = combo.get(count);
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

/// N-state von Neumann kernel
pub fn next_generation_hrot_vn_n(
    colour: &mut ColourGrid,
    tile_history: &mut TileGrid,
    counts: &CountGrid,
    combo: &ComboList,
    ctx: &VnContext,
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

    for i in yrange..=ctx.nrows - yrange {
        let y = ctx.bottom_y + i;
        let mut row_occupied = false;
        let mut row_alive = false;

        for j in xrange..=ctx.ncols - xrange {
            let x = ctx.left_x + j;
            let count = ctx.diamond_sum(counts, i, j, xrange);

            let state = colour.get(x, y);
            let sb = combo.get(count);
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
