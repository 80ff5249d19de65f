//! Direct neighbourhood-count builders for the shaped HROT families.
//!
//! Each kernel fills the counts surface for every cell of the expanded
//! active rectangle (the rectangle grown by the range on every side); the
//! shared update pass then applies the combo list. Shapes that admit it use
//! an incremental form along each row: a full sum for the first column,
//! then subtract the leaving cells and add the entering ones.
//!
//! Counts include the centre cell wherever the shape contains it, so
//! survival entries in the combo list carry that offset.

use crate::domain::bounds::GridBounds;
use crate::domain::grid::{ColourGrid, CountGrid};

/// Two-state / N-state wrapper pairs share one generic body per shape.
macro_rules! shape_pair {
    ($name2:ident, $namen:ident, $body:ident, ($($arg:ident: $ty:ty),*)) => {
        pub fn $name2(
            counts: &mut CountGrid,
            colour: &ColourGrid,
            bounds: &GridBounds,
            xrange: i32,
            yrange: i32,
            alive_start: u8,
            $($arg: $ty),*
        ) {
            $body(counts, colour, bounds, xrange, yrange, $($arg,)* &|c: u8| c >= alive_start);
        }

        pub fn $namen(
            counts: &mut CountGrid,
            colour: &ColourGrid,
            bounds: &GridBounds,
            xrange: i32,
            yrange: i32,
            max_gen_state: u8,
            $($arg: $ty),*
        ) {
            $body(counts, colour, bounds, xrange, yrange, $($arg,)* &|c: u8| c == max_gen_state);
        }
    };
}

shape_pair!(next_generation_cross_2, next_generation_cross_n, count_cross, ());
shape_pair!(next_generation_saltire_2, next_generation_saltire_n, count_saltire, ());
shape_pair!(next_generation_star_2, next_generation_star_n, count_star, ());
shape_pair!(next_generation_hash_2, next_generation_hash_n, count_hash, ());
shape_pair!(next_generation_asterisk_2, next_generation_asterisk_n, count_asterisk, ());
shape_pair!(next_generation_tripod_2, next_generation_tripod_n, count_tripod, ());
shape_pair!(next_generation_hexagonal_2, next_generation_hexagonal_n, count_hexagonal, ());
shape_pair!(next_generation_triangular_2, next_generation_triangular_n, count_triangular, ());
shape_pair!(next_generation_gaussian_2, next_generation_gaussian_n, count_gaussian, ());
shape_pair!(
    next_generation_corner_edge_2,
    next_generation_corner_edge_n,
    count_corner_edge,
    (corner_range: i32, edge_range: i32)
);
shape_pair!(
    next_generation_shaped_2,
    next_generation_shaped_n,
    count_shaped,
    (widths: &[u32])
);
shape_pair!(
    next_generation_custom_2,
    next_generation_custom_n,
    count_custom,
    (neighbour_list: &[i16], triangular: bool)
);
shape_pair!(
    next_generation_weighted_2,
    next_generation_weighted_n,
    count_weighted,
    (weights: &[i8], triangular: bool)
);
shape_pair!(
    next_generation_weighted_states_2,
    next_generation_weighted_states_n,
    count_weighted_states,
    (weights: &[i8], dead_weight: u8, alive_weight: u8)
);

/// Checkerboard (start offset 1): alternating cells, centre counted
pub fn next_generation_checkerboard_2(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    alive_start: u8,
) {
    count_checker_both(counts, colour, bounds, xrange, yrange, 1, &|c| c >= alive_start);
}

/// Aligned checkerboard (start offset 0): the other parity, no centre
pub fn next_generation_aligned_checkerboard_2(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    alive_start: u8,
) {
    count_checker_both(counts, colour, bounds, xrange, yrange, 0, &|c| c >= alive_start);
}

/// N-state checkerboard counts reuse the two-state walk with the top state
/// as the liveness threshold
pub fn next_generation_checkerboard_n(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    max_gen_state: u8,
) {
    count_checker_both(counts, colour, bounds, xrange, yrange, 1, &|c| c == max_gen_state);
}

pub fn next_generation_aligned_checkerboard_n(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    max_gen_state: u8,
) {
    count_checker_both(counts, colour, bounds, xrange, yrange, 0, &|c| c == max_gen_state);
}

#[inline]
fn expanded(bounds: &GridBounds, xrange: i32, yrange: i32) -> (i32, i32, i32, i32) {
    (
        bounds.left - xrange,
        bounds.bottom - yrange,
        bounds.right + xrange,
        bounds.top + yrange,
    )
}

/// Vertical arms plus a full middle row; the middle row slides with two
/// edge updates per column
fn count_cross(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        let mut x = left;

        let mut count = 0;
        let mut row_count = 0;
        for j in 1..=yrange {
            if live(colour.get(x, y + j)) {
                count += 1;
            }
            if live(colour.get(x, y - j)) {
                count += 1;
            }
        }
        for i in -xrange..=xrange {
            if live(colour.get(x + i, y)) {
                row_count += 1;
            }
        }
        counts.set(x, y, count + row_count);
        x += 1;

        while x <= right {
            count = 0;
            for j in 1..=yrange {
                if live(colour.get(x, y + j)) {
                    count += 1;
                }
                if live(colour.get(x, y - j)) {
                    count += 1;
                }
            }
            if live(colour.get(x - xrange - 1, y)) {
                row_count -= 1;
            }
            if live(colour.get(x + xrange, y)) {
                row_count += 1;
            }
            counts.set(x, y, count + row_count);
            x += 1;
        }
    }
}

/// Both diagonals plus the centre
fn count_saltire(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            for j in 1..=yrange {
                if live(colour.get(x - j, y + j)) {
                    count += 1;
                }
                if live(colour.get(x + j, y + j)) {
                    count += 1;
                }
                if live(colour.get(x - j, y - j)) {
                    count += 1;
                }
                if live(colour.get(x + j, y - j)) {
                    count += 1;
                }
            }
            if live(colour.get(x, y)) {
                count += 1;
            }
            counts.set(x, y, count);
        }
    }
}

/// Saltire plus the vertical arm and the full middle row
fn count_star(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            for j in 1..=yrange {
                if live(colour.get(x - j, y + j)) {
                    count += 1;
                }
                if live(colour.get(x, y + j)) {
                    count += 1;
                }
                if live(colour.get(x + j, y + j)) {
                    count += 1;
                }
                if live(colour.get(x - j, y - j)) {
                    count += 1;
                }
                if live(colour.get(x, y - j)) {
                    count += 1;
                }
                if live(colour.get(x + j, y - j)) {
                    count += 1;
                }
            }
            for i in -xrange..=xrange {
                if live(colour.get(x + i, y)) {
                    count += 1;
                }
            }
            counts.set(x, y, count);
        }
    }
}

/// Full rows at offsets +-1, columns at offsets +-1 elsewhere, plus the
/// centre; the two full rows slide incrementally
fn count_hash(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        let mut x = left;

        let mut count = 0;
        let mut row_count = 0;
        let mut row_count2 = 0;
        for j in -yrange..=yrange {
            if j == 1 {
                for i in -xrange..=xrange {
                    if live(colour.get(x + i, y + j)) {
                        row_count += 1;
                    }
                }
            } else if j == -1 {
                for i in -xrange..=xrange {
                    if live(colour.get(x + i, y + j)) {
                        row_count2 += 1;
                    }
                }
            } else {
                if live(colour.get(x - 1, y + j)) {
                    count += 1;
                }
                if live(colour.get(x + 1, y + j)) {
                    count += 1;
                }
            }
        }
        if live(colour.get(x, y)) {
            count += 1;
        }
        counts.set(x, y, count + row_count + row_count2);
        x += 1;

        while x <= right {
            count = 0;
            for j in -yrange..=yrange {
                if j == 1 {
                    if live(colour.get(x - xrange - 1, y + j)) {
                        row_count -= 1;
                    }
                    if live(colour.get(x + xrange, y + j)) {
                        row_count += 1;
                    }
                } else if j == -1 {
                    if live(colour.get(x - xrange - 1, y + j)) {
                        row_count2 -= 1;
                    }
                    if live(colour.get(x + xrange, y + j)) {
                        row_count2 += 1;
                    }
                } else {
                    if live(colour.get(x - 1, y + j)) {
                        count += 1;
                    }
                    if live(colour.get(x + 1, y + j)) {
                        count += 1;
                    }
                }
            }
            if live(colour.get(x, y)) {
                count += 1;
            }
            counts.set(x, y, count + row_count + row_count2);
            x += 1;
        }
    }
}

/// Vertical arm, main diagonal and the full middle row
fn count_asterisk(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            for j in -yrange..=-1 {
                if live(colour.get(x, y + j)) {
                    count += 1;
                }
                if live(colour.get(x + j, y + j)) {
                    count += 1;
                }
            }
            for i in -xrange..=xrange {
                if live(colour.get(x + i, y)) {
                    count += 1;
                }
            }
            for j in 1..=yrange {
                if live(colour.get(x, y + j)) {
                    count += 1;
                }
                if live(colour.get(x + j, y + j)) {
                    count += 1;
                }
            }
            counts.set(x, y, count);
        }
    }
}

/// Upward arm, left arm through the centre, down-right diagonal
fn count_tripod(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            for j in -yrange..=-1 {
                if live(colour.get(x, y + j)) {
                    count += 1;
                }
            }
            for i in -xrange..=0 {
                if live(colour.get(x + i, y)) {
                    count += 1;
                }
            }
            for j in 1..=xrange {
                if live(colour.get(x + j, y + j)) {
                    count += 1;
                }
            }
            counts.set(x, y, count);
        }
    }
}

/// Four corner cells, four edge cells and the centre
fn count_corner_edge(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    corner_range: i32,
    edge_range: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;

            for &(dx, dy) in &[
                (-corner_range, -corner_range),
                (corner_range, -corner_range),
                (-corner_range, corner_range),
                (corner_range, corner_range),
            ] {
                if live(colour.get(x + dx, y + dy)) {
                    count += 1;
                }
            }
            for &(dx, dy) in &[
                (0, -edge_range),
                (0, edge_range),
                (-edge_range, 0),
                (edge_range, 0),
            ] {
                if live(colour.get(x + dx, y + dy)) {
                    count += 1;
                }
            }
            if live(colour.get(x, y)) {
                count += 1;
            }
            counts.set(x, y, count);
        }
    }
}

/// Moore square minus the top-right and bottom-left corner triangles; the
/// row sums slide with one leaving and one entering cell per row band
fn count_hexagonal(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        let mut x = left;

        let mut count = 0;
        for j in -yrange..0 {
            for i in -xrange..=xrange + j {
                if live(colour.get(x + i, y + j)) {
                    count += 1;
                }
            }
        }
        for j in 0..=yrange {
            for i in -xrange + j..=xrange {
                if live(colour.get(x + i, y + j)) {
                    count += 1;
                }
            }
        }
        counts.set(x, y, count);
        x += 1;

        while x <= right {
            for j in -yrange..0 {
                if live(colour.get(x - xrange - 1, y + j)) {
                    count -= 1;
                }
                if live(colour.get(x + xrange + j, y + j)) {
                    count += 1;
                }
            }
            for j in 0..=yrange {
                if live(colour.get(x - xrange + j - 1, y + j)) {
                    count -= 1;
                }
                if live(colour.get(x + xrange, y + j)) {
                    count += 1;
                }
            }
            counts.set(x, y, count);
            x += 1;
        }
    }
}

/// Per-row half-width table (L2 / circular); slides with one leaving and
/// one entering cell per row
fn count_shaped(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    widths: &[u32],
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        let mut x = left;

        let mut count = 0;
        for j in -yrange..=yrange {
            let width = widths[(j + yrange) as usize] as i32;
            for i in -width..=width {
                if live(colour.get(x + i, y + j)) {
                    count += 1;
                }
            }
        }
        counts.set(x, y, count);
        x += 1;

        while x <= right {
            for j in -yrange..=yrange {
                let width = widths[(j + yrange) as usize] as i32;
                if live(colour.get(x - width - 1, y + j)) {
                    count -= 1;
                }
                if live(colour.get(x + width, y + j)) {
                    count += 1;
                }
            }
            counts.set(x, y, count);
            x += 1;
        }
    }
}

/// Triangular neighbourhood: the row widths form one of two triangle
/// orientations selected by the cell parity (x + y) & 1
fn count_triangular(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);
    let _ = xrange;

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;

            let mut row = |width: i32, j: i32, count: &mut i32| {
                for i in -width..=width {
                    if live(colour.get(x + i, y + j)) {
                        *count += 1;
                    }
                }
            };

            if (x + y) & 1 == 0 {
                let mut width = yrange + 1;
                for j in -yrange..0 {
                    row(width, j, &mut count);
                    width += 1;
                }
                for j in 0..=yrange {
                    width -= 1;
                    row(width, j, &mut count);
                }
            } else {
                let mut width = yrange;
                for j in -yrange..=0 {
                    row(width, j, &mut count);
                    width += 1;
                }
                for j in 1..=yrange {
                    width -= 1;
                    row(width, j, &mut count);
                }
            }
            counts.set(x, y, count);
        }
    }
}

/// Triangular-profile weights `(r+1-|i|)(r+1-|j|)` plus 1 for the centre
fn count_gaussian(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            for j in -yrange..=yrange {
                let row_weight = yrange + 1 - j.abs();
                for i in -xrange..=xrange {
                    if live(colour.get(x + i, y + j)) {
                        count += row_weight * (xrange + 1 - i.abs());
                    }
                }
            }
            if live(colour.get(x, y)) {
                count += 1;
            }
            counts.set(x, y, count);
        }
    }
}

/// Sparse row-encoded neighbour list; triangular rules flip the row
/// offsets on even-parity cells
fn count_custom(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    neighbour_list: &[i16],
    triangular: bool,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            let mut j = 0usize;
            while j < neighbour_list.len() {
                let mut row_offset = neighbour_list[j] as i32;
                if triangular && (x + y) & 1 == 0 {
                    row_offset = -row_offset;
                }
                j += 1;

                let items = neighbour_list[j] as usize;
                j += 1;

                for &col in &neighbour_list[j..j + items] {
                    if live(colour.get(x + col as i32, y + row_offset)) {
                        count += 1;
                    }
                }
                j += items;
            }
            counts.set(x, y, count);
        }
    }
}

/// Arbitrary signed kernel; triangular kernels carry a second half used on
/// odd-parity cells with the row order reversed
fn count_weighted(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    weights: &[i8],
    triangular: bool,
    live: &impl Fn(u8) -> bool,
) {
    if xrange == 1 && yrange == 1 && !triangular {
        count_weighted_r1(counts, colour, bounds, weights, live);
        return;
    }

    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);
    let row_chunk = 2 * xrange + 1;

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0i32;
            let (mut k, l) = if triangular && (x + y) & 1 == 1 {
                (weights.len() as i32 - row_chunk, -2 * row_chunk)
            } else {
                (0, 0)
            };

            for j in -yrange..=yrange {
                for i in -xrange..=xrange {
                    if live(colour.get(x + i, y + j)) {
                        count += weights[k as usize] as i32;
                    }
                    k += 1;
                }
                k += l;
            }
            counts.set(x, y, count);
        }
    }
}

/// Range-1 weighted fast path with the nine weights in registers
fn count_weighted_r1(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    weights: &[i8],
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, 1, 1);
    let w: [i32; 9] = std::array::from_fn(|i| weights[i] as i32);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0;
            if live(colour.get(x - 1, y - 1)) {
                count += w[0];
            }
            if live(colour.get(x, y - 1)) {
                count += w[1];
            }
            if live(colour.get(x + 1, y - 1)) {
                count += w[2];
            }
            if live(colour.get(x - 1, y)) {
                count += w[3];
            }
            if live(colour.get(x, y)) {
                count += w[4];
            }
            if live(colour.get(x + 1, y)) {
                count += w[5];
            }
            if live(colour.get(x - 1, y + 1)) {
                count += w[6];
            }
            if live(colour.get(x, y + 1)) {
                count += w[7];
            }
            if live(colour.get(x + 1, y + 1)) {
                count += w[8];
            }
            counts.set(x, y, count);
        }
    }
}

/// Weighted kernel times a per-state weight: dead cells contribute too
fn count_weighted_states(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    weights: &[i8],
    dead_weight: u8,
    alive_weight: u8,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        for x in left..=right {
            let mut count = 0i32;
            let mut k = 0usize;
            for j in -yrange..=yrange {
                for i in -xrange..=xrange {
                    let state_weight = if live(colour.get(x + i, y + j)) {
                        alive_weight as i32
                    } else {
                        dead_weight as i32
                    };
                    count += weights[k] as i32 * state_weight;
                    k += 1;
                }
            }
            counts.set(x, y, count);
        }
    }
}

/// Shared checkerboard walk: cells of one parity within the window. The
/// row pattern repeats every two columns, so two running sums alternate,
/// each updated with one leaving and one entering cell per row.
fn count_checker_both(
    counts: &mut CountGrid,
    colour: &ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
    start: i32,
    live: &impl Fn(u8) -> bool,
) {
    let (left, bottom, right, top) = expanded(bounds, xrange, yrange);

    for y in bottom..=top {
        let mut x = left;

        // full neighbourhood for the first two columns
        let full_sum = |x: i32| {
            let mut sum = 0;
            let mut offset = start;
            for j in -yrange..=yrange {
                let mut i = -xrange + offset;
                while i <= xrange - offset {
                    if live(colour.get(x + i, y + j)) {
                        sum += 1;
                    }
                    i += 2;
                }
                offset = 1 - offset;
            }
            if start == 1 && live(colour.get(x, y)) {
                sum += 1;
            }
            sum
        };

        let mut count = full_sum(x);
        counts.set(x, y, count);
        x += 1;

        if x <= right {
            let mut count2 = full_sum(x);
            counts.set(x, y, count2);
            x += 1;

            // remaining column pairs: subtract the leaving and add the
            // entering cells of each row
            while x <= right {
                let mut offset = start;
                for j in -yrange..=yrange {
                    if live(colour.get(x - xrange + offset - 2, y + j)) {
                        count -= 1;
                    }
                    if live(colour.get(x + xrange - offset, y + j)) {
                        count += 1;
                    }
                    offset = 1 - offset;
                }
                if start == 1 {
                    if live(colour.get(x - 2, y)) {
                        count -= 1;
                    }
                    if live(colour.get(x, y)) {
                        count += 1;
                    }
                }
                counts.set(x, y, count);
                x += 1;

                if x <= right {
                    let mut offset = start;
                    for j in -yrange..=yrange {
                        if live(colour.get(x - xrange + offset - 2, y + j)) {
                            count2 -= 1;
                        }
                        if live(colour.get(x + xrange - offset, y + j)) {
                            count2 += 1;
                        }
                        offset = 1 - offset;
                    }
                    if start == 1 {
                        if live(colour.get(x - 2, y)) {
                            count2 -= 1;
                        }
                        if live(colour.get(x, y)) {
                            count2 += 1;
                        }
                    }
                    counts.set(x, y, count2);
                    x += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pens::ALIVE_START;

    const R: i32 = 2;

    fn seeded() -> ColourGrid {
        let mut colour = ColourGrid::new(128, 128);
        for k in 0..50usize {
            let x = 48 + (k * 13) % 33;
            let y = 48 + (k * 29) % 33;
            colour.set(x as i32, y as i32, ALIVE_START);
        }
        colour
    }

    fn eval_bounds() -> GridBounds {
        GridBounds::new(44, 44, 84, 84)
    }

    /// Brute-force sum over a membership predicate, for cross-checking the
    /// incremental walks
    fn check_against_membership(
        kernel: impl Fn(&mut CountGrid, &ColourGrid, &GridBounds),
        member: impl Fn(i32, i32) -> bool,
    ) {
        let colour = seeded();
        let bounds = eval_bounds();
        let mut counts = CountGrid::new(128, 128);
        kernel(&mut counts, &colour, &bounds);

        for y in (bounds.bottom - R..=bounds.top + R).step_by(3) {
            for x in (bounds.left - R..=bounds.right + R).step_by(3) {
                let mut expected = 0;
                for dy in -2 * R..=2 * R {
                    for dx in -2 * R..=2 * R {
                        if member(dx, dy) && colour.get(x + dx, y + dy) >= ALIVE_START {
                            expected += 1;
                        }
                    }
                }
                assert_eq!(counts.get(x, y), expected, "count at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_cross_counts() {
        check_against_membership(
            |c, g, b| count_cross(c, g, b, R, R, &|v| v >= ALIVE_START),
            |dx, dy| (dx == 0 && dy.abs() <= R && dy != 0) || (dy == 0 && dx.abs() <= R),
        );
    }

    #[test]
    fn test_saltire_counts() {
        check_against_membership(
            |c, g, b| count_saltire(c, g, b, R, R, &|v| v >= ALIVE_START),
            |dx, dy| (dx == 0 && dy == 0) || (dx.abs() == dy.abs() && dx.abs() <= R && dx != 0),
        );
    }

    #[test]
    fn test_star_counts() {
        check_against_membership(
            |c, g, b| count_star(c, g, b, R, R, &|v| v >= ALIVE_START),
            |dx, dy| {
                (dy == 0 && dx.abs() <= R)
                    || (dy != 0 && dy.abs() <= R && (dx == 0 || dx.abs() == dy.abs()) && dx.abs() <= R)
            },
        );
    }

    #[test]
    fn test_hash_counts() {
        check_against_membership(
            |c, g, b| count_hash(c, g, b, R, R, &|v| v >= ALIVE_START),
            |dx, dy| {
                (dy.abs() == 1 && dx.abs() <= R)
                    || (dy.abs() != 1 && dy.abs() <= R && dx.abs() == 1)
                    || (dx == 0 && dy == 0)
            },
        );
    }

    #[test]
    fn test_hexagonal_counts() {
        check_against_membership(
            |c, g, b| count_hexagonal(c, g, b, R, R, &|v| v >= ALIVE_START),
            |dx, dy| {
                if dy < 0 {
                    dy >= -R && dx >= -R && dx <= R + dy
                } else {
                    dy <= R && dx >= -R + dy && dx <= R
                }
            },
        );
    }

    #[test]
    fn test_tripod_counts() {
        check_against_membership(
            |c, g, b| count_tripod(c, g, b, R, R, &|v| v >= ALIVE_START),
            |dx, dy| {
                (dx == 0 && (-R..0).contains(&dy))
                    || (dy == 0 && (-R..=0).contains(&dx))
                    || (dx == dy && (1..=R).contains(&dx))
            },
        );
    }

    #[test]
    fn test_shaped_counts_circular() {
        // widths for an L2 disc of range 2
        let widths = [0u32, 1, 2, 1, 0];
        check_against_membership(
            |c, g, b| count_shaped(c, g, b, R, R, &widths, &|v| v >= ALIVE_START),
            |dx, dy| dy.abs() <= R && dx.abs() <= [0i32, 1, 2, 1, 0][(dy + R) as usize],
        );
    }

    #[test]
    fn test_weighted_r1_matches_direct() {
        let colour = seeded();
        let bounds = eval_bounds();
        let weights: [i8; 9] = [1, 2, 1, 2, 0, 2, 1, 2, 1];

        let mut fast = CountGrid::new(128, 128);
        count_weighted(&mut fast, &colour, &bounds, 1, 1, &weights, false, &|v| {
            v >= ALIVE_START
        });

        for y in (bounds.bottom - 1..=bounds.top + 1).step_by(2) {
            for x in (bounds.left - 1..=bounds.right + 1).step_by(2) {
                let mut expected = 0;
                let mut k = 0;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if colour.get(x + dx, y + dy) >= ALIVE_START {
                            expected += weights[k] as i32;
                        }
                        k += 1;
                    }
                }
                assert_eq!(fast.get(x, y), expected, "weighted count at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_weighted_triangular_uses_second_half() {
        let mut colour = ColourGrid::new(128, 128);
        colour.set(60, 59, ALIVE_START); // directly above the probes

        // first half all zeros, second half all ones
        let side = (2 * 1 + 1) * (2 * 1 + 1);
        let mut weights = vec![0i8; side];
        weights.extend(std::iter::repeat_n(1i8, side));

        let bounds = GridBounds::new(58, 58, 62, 62);
        let mut counts = CountGrid::new(128, 128);
        count_weighted(&mut counts, &colour, &bounds, 1, 1, &weights, true, &|v| {
            v >= ALIVE_START
        });

        // (60, 60) has even parity: first kernel half, weight 0
        assert_eq!(counts.get(60, 60), 0);
        // (61, 60) has odd parity: second half, weight 1 per live cell
        assert_eq!(counts.get(61, 60), 1);
    }

    #[test]
    fn test_weighted_states_counts_dead_cells() {
        let mut colour = ColourGrid::new(128, 128);
        colour.set(40, 40, ALIVE_START);

        let weights = vec![1i8; 9];
        let bounds = GridBounds::new(39, 39, 41, 41);
        let mut counts = CountGrid::new(128, 128);
        count_weighted_states(&mut counts, &colour, &bounds, 1, 1, &weights, 1, 3, &|v| {
            v >= ALIVE_START
        });

        // eight dead neighbours at weight 1, one live centre at weight 3
        assert_eq!(counts.get(40, 40), 8 + 3);
    }

    #[test]
    fn test_checkerboard_parities_partition_window() {
        let colour = seeded();
        let bounds = eval_bounds();

        let mut checker = CountGrid::new(128, 128);
        let mut aligned = CountGrid::new(128, 128);
        count_checker_both(&mut checker, &colour, &bounds, R, R, 1, &|v| v >= ALIVE_START);
        count_checker_both(&mut aligned, &colour, &bounds, R, R, 0, &|v| v >= ALIVE_START);

        // the two parities plus the centre-less full window: every window
        // cell lands in exactly one of the two kernels, the centre in the
        // start-1 kernel only
        for y in (bounds.bottom..=bounds.top).step_by(5) {
            for x in (bounds.left..=bounds.right).step_by(5) {
                let mut window = 0;
                for dy in -R..=R {
                    for dx in -R..=R {
                        if !(dx == 0 && dy == 0) && colour.get(x + dx, y + dy) >= ALIVE_START {
                            window += 1;
                        }
                    }
                }
                let centre = i32::from(colour.get(x, y) >= ALIVE_START);
                assert_eq!(
                    checker.get(x, y) + aligned.get(x, y),
                    window + 2 * centre,
                    "parity partition at ({}, {})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_custom_list_geometry() {
        let mut colour = ColourGrid::new(128, 128);
        colour.set(50, 48, ALIVE_START); // (0, -2) from the probe
        colour.set(52, 50, ALIVE_START); // (+2, 0)

        // rows encoded as [offset, n, cols..]: row -2 col 0, row 0 cols -2 and +2
        let list: Vec<i16> = vec![-2, 1, 0, 0, 2, -2, 2];

        let bounds = GridBounds::new(48, 48, 52, 52);
        let mut counts = CountGrid::new(128, 128);
        count_custom(&mut counts, &colour, &bounds, 2, 2, &list, false, &|v| {
            v >= ALIVE_START
        });

        assert_eq!(counts.get(50, 50), 2);
        assert_eq!(counts.get(51, 50), 0);
    }

    #[test]
    fn test_gaussian_weights() {
        let mut colour = ColourGrid::new(128, 128);
        colour.set(60, 60, ALIVE_START);

        let bounds = GridBounds::new(56, 56, 64, 64);
        let mut counts = CountGrid::new(128, 128);
        count_gaussian(&mut counts, &colour, &bounds, R, R, &|v| v >= ALIVE_START);

        // centre weight is (r+1)^2 + 1
        assert_eq!(counts.get(60, 60), 9 + 1);
        // one step left: (r+1-1)(r+1) = 6
        assert_eq!(counts.get(61, 60), 6);
        // diagonal step: 2*2 = 4
        assert_eq!(counts.get(61, 61), 4);
        assert_eq!(counts.get(63, 60), 0);
    }

    #[test]
    fn test_corner_edge_counts() {
        check_against_membership(
            |c, g, b| count_corner_edge(c, g, b, R, R, 2, 2, &|v| v >= ALIVE_START),
            |dx, dy| {
                (dx.abs() == 2 && dy.abs() == 2)
                    || (dx == 0 && dy.abs() == 2)
                    || (dy == 0 && dx.abs() == 2)
                    || (dx == 0 && dy == 0)
            },
        );
    }
}
