//! Bounded-grid edge preparation for the HROT kernels.
//!
//! Called immediately before a rule kernel: either copy the opposite edges
//! into the padding strips (torus) or zero the strips (clip), so the count
//! builders never special-case boundaries in their inner loops.

use crate::domain::bounds::GridBounds;
use crate::domain::grid::ColourGrid;

/// Fill the padding strips around the logical grid from the opposite
/// edges: `yrange` rows top and bottom, `xrange + 1` columns left and
/// right, corners crosswise.
pub fn wrap_torus_hrot(
    colour: &mut ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
) {
    let (lx, by, rx, ty) = (bounds.left, bounds.bottom, bounds.right, bounds.top);
    let row_size = (rx - lx + 1) as usize;
    let extended = (xrange + 1) as usize;

    // bottom rows into the top padding, top rows into the bottom padding
    for y in 0..yrange {
        colour.copy_run(lx, by + y, lx, ty + y + 1, row_size);
        colour.copy_run(lx, ty - y, lx, by - y - 1, row_size);
    }

    // left columns into the right padding, right columns into the left
    for y in by..=ty {
        colour.copy_run(lx, y, rx + 1, y, extended);
        colour.copy_run(rx - xrange, y, lx - xrange - 1, y, extended);
    }

    // corners: bottom rows wrap to the top padding and vice versa
    for y in 0..yrange {
        colour.copy_run(lx, by + y, rx + 1, ty + y + 1, extended);
        colour.copy_run(rx - xrange, by + y, lx - xrange - 1, ty + y + 1, extended);
        colour.copy_run(lx, ty - y, rx + 1, by - y - 1, extended);
        colour.copy_run(rx - xrange, ty - y, lx - xrange - 1, by - y - 1, extended);
    }
}

/// Zero every padding cell around the logical grid: `yrange` rows top and
/// bottom, `xrange + 1` columns left and right, corner blocks included.
pub fn clear_hrot_outside(
    colour: &mut ColourGrid,
    bounds: &GridBounds,
    xrange: i32,
    yrange: i32,
) {
    let (lx, by, rx, ty) = (bounds.left, bounds.bottom, bounds.right, bounds.top);

    // top and bottom strips
    colour.clear_rect(&GridBounds::new(lx, ty + 1, rx, ty + yrange));
    colour.clear_rect(&GridBounds::new(lx, by - yrange, rx, by - 1));

    // left and right strips with their corner blocks
    colour.clear_rect(&GridBounds::new(rx + 1, by - yrange, rx + xrange + 1, ty + yrange));
    colour.clear_rect(&GridBounds::new(lx - xrange - 1, by - yrange, lx - 1, ty + yrange));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pens::ALIVE_START;

    fn logical_bounds() -> GridBounds {
        GridBounds::new(8, 8, 23, 23)
    }

    #[test]
    fn test_torus_copies_opposite_edges() {
        let mut colour = ColourGrid::new(64, 64);
        let bounds = logical_bounds();

        colour.set(8, 8, ALIVE_START); // bottom-left corner cell
        colour.set(23, 23, 100); // top-right corner cell
        colour.set(10, 23, 77); // top row

        wrap_torus_hrot(&mut colour, &bounds, 1, 1);

        // bottom row appears above the top edge
        assert_eq!(colour.get(8, 24), ALIVE_START);
        // top row appears below the bottom edge
        assert_eq!(colour.get(10, 7), 77);
        // left column appears right of the right edge
        assert_eq!(colour.get(24, 8), ALIVE_START);
        // right column appears left of the left edge
        assert_eq!(colour.get(7, 23), 100);
        // top-right corner wraps to below the bottom-left corner
        assert_eq!(colour.get(7, 7), 100);
        // bottom-left corner wraps to beyond the top-right corner
        assert_eq!(colour.get(24, 24), ALIVE_START);
    }

    #[test]
    fn test_torus_wrap_is_idempotent() {
        let mut colour = ColourGrid::new(64, 64);
        let bounds = logical_bounds();
        for k in 0..20 {
            colour.set(8 + (k * 5) % 16, 8 + (k * 7) % 16, (40 + k) as u8);
        }

        wrap_torus_hrot(&mut colour, &bounds, 2, 2);
        let first = colour.clone();
        wrap_torus_hrot(&mut colour, &bounds, 2, 2);

        for y in 0..64 {
            for x in 0..64 {
                assert_eq!(
                    colour.get(x, y),
                    first.get(x, y),
                    "second wrap changed ({}, {})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_clear_outside_zeroes_the_ring() {
        let mut colour = ColourGrid::new(64, 64);
        let bounds = logical_bounds();

        // stale values everywhere, including the padding
        for y in 4..28 {
            for x in 4..28 {
                colour.set(x, y, 9);
            }
        }

        clear_hrot_outside(&mut colour, &bounds, 2, 2);

        // one step beyond the logical grid reads as zero
        assert_eq!(colour.get(7, 8), 0);
        assert_eq!(colour.get(24, 8), 0);
        assert_eq!(colour.get(8, 7), 0);
        assert_eq!(colour.get(8, 24), 0);
        // corner blocks cleared
        assert_eq!(colour.get(5, 6), 0);
        assert_eq!(colour.get(26, 25), 0);
        // logical grid untouched
        assert_eq!(colour.get(8, 8), 9);
        assert_eq!(colour.get(23, 23), 9);
    }
}
