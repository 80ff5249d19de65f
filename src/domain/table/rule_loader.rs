//! Packed-index lookup tables.
//!
//! The neighbourhood states pack into one integer, k bits per cell
//! (k = 1..5), which indexes a flat byte table of next states. The packing
//! is column-grouped so a one-column step right is a shift plus the
//! entering column:
//!
//! - Moore fields, low bits first: NW, W, SW, N, C, S, NE, E, SE
//!   (left column, middle column, right column; top to bottom)
//! - von Neumann fields: W, N, C, S, E
//! - Hexagonal fields: NW, W, N, C, S, E, SE
//!
//! Indices wider than 27 bits do not fit a flat table; the Moore k = 4 and
//! k = 5 forms translate each packed column through a first-stage array
//! and combine the three column codes instead.

use crate::domain::bounds::{GridBounds, StepStats};
use crate::domain::grid::ColourGrid;
use crate::domain::rules::RuleError;
use crate::domain::tile::TileGrid;

use super::StateTracker;

/// Widest index a flat table is allowed to cover
pub const MAX_DIRECT_BITS: u32 = 27;

#[derive(Clone, Debug)]
pub enum PackedLookup {
    /// Flat table indexed by the packed neighbourhood
    Direct { bits: u32, table: Vec<u8> },
    /// Column triples translate through `a` to `code_bits`-wide codes; the
    /// three codes index `lookup`
    TwoStage {
        bits: u32,
        a: Vec<u32>,
        code_bits: u32,
        lookup: Vec<u8>,
    },
}

impl PackedLookup {
    /// Flat table for a neighbourhood of `positions` cells at `bits` bits
    /// per cell
    pub fn direct(bits: u32, positions: u32, table: Vec<u8>) -> Result<Self, RuleError> {
        let width = bits * positions;
        if width > MAX_DIRECT_BITS {
            return Err(RuleError::LookupLength {
                expected: 1usize << MAX_DIRECT_BITS,
                got: table.len(),
            });
        }
        let expected = 1usize << width;
        if table.len() != expected {
            return Err(RuleError::LookupLength {
                expected,
                got: table.len(),
            });
        }
        Ok(Self::Direct { bits, table })
    }

    /// Two-stage Moore table: `a` maps each 3-cell packed column to a code
    pub fn two_stage(
        bits: u32,
        a: Vec<u32>,
        code_bits: u32,
        lookup: Vec<u8>,
    ) -> Result<Self, RuleError> {
        let expected_a = 1usize << (3 * bits);
        if a.len() != expected_a {
            return Err(RuleError::LookupLength {
                expected: expected_a,
                got: a.len(),
            });
        }
        let expected = 1usize << (3 * code_bits);
        if lookup.len() != expected {
            return Err(RuleError::LookupLength {
                expected,
                got: lookup.len(),
            });
        }
        Ok(Self::TwoStage {
            bits,
            a,
            code_bits,
            lookup,
        })
    }

    pub const fn bits(&self) -> u32 {
        match self {
            PackedLookup::Direct { bits, .. } => *bits,
            PackedLookup::TwoStage { bits, .. } => *bits,
        }
    }

    /// Next state from three packed columns (each 3 cells at `bits` bits,
    /// top cell in the low bits)
    #[inline]
    fn next_state_columns(&self, left: u32, mid: u32, right: u32) -> u8 {
        match self {
            PackedLookup::Direct { bits, table } => {
                let col = 3 * bits;
                let index = left | (mid << col) | (right << (2 * col));
                table[index as usize]
            }
            PackedLookup::TwoStage {
                a,
                code_bits,
                lookup,
                ..
            } => {
                let index = a[left as usize]
                    | (a[mid as usize] << code_bits)
                    | (a[right as usize] << (2 * code_bits));
                lookup[index as usize]
            }
        }
    }

    /// Next state from an already-packed flat index (von Neumann and
    /// hexagonal forms)
    #[inline]
    fn next_state_index(&self, index: u32) -> u8 {
        match self {
            PackedLookup::Direct { table, .. } => table[index as usize],
            PackedLookup::TwoStage { .. } => {
                debug_assert!(false, "two-stage tables are Moore-only");
                0
            }
        }
    }
}

/// Moore kernel: the three stencil columns slide across the row, each step
/// packing only the entering column
pub fn next_generation_rule_loader_moore(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lookup: &PackedLookup,
    bounds: &GridBounds,
) -> StepStats {
    let bits = lookup.bits();
    let mut tracker = StateTracker::new(src.width(), src.height());

    let pack_column = |x: i32, y: i32| -> u32 {
        let top = src.get(x, y - 1) as u32;
        let mid = src.get(x, y) as u32;
        let bottom = src.get(x, y + 1) as u32;
        debug_assert!(top < (1 << bits) && mid < (1 << bits) && bottom < (1 << bits));
        top | (mid << bits) | (bottom << (2 * bits))
    };

    for y in bounds.bottom..=bounds.top {
        let mut left = pack_column(bounds.left - 1, y);
        let mut mid = pack_column(bounds.left, y);

        for x in bounds.left..=bounds.right {
            let right = pack_column(x + 1, y);

            let old = src.get(x, y);
            let new = lookup.next_state_columns(left, mid, right);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, old, new);

            left = mid;
            mid = right;
        }
    }

    tracker.finish()
}

/// Von Neumann kernel: fields W, N, C, S, E
pub fn next_generation_rule_loader_vn(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lookup: &PackedLookup,
    bounds: &GridBounds,
) -> StepStats {
    let bits = lookup.bits();
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let old = src.get(x, y);
            let index = (src.get(x - 1, y) as u32)
                | ((src.get(x, y - 1) as u32) << bits)
                | ((old as u32) << (2 * bits))
                | ((src.get(x, y + 1) as u32) << (3 * bits))
                | ((src.get(x + 1, y) as u32) << (4 * bits));

            let new = lookup.next_state_index(index);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, old, new);
        }
    }

    tracker.finish()
}

/// Hexagonal kernel: fields NW, W, N, C, S, E, SE
pub fn next_generation_rule_loader_hex(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lookup: &PackedLookup,
    bounds: &GridBounds,
) -> StepStats {
    let bits = lookup.bits();
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let old = src.get(x, y);
            let index = (src.get(x - 1, y - 1) as u32)
                | ((src.get(x - 1, y) as u32) << bits)
                | ((src.get(x, y - 1) as u32) << (2 * bits))
                | ((old as u32) << (3 * bits))
                | ((src.get(x, y + 1) as u32) << (4 * bits))
                | ((src.get(x + 1, y) as u32) << (5 * bits))
                | ((src.get(x + 1, y + 1) as u32) << (6 * bits));

            let new = lookup.next_state_index(index);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, old, new);
        }
    }

    tracker.finish()
}

/// Dispatch on the table's neighbourhood form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoaderNeighbourhood {
    Moore,
    VonNeumann,
    Hexagonal,
}

pub fn next_generation_rule_loader(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    neighbourhood: LoaderNeighbourhood,
    lookup: &PackedLookup,
    bounds: &GridBounds,
) -> StepStats {
    match neighbourhood {
        LoaderNeighbourhood::Moore => {
            next_generation_rule_loader_moore(src, dst, tiles, lookup, bounds)
        }
        LoaderNeighbourhood::VonNeumann => {
            next_generation_rule_loader_vn(src, dst, tiles, lookup, bounds)
        }
        LoaderNeighbourhood::Hexagonal => {
            next_generation_rule_loader_hex(src, dst, tiles, lookup, bounds)
        }
    }
}

// The host prepares one table per bit width; these wrappers fix the
// supported widths as named entry points.
macro_rules! loader_entry {
    ($name:ident, $inner:ident, $k:expr) => {
        pub fn $name(
            src: &ColourGrid,
            dst: &mut ColourGrid,
            tiles: &mut TileGrid,
            lookup: &PackedLookup,
            bounds: &GridBounds,
        ) -> StepStats {
            debug_assert_eq!(lookup.bits(), $k);
            $inner(src, dst, tiles, lookup, bounds)
        }
    };
}

loader_entry!(next_generation_rule_loader_moore_lookup1, next_generation_rule_loader_moore, 1);
loader_entry!(next_generation_rule_loader_moore_lookup2, next_generation_rule_loader_moore, 2);
loader_entry!(next_generation_rule_loader_moore_lookup3, next_generation_rule_loader_moore, 3);
loader_entry!(next_generation_rule_loader_moore_lookup4, next_generation_rule_loader_moore, 4);
loader_entry!(next_generation_rule_loader_moore_lookup5, next_generation_rule_loader_moore, 5);
loader_entry!(next_generation_rule_loader_vn_lookup1, next_generation_rule_loader_vn, 1);
loader_entry!(next_generation_rule_loader_vn_lookup2, next_generation_rule_loader_vn, 2);
loader_entry!(next_generation_rule_loader_vn_lookup3, next_generation_rule_loader_vn, 3);
loader_entry!(next_generation_rule_loader_vn_lookup4, next_generation_rule_loader_vn, 4);
loader_entry!(next_generation_rule_loader_vn_lookup5, next_generation_rule_loader_vn, 5);
loader_entry!(next_generation_rule_loader_hex_lookup1, next_generation_rule_loader_hex, 1);
loader_entry!(next_generation_rule_loader_hex_lookup2, next_generation_rule_loader_hex, 2);
loader_entry!(next_generation_rule_loader_hex_lookup3, next_generation_rule_loader_hex, 3);
loader_entry!(next_generation_rule_loader_hex_lookup4, next_generation_rule_loader_hex, 4);
loader_entry!(next_generation_rule_loader_hex_lookup5, next_generation_rule_loader_hex, 5);

#[cfg(test)]
mod tests {
    use super::*;

    /// Conway as a 1-bit Moore table in the column-grouped packing
    fn conway_lookup() -> PackedLookup {
        let mut table = vec![0u8; 1 << 9];
        for (index, entry) in table.iter_mut().enumerate() {
            let bit = |f: usize| ((index >> f) & 1) as u8;
            // fields: NW W SW N C S NE E SE
            let centre = bit(4);
            let neighbours =
                bit(0) + bit(1) + bit(2) + bit(3) + bit(5) + bit(6) + bit(7) + bit(8);
            *entry = u8::from(neighbours == 3 || (centre == 1 && neighbours == 2));
        }
        PackedLookup::direct(1, 9, table).unwrap()
    }

    #[test]
    fn test_moore_lookup1_blinker() {
        let lookup = conway_lookup();
        let mut src = ColourGrid::new(64, 64);
        let mut dst = ColourGrid::new(64, 64);
        let mut tiles = TileGrid::new(64, 64);

        src.set(30, 31, 1);
        src.set(31, 31, 1);
        src.set(32, 31, 1);

        let bounds = GridBounds::new(28, 28, 35, 35);
        let stats =
            next_generation_rule_loader_moore_lookup1(&src, &mut dst, &mut tiles, &lookup, &bounds);

        assert_eq!(dst.get(31, 30), 1);
        assert_eq!(dst.get(31, 31), 1);
        assert_eq!(dst.get(31, 32), 1);
        assert_eq!(dst.get(30, 31), 0);
        assert_eq!(stats.population, 3);
    }

    #[test]
    fn test_two_stage_matches_direct() {
        let direct = conway_lookup();

        // identity first stage: every packed column is its own code
        let a: Vec<u32> = (0u32..8).collect();
        let table = match &direct {
            PackedLookup::Direct { table, .. } => table.clone(),
            _ => unreachable!(),
        };
        let two_stage = PackedLookup::two_stage(1, a, 3, table).unwrap();

        let mut src = ColourGrid::new(64, 64);
        for k in 0..25 {
            src.set(20 + (k * 7) % 20, 20 + (k * 3) % 20, 1);
        }
        let bounds = GridBounds::new(18, 18, 42, 42);

        let mut dst_a = ColourGrid::new(64, 64);
        let mut dst_b = ColourGrid::new(64, 64);
        let mut tiles_a = TileGrid::new(64, 64);
        let mut tiles_b = TileGrid::new(64, 64);

        next_generation_rule_loader_moore(&src, &mut dst_a, &mut tiles_a, &direct, &bounds);
        next_generation_rule_loader_moore(&src, &mut dst_b, &mut tiles_b, &two_stage, &bounds);

        for y in bounds.bottom..=bounds.top {
            for x in bounds.left..=bounds.right {
                assert_eq!(dst_a.get(x, y), dst_b.get(x, y), "cell ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_vn_lookup2_field_order() {
        // 2-bit table: next state = state of the west neighbour
        let mut table = vec![0u8; 1 << 10];
        for (index, entry) in table.iter_mut().enumerate() {
            *entry = (index & 3) as u8; // field 0 is W
        }
        let lookup = PackedLookup::direct(2, 5, table).unwrap();

        let mut src = ColourGrid::new(64, 64);
        src.set(30, 30, 3);
        let mut dst = ColourGrid::new(64, 64);
        let mut tiles = TileGrid::new(64, 64);

        let bounds = GridBounds::new(28, 28, 32, 32);
        next_generation_rule_loader_vn_lookup2(&src, &mut dst, &mut tiles, &lookup, &bounds);

        assert_eq!(dst.get(31, 30), 3, "state moves east when W is copied");
        assert_eq!(dst.get(30, 30), 0);
    }

    #[test]
    fn test_hex_excludes_ne_and_sw() {
        // 1-bit hex table: count of live neighbours (any) decides birth
        let mut table = vec![0u8; 1 << 7];
        for (index, entry) in table.iter_mut().enumerate() {
            let live = (index.count_ones() - ((index >> 3) & 1) as u32) as u8;
            let centre = ((index >> 3) & 1) as u8;
            *entry = u8::from(centre == 0 && live >= 1);
        }
        let lookup = PackedLookup::direct(1, 7, table).unwrap();

        let mut src = ColourGrid::new(64, 64);
        src.set(30, 30, 1);
        let mut dst = ColourGrid::new(64, 64);
        let mut tiles = TileGrid::new(64, 64);

        let bounds = GridBounds::new(27, 27, 33, 33);
        next_generation_rule_loader_hex_lookup1(&src, &mut dst, &mut tiles, &lookup, &bounds);

        // hexagonal neighbours of (30, 30) see it; NE and SW do not
        assert_eq!(dst.get(31, 30), 1, "east sees the live cell");
        assert_eq!(dst.get(31, 31), 1, "south-east sees the live cell");
        assert_eq!(dst.get(29, 29), 1, "north-west sees the live cell");
        assert_eq!(dst.get(31, 29), 0, "north-east is not a hex neighbour");
        assert_eq!(dst.get(29, 31), 0, "south-west is not a hex neighbour");
    }

    #[test]
    fn test_direct_table_size_validation() {
        assert!(PackedLookup::direct(1, 9, vec![0u8; 100]).is_err());
        assert!(PackedLookup::direct(4, 9, vec![0u8; 16]).is_err(), "36-bit index rejected");
    }
}
