//! Tile bitmap for the dirty-region scheduler.
//!
//! Each bit marks one 16x16 tile of the cell grid; 16 tiles pack into one
//! word with the most significant bit holding the leftmost tile. A set bit
//! means the tile held at least one non-background cell at the end of the
//! last generation, or lies within one tile of such a tile.

use super::bit_grid::BitGrid;
use super::grid::TILE_SIZE;

#[derive(Clone)]
pub struct TileGrid {
    tile_cols: usize,
    tile_rows: usize,
    /// Words per tile row
    word_width: usize,
    words: Vec<u16>,
}

impl TileGrid {
    /// Tile map for a grid of the given cell dimensions
    pub fn new(grid_width: usize, grid_height: usize) -> Self {
        debug_assert!(grid_width % TILE_SIZE == 0 && grid_height % TILE_SIZE == 0);
        let tile_cols = grid_width / TILE_SIZE;
        let tile_rows = grid_height / TILE_SIZE;
        let word_width = tile_cols.div_ceil(16);
        Self {
            tile_cols,
            tile_rows,
            word_width,
            words: vec![0u16; word_width * tile_rows],
        }
    }

    pub const fn tile_cols(&self) -> usize {
        self.tile_cols
    }

    pub const fn tile_rows(&self) -> usize {
        self.tile_rows
    }

    #[inline]
    const fn bit_for(tx: usize) -> u16 {
        1 << (15 - (tx & 15))
    }

    #[inline]
    pub fn word(&self, wx: usize, ty: usize) -> u16 {
        self.words[ty * self.word_width + wx]
    }

    #[inline]
    pub fn tile_set(&self, tx: usize, ty: usize) -> bool {
        self.words[ty * self.word_width + (tx >> 4)] & Self::bit_for(tx) != 0
    }

    #[inline]
    pub fn set_tile(&mut self, tx: usize, ty: usize) {
        self.words[ty * self.word_width + (tx >> 4)] |= Self::bit_for(tx);
    }

    #[inline]
    pub fn clear_tile(&mut self, tx: usize, ty: usize) {
        self.words[ty * self.word_width + (tx >> 4)] &= !Self::bit_for(tx);
    }

    /// Set a tile, silently clipping coordinates that fall outside the map.
    /// Scheduler expansion at grid edges clips rather than wraps; wrapping
    /// is the bounded-grid kernels' job.
    #[inline]
    pub fn set_tile_clamped(&mut self, tx: i32, ty: i32) {
        if tx >= 0 && ty >= 0 && (tx as usize) < self.tile_cols && (ty as usize) < self.tile_rows {
            self.set_tile(tx as usize, ty as usize);
        }
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn count_set(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// OR this map into a history accumulator of the same shape
    pub fn or_into(&self, history: &mut TileGrid) {
        debug_assert_eq!(self.words.len(), history.words.len());
        for (dst, src) in history.words.iter_mut().zip(&self.words) {
            *dst |= src;
        }
    }

    /// Visit every set tile, row-major by tile row; within a word the
    /// highest bit (leftmost tile) is visited first
    pub fn for_each_set(&self, mut f: impl FnMut(usize, usize)) {
        for ty in 0..self.tile_rows {
            for wx in 0..self.word_width {
                let mut word = self.word(wx, ty);
                while word != 0 {
                    let b = word.leading_zeros() as usize;
                    f((wx << 4) + b, ty);
                    word &= !(0x8000 >> b);
                }
            }
        }
    }

    /// Record a tile whose cells changed this generation: the tile itself
    /// plus, for every edge or corner cell that changed, the matching
    /// neighbour tile. `first_diff` and `last_diff` are the change masks of
    /// the tile's top and bottom rows; `tile_diff` is the OR over all rows.
    pub fn mark_changed(&mut self, tx: usize, ty: usize, tile_diff: u16, first_diff: u16, last_diff: u16) {
        if tile_diff == 0 {
            return;
        }
        let (tx, ty) = (tx as i32, ty as i32);
        self.set_tile_clamped(tx, ty);
        if tile_diff & 0x8000 != 0 {
            self.set_tile_clamped(tx - 1, ty);
        }
        if tile_diff & 1 != 0 {
            self.set_tile_clamped(tx + 1, ty);
        }
        if first_diff != 0 {
            self.set_tile_clamped(tx, ty - 1);
            if first_diff & 0x8000 != 0 {
                self.set_tile_clamped(tx - 1, ty - 1);
            }
            if first_diff & 1 != 0 {
                self.set_tile_clamped(tx + 1, ty - 1);
            }
        }
        if last_diff != 0 {
            self.set_tile_clamped(tx, ty + 1);
            if last_diff & 0x8000 != 0 {
                self.set_tile_clamped(tx - 1, ty + 1);
            }
            if last_diff & 1 != 0 {
                self.set_tile_clamped(tx + 1, ty + 1);
            }
        }
    }

    /// Mark every tile overlapping live cells of a bit grid, plus one tile
    /// of margin in every direction
    pub fn mark_from_bit_grid(&mut self, bits: &BitGrid) {
        let (_, height) = bits.dimensions();
        for y in 0..height {
            let ty = y / TILE_SIZE;
            for wx in 0..bits.word_width() {
                if bits.word(wx as i32, y as i32) != 0 {
                    for dy in -1i32..=1 {
                        for dx in -1i32..=1 {
                            self.set_tile_clamped(wx as i32 + dx, ty as i32 + dy);
                        }
                    }
                }
            }
        }
    }
}

/// Drop tiles whose 16x16 region is empty in the current grid and zero the
/// matching region of the source buffer so double-buffering stays
/// consistent.
pub fn shrink_tile_grid(tiles: &mut TileGrid, current: &BitGrid, source: &mut BitGrid) {
    let mut died: Vec<(usize, usize)> = Vec::new();

    tiles.for_each_set(|tx, ty| {
        let y0 = ty * TILE_SIZE;
        let mut occupied = 0u16;
        for y in y0..y0 + TILE_SIZE {
            occupied |= current.word(tx as i32, y as i32);
        }
        if occupied == 0 {
            died.push((tx, ty));
        }
    });

    for (tx, ty) in died {
        tiles.clear_tile(tx, ty);
        let y0 = ty * TILE_SIZE;
        for y in y0..y0 + TILE_SIZE {
            source.set_word(tx, y, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_query() {
        let mut tiles = TileGrid::new(256, 256);
        assert!(tiles.is_empty());

        tiles.set_tile(0, 0);
        tiles.set_tile(15, 3);
        assert!(tiles.tile_set(0, 0));
        assert!(tiles.tile_set(15, 3));
        assert!(!tiles.tile_set(1, 0));
        assert_eq!(tiles.count_set(), 2);
    }

    #[test]
    fn test_clamped_set_ignores_outside() {
        let mut tiles = TileGrid::new(256, 256);
        tiles.set_tile_clamped(-1, 0);
        tiles.set_tile_clamped(0, -1);
        tiles.set_tile_clamped(16, 0);
        tiles.set_tile_clamped(0, 16);
        assert!(tiles.is_empty());

        tiles.set_tile_clamped(15, 15);
        assert!(tiles.tile_set(15, 15));
    }

    #[test]
    fn test_iteration_order_high_bit_first() {
        let mut tiles = TileGrid::new(512, 256);
        tiles.set_tile(5, 0);
        tiles.set_tile(2, 0);
        tiles.set_tile(20, 0);
        tiles.set_tile(0, 1);

        let mut visited = Vec::new();
        tiles.for_each_set(|tx, ty| visited.push((tx, ty)));

        // row-major; within a word the leftmost tile (highest bit) first
        assert_eq!(visited, vec![(2, 0), (5, 0), (20, 0), (0, 1)]);
    }

    #[test]
    fn test_history_accumulates() {
        let mut tiles = TileGrid::new(256, 256);
        let mut history = TileGrid::new(256, 256);

        tiles.set_tile(3, 3);
        tiles.or_into(&mut history);
        tiles.clear();
        tiles.set_tile(7, 7);
        tiles.or_into(&mut history);

        assert!(history.tile_set(3, 3));
        assert!(history.tile_set(7, 7));
    }

    #[test]
    fn test_mark_from_bit_grid_includes_margin() {
        let mut bits = BitGrid::new(256, 256);
        bits.set(40, 40, true); // tile (2, 2)

        let mut tiles = TileGrid::new(256, 256);
        tiles.mark_from_bit_grid(&bits);

        for ty in 1..=3 {
            for tx in 1..=3 {
                assert!(tiles.tile_set(tx, ty), "tile ({}, {}) should be set", tx, ty);
            }
        }
        assert!(!tiles.tile_set(0, 0));
        assert!(!tiles.tile_set(4, 4));
    }

    #[test]
    fn test_shrink_clears_dead_tiles_and_source() {
        let mut current = BitGrid::new(256, 256);
        let mut source = BitGrid::new(256, 256);
        let mut tiles = TileGrid::new(256, 256);

        // tile (1, 1) live in current; tile (4, 4) stale in source only
        current.set(20, 20, true);
        source.set(70, 70, true);
        tiles.set_tile(1, 1);
        tiles.set_tile(4, 4);

        shrink_tile_grid(&mut tiles, &current, &mut source);

        assert!(tiles.tile_set(1, 1));
        assert!(!tiles.tile_set(4, 4), "empty tile should be dropped");
        assert!(!source.get(70, 70), "stale source words should be cleared");
    }
}
