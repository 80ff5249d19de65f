//! Identification support: occupancy frames, per-cell counts and content
//! hashes for oscillator and spaceship detection.
//!
//! Occupancy frames pack each row of the active rectangle into 16-bit
//! words, most significant bit leftmost, appended to a ring of per-
//! generation bit planes. Hashes fold the row offset, column offset and
//! (for state-sensitive variants) a state discriminator of every live cell
//! with a fixed multiply-and-XOR scheme, ascending x within ascending y.

use crate::domain::bounds::GridBounds;
use crate::domain::grid::ColourGrid;

/// Hash seed shared by every variant
pub const HASH_SEED: u32 = 31415962;
/// Hash multiplier shared by every variant
pub const HASH_FACTOR: u32 = 1000003;

#[inline]
fn hash_fold(hash: u32, value: u32) -> u32 {
    hash.wrapping_mul(HASH_FACTOR) ^ value
}

/// Ring of per-generation occupancy bit planes over a fixed window.
pub struct OccupancyRing {
    /// Words per frame row
    pub row_words: usize,
    /// Words per frame
    pub frame_words: usize,
    /// Frames in the window
    pub window: usize,
    pub frames: Vec<u16>,
}

impl OccupancyRing {
    pub fn new(row_words: usize, rows: usize, window: usize) -> Self {
        let frame_words = row_words * rows;
        Self {
            row_words,
            frame_words,
            window,
            frames: vec![0u16; frame_words * window],
        }
    }

    /// Frame slot for a generation; older frames are overwritten cyclically
    #[inline]
    pub fn frame_mut(&mut self, generation: usize) -> &mut [u16] {
        let slot = generation % self.window;
        &mut self.frames[slot * self.frame_words..(slot + 1) * self.frame_words]
    }

    #[inline]
    pub fn frame(&self, generation: usize) -> &[u16] {
        let slot = generation % self.window;
        &self.frames[slot * self.frame_words..(slot + 1) * self.frame_words]
    }
}

fn pack_frame(
    colour: &ColourGrid,
    frame: &mut [u16],
    row_words: usize,
    bounds: &GridBounds,
    bit_start: u16,
    live: impl Fn(u8) -> bool,
) {
    for y in bounds.bottom..=bounds.top {
        let row = colour.row(y);
        let frame_row = &mut frame[(y - bounds.bottom) as usize * row_words..];

        let mut word = 0u16;
        let mut bit = bit_start;
        let mut out = 0usize;

        for x in bounds.left..=bounds.right {
            if live(row[x as usize]) {
                word |= bit;
            }
            bit >>= 1;
            if bit == 0 {
                bit = bit_start;
                frame_row[out] = word;
                out += 1;
                word = 0;
            }
        }
        if bit != bit_start {
            frame_row[out] = word;
        }
    }
}

/// Pack the live cells (pen threshold) of the rectangle into the frame for
/// this generation
pub fn update_occupancy_strict(
    colour: &ColourGrid,
    ring: &mut OccupancyRing,
    bounds: &GridBounds,
    generation: usize,
    alive_start: u8,
) {
    let row_words = ring.row_words;
    let frame = ring.frame_mut(generation);
    pack_frame(colour, frame, row_words, bounds, 0x8000, |c| c >= alive_start);
}

/// Super / RuleLoader form: the low bit of the state marks liveness
pub fn update_occupancy_strict_super_or_rule_loader(
    colour: &ColourGrid,
    ring: &mut OccupancyRing,
    bounds: &GridBounds,
    generation: usize,
) {
    let row_words = ring.row_words;
    let frame = ring.frame_mut(generation);
    pack_frame(colour, frame, row_words, bounds, 0x8000, |c| c & 1 == 1);
}

fn accumulate_counts(
    colour: &ColourGrid,
    counts: &mut [u32],
    bounds: &GridBounds,
    live: impl Fn(u8) -> bool + Sync,
) {
    use rayon::prelude::*;

    let row_width = bounds.width() as usize;
    counts
        .par_chunks_mut(row_width)
        .take(bounds.height() as usize)
        .enumerate()
        .with_min_len(16)
        .for_each(|(i, row_counts)| {
            let row = colour.row(bounds.bottom + i as i32);
            for (count, &cell) in row_counts
                .iter_mut()
                .zip(&row[bounds.left as usize..=bounds.right as usize])
            {
                if live(cell) {
                    *count += 1;
                }
            }
        });
}

/// Increment a per-cell counter for every live cell of the rectangle;
/// counts are laid out row-major over the rectangle
pub fn update_cell_counts(
    colour: &ColourGrid,
    counts: &mut [u32],
    bounds: &GridBounds,
    alive_start: u8,
) {
    accumulate_counts(colour, counts, bounds, |c| c >= alive_start);
}

/// Super / RuleTree form: low bit marks liveness
pub fn update_cell_counts_super_or_rule_tree(
    colour: &ColourGrid,
    counts: &mut [u32],
    bounds: &GridBounds,
) {
    accumulate_counts(colour, counts, bounds, |c| c & 1 == 1);
}

/// Hash of the live-cell set (pen threshold); translation-sensitive,
/// comparable only within this variant
pub fn get_hash_two_state(colour: &ColourGrid, bounds: &GridBounds, alive_start: u8) -> u32 {
    let mut hash = HASH_SEED;
    for y in bounds.bottom..=bounds.top {
        let row = colour.row(y);
        let yshift = (y - bounds.bottom) as u32;
        for x in bounds.left..=bounds.right {
            if row[x as usize] >= alive_start {
                hash = hash_fold(hash, yshift);
                hash = hash_fold(hash, (x - bounds.left) as u32);
            }
        }
    }
    hash
}

/// Super hash: odd states are live; state 6 cells fold an extra
/// discriminator so boundary markers are distinguished
pub fn get_hash_super(colour: &ColourGrid, bounds: &GridBounds) -> u32 {
    let mut hash = HASH_SEED;
    for y in bounds.bottom..=bounds.top {
        let row = colour.row(y);
        let yshift = (y - bounds.bottom) as u32;
        for x in bounds.left..=bounds.right {
            let state = row[x as usize];
            if state & 1 == 1 || state == 6 {
                hash = hash_fold(hash, yshift);
                hash = hash_fold(hash, (x - bounds.left) as u32);
                if state == 6 {
                    hash = hash_fold(hash, 6);
                }
            }
        }
    }
    hash
}

/// History hash: live cells plus overlay state-6 markers
pub fn get_hash_life_history(
    colour: &ColourGrid,
    overlay: &ColourGrid,
    bounds: &GridBounds,
    alive_start: u8,
    state6: u8,
) -> u32 {
    let mut hash = HASH_SEED;
    for y in bounds.bottom..=bounds.top {
        let row = colour.row(y);
        let overlay_row = overlay.row(y);
        let yshift = (y - bounds.bottom) as u32;
        for x in bounds.left..=bounds.right {
            let marker = overlay_row[x as usize];
            if row[x as usize] >= alive_start || marker == state6 {
                hash = hash_fold(hash, yshift);
                hash = hash_fold(hash, (x - bounds.left) as u32);
                if marker == state6 {
                    hash = hash_fold(hash, 6);
                }
            }
        }
    }
    hash
}

/// RuleLoader / PCA / Extended hash: states above the history band are
/// live and their offset state folds into the hash
pub fn get_hash_rule_loader_or_pca_or_extended(
    colour: &ColourGrid,
    bounds: &GridBounds,
    history_states: u8,
) -> u32 {
    let mut hash = HASH_SEED;
    for y in bounds.bottom..=bounds.top {
        let row = colour.row(y);
        let yshift = (y - bounds.bottom) as u32;
        for x in bounds.left..=bounds.right {
            let state = row[x as usize];
            if state > history_states {
                hash = hash_fold(hash, yshift);
                hash = hash_fold(hash, (x - bounds.left) as u32);
                hash = hash_fold(hash, (state - history_states) as u32);
            }
        }
    }
    hash
}

/// Generations hash: ageing states fold their distance from the top state
pub fn get_hash_generations(
    colour: &ColourGrid,
    bounds: &GridBounds,
    history_states: u8,
    num_states: u32,
) -> u32 {
    let mut hash = HASH_SEED;
    for y in bounds.bottom..=bounds.top {
        let row = colour.row(y);
        let yshift = (y - bounds.bottom) as u32;
        for x in bounds.left..=bounds.right {
            let state = row[x as usize];
            if state > history_states {
                hash = hash_fold(hash, yshift);
                hash = hash_fold(hash, (x - bounds.left) as u32);
                hash = hash_fold(hash, num_states - (state - history_states) as u32);
            }
        }
    }
    hash
}
