//! Compressed rule-matrix evaluation.
//!
//! For each neighbour position there is a per-state bitset over the rules:
//! bit r is set when rule r accepts that state at that position. Matching
//! ANDs the bitsets of the actual neighbourhood word by word; the lowest
//! surviving bit names the winning rule and its output state. A cell with
//! no matching rule keeps its state.
//!
//! Neighbour position order (position 0 is the centre):
//!
//! - Moore: C, N, NE, E, SE, S, SW, W, NW
//! - Hexagonal: C, N, E, SE, S, W, NW
//! - von Neumann: C, N, E, S, W

use crate::domain::bounds::{GridBounds, StepStats};
use crate::domain::grid::ColourGrid;
use crate::domain::rules::RuleError;
use crate::domain::tile::TileGrid;

use super::StateTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableNeighbourhood {
    Moore,
    Hexagonal,
    VonNeumann,
}

impl TableNeighbourhood {
    pub const fn positions(&self) -> usize {
        match self {
            TableNeighbourhood::Moore => 9,
            TableNeighbourhood::Hexagonal => 7,
            TableNeighbourhood::VonNeumann => 5,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RuleTableLut {
    pub neighbourhood: TableNeighbourhood,
    pub states: u8,
    /// Words per state entry (rule count rounded up to 64)
    pub n_compressed: usize,
    /// One bitset array per neighbour position, indexed
    /// `state * n_compressed + word`
    pub position_luts: Vec<Vec<u64>>,
    /// Output state per rule index
    pub outputs: Vec<u8>,
}

impl RuleTableLut {
    pub fn new(
        neighbourhood: TableNeighbourhood,
        states: u8,
        n_compressed: usize,
        position_luts: Vec<Vec<u64>>,
        outputs: Vec<u8>,
    ) -> Result<Self, RuleError> {
        if states < 2 {
            return Err(RuleError::TooFewStates(states));
        }
        let expected = states as usize * n_compressed;
        for lut in &position_luts {
            if lut.len() != expected {
                return Err(RuleError::LookupLength {
                    expected,
                    got: lut.len(),
                });
            }
        }
        if position_luts.len() != neighbourhood.positions() {
            return Err(RuleError::LookupLength {
                expected: neighbourhood.positions(),
                got: position_luts.len(),
            });
        }
        Ok(Self {
            neighbourhood,
            states,
            n_compressed,
            position_luts,
            outputs,
        })
    }

    /// Build from explicit transition rows `(inputs per position, output)`
    pub fn from_rules(
        neighbourhood: TableNeighbourhood,
        states: u8,
        rules: &[(Vec<Vec<u8>>, u8)],
    ) -> Result<Self, RuleError> {
        let positions = neighbourhood.positions();
        let n_compressed = rules.len().div_ceil(64).max(1);
        let mut position_luts = vec![vec![0u64; states as usize * n_compressed]; positions];
        let mut outputs = Vec::with_capacity(rules.len());

        for (r, (inputs, output)) in rules.iter().enumerate() {
            for (pos, accepted) in inputs.iter().enumerate() {
                for &state in accepted {
                    position_luts[pos][state as usize * n_compressed + r / 64] |= 1u64 << (r % 64);
                }
            }
            outputs.push(*output);
        }

        Self::new(neighbourhood, states, n_compressed, position_luts, outputs)
    }

    /// Lowest-numbered rule accepting the neighbourhood, if any.
    /// `states[0]` is the centre cell.
    #[inline]
    pub fn match_rule(&self, states: &[u8]) -> Option<usize> {
        for w in 0..self.n_compressed {
            let mut acc = u64::MAX;
            for (pos, &state) in states.iter().enumerate() {
                acc &= self.position_luts[pos][state as usize * self.n_compressed + w];
                if acc == 0 {
                    break;
                }
            }
            if acc != 0 {
                return Some(w * 64 + acc.trailing_zeros() as usize);
            }
        }
        None
    }

    #[inline]
    fn next_state(&self, states: &[u8]) -> u8 {
        match self.match_rule(states) {
            Some(r) => self.outputs[r],
            None => states[0],
        }
    }
}

/// Advance one generation of a rule-table rule over the rectangle
pub fn next_generation_rule_table(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lut: &RuleTableLut,
    bounds: &GridBounds,
) -> StepStats {
    match lut.neighbourhood {
        TableNeighbourhood::Moore => next_generation_rule_table_moore(src, dst, tiles, lut, bounds),
        TableNeighbourhood::Hexagonal => next_generation_rule_table_hex(src, dst, tiles, lut, bounds),
        TableNeighbourhood::VonNeumann => next_generation_rule_table_vn(src, dst, tiles, lut, bounds),
    }
}

pub fn next_generation_rule_table_moore(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lut: &RuleTableLut,
    bounds: &GridBounds,
) -> StepStats {
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let states = [
                src.get(x, y),
                src.get(x, y - 1),
                src.get(x + 1, y - 1),
                src.get(x + 1, y),
                src.get(x + 1, y + 1),
                src.get(x, y + 1),
                src.get(x - 1, y + 1),
                src.get(x - 1, y),
                src.get(x - 1, y - 1),
            ];
            let new = lut.next_state(&states);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, states[0], new);
        }
    }

    tracker.finish()
}

pub fn next_generation_rule_table_hex(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lut: &RuleTableLut,
    bounds: &GridBounds,
) -> StepStats {
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let states = [
                src.get(x, y),
                src.get(x, y - 1),
                src.get(x + 1, y),
                src.get(x + 1, y + 1),
                src.get(x, y + 1),
                src.get(x - 1, y),
                src.get(x - 1, y - 1),
            ];
            let new = lut.next_state(&states);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, states[0], new);
        }
    }

    tracker.finish()
}

pub fn next_generation_rule_table_vn(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    lut: &RuleTableLut,
    bounds: &GridBounds,
) -> StepStats {
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let states = [
                src.get(x, y),
                src.get(x, y - 1),
                src.get(x + 1, y),
                src.get(x, y + 1),
                src.get(x - 1, y),
            ];
            let new = lut.next_state(&states);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, states[0], new);
        }
    }

    tracker.finish()
}
