//! Decision-tree transition functions.
//!
//! The tree is two flat arrays: `a` holds node offsets, `b` holds leaf
//! states, and `base` roots the walk. Each neighbour state indexes the
//! current node in turn; the final input lands in `b`. Neighbour order is
//! fixed per neighbourhood and part of the tree encoding:
//!
//! - Moore: NW, NE, SW, SE, N, W, E, S, centre
//! - von Neumann: N, W, E, S, centre

use crate::domain::bounds::{GridBounds, StepStats};
use crate::domain::grid::ColourGrid;
use crate::domain::rules::RuleError;
use crate::domain::tile::TileGrid;

use super::StateTracker;

#[derive(Clone, Debug)]
pub struct RuleTree {
    pub a: Vec<u32>,
    pub b: Vec<u8>,
    pub base: u32,
    pub states: u8,
}

impl RuleTree {
    pub fn new(a: Vec<u32>, b: Vec<u8>, base: u32, states: u8) -> Result<Self, RuleError> {
        if states < 2 {
            return Err(RuleError::TooFewStates(states));
        }
        if base as usize >= a.len() {
            return Err(RuleError::MalformedTree {
                index: base as usize,
                len: a.len(),
            });
        }
        Ok(Self { a, b, base, states })
    }

    #[inline]
    fn next_state_moore(&self, n: [u8; 8], c: u8) -> u8 {
        let mut node = self.a[(self.base + n[0] as u32) as usize];
        for &input in &n[1..] {
            node = self.a[(node + input as u32) as usize];
        }
        self.b[(node + c as u32) as usize]
    }

    #[inline]
    fn next_state_vn(&self, n: [u8; 4], c: u8) -> u8 {
        let mut node = self.a[(self.base + n[0] as u32) as usize];
        for &input in &n[1..] {
            node = self.a[(node + input as u32) as usize];
        }
        self.b[(node + c as u32) as usize]
    }
}

/// Moore decision-tree generation over the rectangle
pub fn next_generation_rule_tree_moore(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tree: &RuleTree,
    bounds: &GridBounds,
) -> StepStats {
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let neighbours = [
                src.get(x - 1, y - 1),
                src.get(x + 1, y - 1),
                src.get(x - 1, y + 1),
                src.get(x + 1, y + 1),
                src.get(x, y - 1),
                src.get(x - 1, y),
                src.get(x + 1, y),
                src.get(x, y + 1),
            ];
            let old = src.get(x, y);
            let new = tree.next_state_moore(neighbours, old);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, old, new);
        }
    }

    tracker.finish()
}

/// Moore decision tree, four cells per step: the nine-cell stencil slides
/// one column at a time so each step reads only the entering column
pub fn next_generation_rule_tree_moore_partial4(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tree: &RuleTree,
    bounds: &GridBounds,
) -> StepStats {
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        // sliding stencil columns: left, mid, entering right
        let mut left = [
            src.get(bounds.left - 1, y - 1),
            src.get(bounds.left - 1, y),
            src.get(bounds.left - 1, y + 1),
        ];
        let mut mid = [
            src.get(bounds.left, y - 1),
            src.get(bounds.left, y),
            src.get(bounds.left, y + 1),
        ];

        let mut x = bounds.left;
        while x <= bounds.right {
            let steps = (bounds.right - x + 1).min(4);
            for _ in 0..steps {
                let right = [src.get(x + 1, y - 1), src.get(x + 1, y), src.get(x + 1, y + 1)];

                let neighbours = [
                    left[0], right[0], left[2], right[2], mid[0], left[1], right[1], mid[2],
                ];
                let old = mid[1];
                let new = tree.next_state_moore(neighbours, old);
                dst.set(x, y, new);
                tracker.record(tiles, x, y, old, new);

                left = mid;
                mid = right;
                x += 1;
            }
        }
    }

    tracker.finish()
}

/// Von Neumann decision-tree generation
pub fn next_generation_rule_tree_vn(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tree: &RuleTree,
    bounds: &GridBounds,
) -> StepStats {
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let neighbours = [
                src.get(x, y - 1),
                src.get(x - 1, y),
                src.get(x + 1, y),
                src.get(x, y + 1),
            ];
            let old = src.get(x, y);
            let new = tree.next_state_vn(neighbours, old);
            dst.set(x, y, new);
            tracker.record(tiles, x, y, old, new);
        }
    }

    tracker.finish()
}
