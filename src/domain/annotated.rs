//! State-annotated rule families: Super bookkeeping, the Investigator
//! machine and the History overlay relabelling.
//!
//! Super runs a two-state rule underneath while the byte records where and
//! how cells lived: odd states are alive, even states are the trails and
//! history they leave. Investigator is fully table-driven; the host
//! supplies its transition table and forcing masks.

use super::bounds::{GridBounds, StepStats};
use super::grid::ColourGrid;
use super::rules::LifeRule;
use super::table::StateTracker;
use super::tile::TileGrid;

/// Number of Super states
pub const SUPER_STATES: u8 = 26;
/// The inert boundary state: never changes, blocks birth next to it and
/// diverts dying marked cells to state 9
pub const SUPER_BOUNDARY: u8 = 6;

/// Number of Investigator states
pub const INVESTIGATOR_STATES: u8 = 21;

const MOORE_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

const HEX_OFFSETS: [(i32, i32); 6] = [(0, -1), (1, 0), (1, 1), (0, 1), (-1, 0), (-1, -1)];

const VN_OFFSETS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// Ageing map applied when an alive (odd) Super state dies
#[inline]
fn super_death_state(state: u8, next_to_boundary: bool) -> u8 {
    match state {
        1 => 2,
        3 | 5 => {
            if next_to_boundary {
                9
            } else {
                4
            }
        }
        25 => 2, // the top label has no trail form
        s => s + 1, // 7 -> 8, 9 -> 10, 11 -> 12, trail labels likewise
    }
}

/// State a newborn Super cell takes from the history it grows over
#[inline]
fn super_birth_state(previous: u8) -> u8 {
    match previous {
        0 | 2 => 1,
        4 => 3,
        8 => 7,
        10 => 9,
        12 => 11,
        p if p >= 14 => p - 1, // trail labels resurrect as their live form
        _ => 1,
    }
}

pub struct SuperEngine {
    pub rule: LifeRule,
}

impl SuperEngine {
    pub fn new(rule: LifeRule) -> Self {
        Self { rule }
    }

    fn next_generation(
        &self,
        src: &ColourGrid,
        dst: &mut ColourGrid,
        tiles: &mut TileGrid,
        bounds: &GridBounds,
        offsets: &[(i32, i32)],
    ) -> StepStats {
        let mut tracker = StateTracker::new(src.width(), src.height());

        for y in bounds.bottom..=bounds.top {
            for x in bounds.left..=bounds.right {
                let state = src.get(x, y);

                let mut count = 0u8;
                let mut next_to_boundary = false;
                for &(dx, dy) in offsets {
                    let n = src.get(x + dx, y + dy);
                    if n & 1 == 1 {
                        count += 1;
                    }
                    if n == SUPER_BOUNDARY {
                        next_to_boundary = true;
                    }
                }

                let new = if state == SUPER_BOUNDARY {
                    state
                } else if state & 1 == 1 {
                    if self.rule.survivals[count as usize] && !next_to_boundary {
                        state
                    } else {
                        super_death_state(state, next_to_boundary)
                    }
                } else if self.rule.births[count as usize] && !next_to_boundary {
                    super_birth_state(state)
                } else {
                    state
                };

                dst.set(x, y, new);
                tracker.record(tiles, x, y, state, new);
            }
        }

        tracker.finish()
    }

    pub fn next_generation_moore(
        &self,
        src: &ColourGrid,
        dst: &mut ColourGrid,
        tiles: &mut TileGrid,
        bounds: &GridBounds,
    ) -> StepStats {
        self.next_generation(src, dst, tiles, bounds, &MOORE_OFFSETS)
    }

    pub fn next_generation_hex(
        &self,
        src: &ColourGrid,
        dst: &mut ColourGrid,
        tiles: &mut TileGrid,
        bounds: &GridBounds,
    ) -> StepStats {
        self.next_generation(src, dst, tiles, bounds, &HEX_OFFSETS)
    }

    pub fn next_generation_vn(
        &self,
        src: &ColourGrid,
        dst: &mut ColourGrid,
        tiles: &mut TileGrid,
        bounds: &GridBounds,
    ) -> StepStats {
        self.next_generation(src, dst, tiles, bounds, &VN_OFFSETS)
    }
}

/// Host-prepared tables for the Investigator machine
#[derive(Clone, Debug)]
pub struct InvestigatorTables {
    /// Unconditional next state for states >= 2
    pub next_state: [u8; INVESTIGATOR_STATES as usize],
    /// States whose presence as a neighbour forces a live cell to die
    pub dead_forcer: u32,
    /// States whose presence as a neighbour forces a dead cell to be born
    pub birth_forcer: u32,
    /// States a neighbour classifies as alive when the lookup is indexed
    pub treat_alive: u32,
    /// Next state for states 0 and 1, indexed by the classified neighbour
    /// bits (low bits, offset order) with the centre in the top bit
    pub lookup: Vec<u8>,
}

impl InvestigatorTables {
    #[inline]
    fn forces_death(&self, state: u8) -> bool {
        self.dead_forcer & (1 << state) != 0
    }

    #[inline]
    fn forces_birth(&self, state: u8) -> bool {
        self.birth_forcer & (1 << state) != 0
    }

    #[inline]
    fn classifies_alive(&self, state: u8) -> bool {
        self.treat_alive & (1 << state) != 0
    }
}

fn next_generation_investigator(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tables: &InvestigatorTables,
    bounds: &GridBounds,
    offsets: &[(i32, i32)],
) -> StepStats {
    debug_assert_eq!(tables.lookup.len(), 1 << (offsets.len() + 1));
    let mut tracker = StateTracker::new(src.width(), src.height());

    for y in bounds.bottom..=bounds.top {
        for x in bounds.left..=bounds.right {
            let state = src.get(x, y);

            let new = if state >= 2 {
                tables.next_state[state as usize]
            } else {
                let mut index = 0usize;
                let mut forced_dead = false;
                let mut forced_born = false;
                for (bit, &(dx, dy)) in offsets.iter().enumerate() {
                    let n = src.get(x + dx, y + dy);
                    if tables.classifies_alive(n) {
                        index |= 1 << bit;
                    }
                    forced_dead |= tables.forces_death(n);
                    forced_born |= tables.forces_birth(n);
                }

                if state == 1 && forced_dead {
                    0
                } else if state == 0 && forced_born {
                    1
                } else {
                    index |= (state as usize) << offsets.len();
                    tables.lookup[index]
                }
            };

            dst.set(x, y, new);
            tracker.record(tiles, x, y, state, new);
        }
    }

    tracker.finish()
}

pub fn next_generation_investigator_moore(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tables: &InvestigatorTables,
    bounds: &GridBounds,
) -> StepStats {
    next_generation_investigator(src, dst, tiles, tables, bounds, &MOORE_OFFSETS)
}

pub fn next_generation_investigator_hex(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tables: &InvestigatorTables,
    bounds: &GridBounds,
) -> StepStats {
    next_generation_investigator(src, dst, tiles, tables, bounds, &HEX_OFFSETS)
}

pub fn next_generation_investigator_vn(
    src: &ColourGrid,
    dst: &mut ColourGrid,
    tiles: &mut TileGrid,
    tables: &InvestigatorTables,
    bounds: &GridBounds,
) -> StepStats {
    next_generation_investigator(src, dst, tiles, tables, bounds, &VN_OFFSETS)
}

/// History overlay marker states
pub const OVERLAY_STATE3: u8 = 3;
pub const OVERLAY_STATE4: u8 = 4;
pub const OVERLAY_STATE5: u8 = 5;
pub const OVERLAY_STATE6: u8 = 6;

/// Render-time relabelling of an overlay marker against the underlying
/// cell: a marked-dead marker over a live cell shows as marked-alive and a
/// marked-alive marker over a dead cell as marked-dead.
/// Returns the state the rasteriser should colour, or the underlying state
/// when the overlay carries no marker.
#[inline]
pub fn overlay_state(marker: u8, cell_alive: bool, cell_state: u8) -> u8 {
    match marker {
        OVERLAY_STATE4 | OVERLAY_STATE6 if cell_alive => OVERLAY_STATE3,
        OVERLAY_STATE3 | OVERLAY_STATE5 if !cell_alive => OVERLAY_STATE4,
        OVERLAY_STATE3 | OVERLAY_STATE4 | OVERLAY_STATE5 | OVERLAY_STATE6 => marker,
        _ => cell_state,
    }
}
