//! Generations engine: N-state rules where the top state is alive, state 0
//! is dead and intermediate states decay by one each generation regardless
//! of the neighbourhood.
//!
//! The colour grid holds the state indices; a parallel bit grid mirrors
//! "state == maxGenState" so neighbour counting stays word-parallel and the
//! identify kernels keep working unchanged.

use super::bit_grid::BitGrid;
use super::bounds::{BoxTracker, StepStats};
use super::grid::{ColourGrid, TILE_SIZE};
use super::rules::GenerationsRule;
use super::tile::TileGrid;

pub struct GenerationsEngine {
    pub rule: GenerationsRule,
}

impl GenerationsEngine {
    pub fn new(rule: GenerationsRule) -> Self {
        Self { rule }
    }

    /// Advance one generation over the active tiles.
    ///
    /// `bits_src` mirrors liveness of the current colour grid; the mirror
    /// for the new generation is written to `bits_dst`. Decaying cells keep
    /// their tiles active until they fade to dead.
    pub fn next_generation(
        &self,
        colour: &mut ColourGrid,
        bits_src: &BitGrid,
        bits_dst: &mut BitGrid,
        tiles: &TileGrid,
        next_tiles: &mut TileGrid,
    ) -> StepStats {
        let states = self.rule.states;
        let max_gen = states.max_gen_state;
        let (width, height) = bits_src.dimensions();

        next_tiles.clear();

        let mut population = 0u32;
        let mut births = 0u32;
        let mut deaths = 0u32;
        let mut occupied = BoxTracker::new(width, height);
        let mut alive = BoxTracker::new(width, height);

        tiles.for_each_set(|tx, ty| {
            let x0 = (tx * TILE_SIZE) as i32;
            let y0 = (ty * TILE_SIZE) as i32;

            let mut tile_occupied = 0u16;
            let mut tile_diff = 0u16;
            let mut first_diff = 0u16;
            let mut last_diff = 0u16;

            for dy in 0..TILE_SIZE as i32 {
                let y = y0 + dy;
                let mut new_bits = 0u16;
                let mut row_diff = 0u16;
                let mut row_occupied = 0u16;
                let mut row_alive = false;

                for b in 0..TILE_SIZE as i32 {
                    let x = x0 + b;
                    let state = colour.get(x, y);
                    let mut next = state;

                    if state <= states.dead_state {
                        let count = bits_src.count_neighbours(x as usize, y as usize);
                        if self.rule.births[count as usize] {
                            next = max_gen;
                            births += 1;
                        } else if state > states.min_dead_state {
                            next = state - 1;
                        }
                    } else if state == max_gen {
                        let count = bits_src.count_neighbours(x as usize, y as usize);
                        if !self.rule.survivals[count as usize] {
                            next = state - 1;
                            deaths += 1;
                        }
                    } else if state > states.min_dead_state {
                        next = state - 1;
                    }

                    if next != state {
                        colour.set(x, y, next);
                        row_diff |= 0x8000 >> b;
                    }
                    if next != 0 {
                        row_occupied |= 0x8000 >> b;
                        occupied.include_x(x);
                        if next == max_gen {
                            new_bits |= 0x8000 >> b;
                            population += 1;
                            row_alive = true;
                            alive.include_x(x);
                        }
                    }
                }

                bits_dst.set_word(tx, y as usize, new_bits);

                tile_occupied |= row_occupied;
                tile_diff |= row_diff;
                if dy == 0 {
                    first_diff = row_diff;
                }
                if dy == TILE_SIZE as i32 - 1 {
                    last_diff = row_diff;
                }
                if row_occupied != 0 {
                    occupied.include_y(y);
                }
                if row_alive {
                    alive.include_y(y);
                }
            }

            if tile_occupied != 0 {
                next_tiles.set_tile(tx, ty);
            }
            next_tiles.mark_changed(tx, ty, tile_diff, first_diff, last_diff);
        });

        StepStats {
            population,
            births,
            deaths,
            occupied: occupied.finish(width, height),
            alive: alive.finish(width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(
        width: usize,
        height: usize,
        max_gen: u8,
        cells: &[(usize, usize, u8)],
    ) -> (ColourGrid, BitGrid, TileGrid) {
        let mut colour = ColourGrid::new(width, height);
        let mut bits = BitGrid::new(width, height);
        for &(x, y, state) in cells {
            colour.set(x as i32, y as i32, state);
            if state == max_gen {
                bits.set(x, y, true);
            }
        }
        let mut tiles = TileGrid::new(width, height);
        tiles.mark_from_bit_grid(&bits);
        (colour, bits, tiles)
    }

    #[test]
    fn test_decay_is_unconditional() {
        let engine = GenerationsEngine::new(GenerationsRule::new(&[3], &[2, 3], 5).unwrap());
        let (mut colour, bits, mut tiles) = setup(64, 64, 4, &[(10, 10, 2)]);
        // the decaying cell has no live neighbours; make its tile active
        tiles.set_tile(0, 0);
        let mut bits_dst = BitGrid::new(64, 64);
        let mut next_tiles = TileGrid::new(64, 64);

        engine.next_generation(&mut colour, &bits, &mut bits_dst, &tiles, &mut next_tiles);
        assert_eq!(colour.get(10, 10), 1);
        assert!(!bits_dst.get(10, 10));
    }

    #[test]
    fn test_dying_cell_starts_decay_chain() {
        // lone live cell: no survival, decays to max-1
        let engine = GenerationsEngine::new(GenerationsRule::new(&[3], &[2, 3], 4).unwrap());
        let (mut colour, bits, tiles) = setup(64, 64, 3, &[(20, 20, 3)]);
        let mut bits_dst = BitGrid::new(64, 64);
        let mut next_tiles = TileGrid::new(64, 64);

        let stats = engine.next_generation(&mut colour, &bits, &mut bits_dst, &tiles, &mut next_tiles);

        assert_eq!(colour.get(20, 20), 2);
        assert_eq!(stats.deaths, 1);
        assert_eq!(stats.population, 0);
        assert!(next_tiles.tile_set(1, 1), "decaying cell keeps its tile active");
    }

    #[test]
    fn test_brians_brain_oscillation() {
        let engine = GenerationsEngine::new(GenerationsRule::brians_brain());
        // two adjacent live cells: both die (no survival); their shared
        // vertical neighbours see 2 live cells and are born
        let (mut colour, bits, tiles) = setup(64, 64, 2, &[(30, 30, 2), (31, 30, 2)]);
        let mut bits_dst = BitGrid::new(64, 64);
        let mut next_tiles = TileGrid::new(64, 64);

        let stats = engine.next_generation(&mut colour, &bits, &mut bits_dst, &tiles, &mut next_tiles);

        assert_eq!(colour.get(30, 30), 1, "dying cell enters refractory state");
        assert_eq!(colour.get(31, 30), 1);
        assert_eq!(colour.get(30, 29), 2, "born above the pair");
        assert_eq!(colour.get(31, 29), 2);
        assert_eq!(colour.get(30, 31), 2, "born below the pair");
        assert_eq!(colour.get(31, 31), 2);
        assert!(bits_dst.get(30, 29));
        assert!(!bits_dst.get(30, 30));

        assert_eq!(stats.births, 4);
        assert_eq!(stats.deaths, 2);
        assert_eq!(stats.population, 4);
    }

    #[test]
    fn test_population_balance() {
        let engine = GenerationsEngine::new(GenerationsRule::new(&[2], &[], 3).unwrap());
        let (mut colour, bits, tiles) =
            setup(128, 128, 2, &[(60, 60, 2), (61, 60, 2), (62, 61, 2), (60, 62, 2)]);
        let before = bits.population();
        let mut bits_dst = BitGrid::new(128, 128);
        let mut next_tiles = TileGrid::new(128, 128);

        let stats = engine.next_generation(&mut colour, &bits, &mut bits_dst, &tiles, &mut next_tiles);

        assert_eq!(stats.population, before + stats.births - stats.deaths);
        assert_eq!(stats.population, bits_dst.population());
    }
}
