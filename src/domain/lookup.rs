//! Lookup table for the Life-like engine.
//!
//! The engine evaluates 16 cells at a time from three 18-bit row windows
//! (chunk plus one borrowed bit on each side). Each window splits into four
//! overlapping 6-bit slices; a slice triple (previous row, current row,
//! next row) forms an 18-bit index into a table whose entry holds the four
//! output bits for the slice's middle columns.
//!
//! Slice bit layout: bit 5 is the leftmost of the six columns. Output bit 3
//! is the leftmost of the four result cells.

use super::rules::LifeRule;

/// Number of entries in a Life lookup table
pub const LOOKUP_ENTRIES: usize = 1 << 18;

/// Build the 2^18-entry table for a birth/survival rule
pub fn build_life_lookup(rule: &LifeRule) -> Vec<u8> {
    let mut table = vec![0u8; LOOKUP_ENTRIES];

    for (idx, entry) in table.iter_mut().enumerate() {
        let above = (idx >> 12) & 0x3F;
        let current = (idx >> 6) & 0x3F;
        let below = idx & 0x3F;

        let col = |slice: usize, j: usize| -> u32 { ((slice >> (5 - j)) & 1) as u32 };

        let mut out = 0u8;
        for c in 1..=4 {
            let neighbours = col(above, c - 1)
                + col(above, c)
                + col(above, c + 1)
                + col(current, c - 1)
                + col(current, c + 1)
                + col(below, c - 1)
                + col(below, c)
                + col(below, c + 1);
            let alive = col(current, c) != 0;

            if rule.next_state(alive, neighbours as u8) {
                out |= 1 << (4 - c);
            }
        }
        *entry = out;
    }

    table
}

/// Lookup table pair for a Life-like rule; the alternate table, when
/// present, is used on odd generations (anti-glide-symmetric rules).
pub struct LifeLookup {
    table: Vec<u8>,
    alt: Option<Vec<u8>>,
}

impl LifeLookup {
    pub fn new(rule: &LifeRule) -> Self {
        Self {
            table: build_life_lookup(rule),
            alt: None,
        }
    }

    pub fn with_alternate(rule: &LifeRule, alt_rule: &LifeRule) -> Self {
        Self {
            table: build_life_lookup(rule),
            alt: Some(build_life_lookup(alt_rule)),
        }
    }

    /// Table to use for the given generation
    #[inline]
    pub fn table_for(&self, generation: u64) -> &[u8] {
        match &self.alt {
            Some(alt) if generation & 1 == 1 => alt,
            _ => &self.table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_stays_dead() {
        let table = build_life_lookup(&LifeRule::conway());
        assert_eq!(table[0], 0);
    }

    #[test]
    fn test_birth_from_row_above() {
        let table = build_life_lookup(&LifeRule::conway());

        // columns 0..2 of the row above are live: the cell at column 1 sees
        // three neighbours and is born; column 2 sees only two
        let above = 0b111000usize;
        let idx = above << 12;

        assert_ne!(table[idx] & 0b1000, 0, "column 1 should be born");
        assert_eq!(table[idx] & 0b0100, 0, "column 2 should stay dead");
    }

    #[test]
    fn test_survival_of_middle_cell() {
        let table = build_life_lookup(&LifeRule::conway());

        // current row has columns 0..2 live: column 1 has two neighbours
        let current = 0b111000usize;
        let idx = current << 6;

        assert_ne!(table[idx] & 0b1000, 0, "column 1 survives with two neighbours");
        assert_eq!(table[idx] & 0b0100, 0, "column 2 dies with one neighbour");
    }

    #[test]
    fn test_alternate_table_by_parity() {
        let lookup = LifeLookup::with_alternate(&LifeRule::conway(), &LifeRule::seeds());

        let even = lookup.table_for(0);
        let odd = lookup.table_for(1);
        assert!(!std::ptr::eq(even.as_ptr(), odd.as_ptr()));
        assert!(std::ptr::eq(even.as_ptr(), lookup.table_for(2).as_ptr()));
    }

    #[test]
    fn test_matches_direct_rule_on_sample_windows() {
        let rule = LifeRule::highlife();
        let table = build_life_lookup(&rule);

        // walk a spread of indices and cross-check column 2's output
        for idx in (0..LOOKUP_ENTRIES).step_by(4097) {
            let above = (idx >> 12) & 0x3F;
            let current = (idx >> 6) & 0x3F;
            let below = idx & 0x3F;
            let bit = |s: usize, j: usize| ((s >> (5 - j)) & 1) as u8;

            let neighbours = bit(above, 1)
                + bit(above, 2)
                + bit(above, 3)
                + bit(current, 1)
                + bit(current, 3)
                + bit(below, 1)
                + bit(below, 2)
                + bit(below, 3);
            let expected = rule.next_state(bit(current, 2) != 0, neighbours);

            assert_eq!(
                table[idx] & 0b0100 != 0,
                expected,
                "index {:#x} column 2",
                idx
            );
        }
    }
}
