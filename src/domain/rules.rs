//! Rule definitions and lookup-table builders.
//!
//! Rule parsing lives with the host; this module holds the validated data
//! the kernels consume: birth/survival sets for the range-1 families, the
//! per-count combo list for HROT, and the neighbourhood geometry variants.

use thiserror::Error;

use super::pens::GenStates;

/// Bit 0 of a combo-list entry signals survival
pub const SURVIVAL_BIT: u8 = 1;
/// Bit 1 of a combo-list entry signals birth
pub const BIRTH_BIT: u8 = 2;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuleError {
    #[error("neighbour count {0} outside 0..=8")]
    CountOutOfRange(u32),
    #[error("rule needs at least two states, got {0}")]
    TooFewStates(u8),
    #[error("range must be at least 1, got {0}")]
    RangeTooSmall(i32),
    #[error("weighted kernel has {got} entries, expected {expected} for range {range}")]
    WeightedKernelLength { range: i32, expected: usize, got: usize },
    #[error("width table has {got} entries, expected {expected} for range {range}")]
    WidthTableLength { range: i32, expected: usize, got: usize },
    #[error("corner/edge range {0} exceeds neighbourhood range {1}")]
    CornerEdgeRange(i32, i32),
    #[error("decision tree references node {index} outside table of {len}")]
    MalformedTree { index: usize, len: usize },
    #[error("lookup table has {got} entries, expected {expected}")]
    LookupLength { expected: usize, got: usize },
}

/// Two-state outer-totalistic rule on the range-1 Moore neighbourhood
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifeRule {
    pub births: [bool; 9],
    pub survivals: [bool; 9],
}

impl LifeRule {
    /// Build from explicit birth and survival neighbour counts
    pub fn from_sets(births: &[u8], survivals: &[u8]) -> Result<Self, RuleError> {
        let mut rule = Self {
            births: [false; 9],
            survivals: [false; 9],
        };
        for &b in births {
            if b > 8 {
                return Err(RuleError::CountOutOfRange(b as u32));
            }
            rule.births[b as usize] = true;
        }
        for &s in survivals {
            if s > 8 {
                return Err(RuleError::CountOutOfRange(s as u32));
            }
            rule.survivals[s as usize] = true;
        }
        Ok(rule)
    }

    /// B3/S23
    pub fn conway() -> Self {
        Self::from_sets(&[3], &[2, 3]).unwrap()
    }

    /// B36/S23
    pub fn highlife() -> Self {
        Self::from_sets(&[3, 6], &[2, 3]).unwrap()
    }

    /// B2/S
    pub fn seeds() -> Self {
        Self::from_sets(&[2], &[]).unwrap()
    }

    /// Next boolean state for a cell with the given neighbour count
    #[inline]
    pub fn next_state(&self, alive: bool, neighbours: u8) -> bool {
        if alive {
            self.survivals[neighbours as usize]
        } else {
            self.births[neighbours as usize]
        }
    }
}

/// Per-count survival/birth table for the HROT families.
///
/// Weighted kernels can produce sums outside the table; those lanes read as
/// "no birth, no survival".
#[derive(Clone, Debug)]
pub struct ComboList {
    entries: Vec<u8>,
}

impl ComboList {
    pub fn from_entries(entries: Vec<u8>) -> Self {
        Self { entries }
    }

    /// Build for counts 0..=max_count from explicit birth/survival counts
    pub fn from_sets(births: &[u32], survivals: &[u32], max_count: u32) -> Self {
        let mut entries = vec![0u8; max_count as usize + 1];
        for &b in births {
            if (b as usize) < entries.len() {
                entries[b as usize] |= BIRTH_BIT;
            }
        }
        for &s in survivals {
            if (s as usize) < entries.len() {
                entries[s as usize] |= SURVIVAL_BIT;
            }
        }
        Self { entries }
    }

    #[inline]
    pub fn get(&self, count: i32) -> u8 {
        if count < 0 || count as usize >= self.entries.len() {
            0
        } else {
            self.entries[count as usize]
        }
    }

    #[inline]
    pub fn births(&self, count: i32) -> bool {
        self.get(count) & BIRTH_BIT != 0
    }

    #[inline]
    pub fn survives(&self, count: i32) -> bool {
        self.get(count) & SURVIVAL_BIT != 0
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// N-state ageing rule: state 0 dead, top state alive, intermediate states
/// decay by one each generation
#[derive(Clone, Copy, Debug)]
pub struct GenerationsRule {
    pub births: [bool; 9],
    pub survivals: [bool; 9],
    pub states: GenStates,
}

impl GenerationsRule {
    pub fn new(births: &[u8], survivals: &[u8], states: u8) -> Result<Self, RuleError> {
        if states < 2 {
            return Err(RuleError::TooFewStates(states));
        }
        let base = LifeRule::from_sets(births, survivals)?;
        Ok(Self {
            births: base.births,
            survivals: base.survivals,
            states: GenStates::new(states),
        })
    }

    /// Brian's Brain: 2/34/3 is written B2/S34 elsewhere; the classic form
    /// used here is births on 2, no survival, 3 states
    pub fn brians_brain() -> Self {
        Self::new(&[2], &[], 3).unwrap()
    }
}

/// Neighbourhood geometry for the HROT count builders
#[derive(Clone, Debug)]
pub enum Neighbourhood {
    Moore,
    VonNeumann,
    Cross,
    Saltire,
    Star,
    Hash,
    Asterisk,
    Tripod,
    CornerEdge { corner_range: i32, edge_range: i32 },
    Hexagonal,
    Triangular,
    Checkerboard,
    AlignedCheckerboard,
    Gaussian,
    /// L2 / circular: half-width of each neighbourhood row, bottom to top
    Shaped { widths: Vec<u32> },
    /// Sparse row-encoded neighbour list:
    /// `[row_offset, n, col_0, .. col_n-1, row_offset, n, ..]`
    Custom { list: Vec<i16>, triangular: bool },
    Weighted { weights: Vec<i8>, triangular: bool },
    WeightedStates { weights: Vec<i8>, dead_weight: u8, alive_weight: u8 },
}

impl Neighbourhood {
    /// Largest neighbourhood sum the combo list must cover (a superset is
    /// fine since lookups clamp)
    pub fn max_count(&self, range: i32) -> u32 {
        let r = range as u32;
        let window = (2 * r + 1) * (2 * r + 1);
        match self {
            Neighbourhood::Moore
            | Neighbourhood::Triangular
            | Neighbourhood::Checkerboard
            | Neighbourhood::AlignedCheckerboard
            | Neighbourhood::Shaped { .. }
            | Neighbourhood::Hexagonal => window,
            Neighbourhood::VonNeumann => 2 * r * (r + 1) + 1,
            Neighbourhood::Cross | Neighbourhood::Saltire => 4 * r + 1,
            Neighbourhood::Star | Neighbourhood::Hash => 8 * r + 1,
            Neighbourhood::Asterisk => 6 * r + 1,
            Neighbourhood::Tripod => 3 * r + 1,
            Neighbourhood::CornerEdge { .. } => 9,
            Neighbourhood::Gaussian => {
                let half = (r + 1) * (r + 1);
                half * half + 1
            }
            Neighbourhood::Custom { list, .. } => {
                // entries minus the per-row headers
                let mut cells = 0u32;
                let mut i = 0usize;
                while i + 1 < list.len() {
                    let n = list[i + 1] as u32;
                    cells += n;
                    i += 2 + n as usize;
                }
                cells + 1
            }
            Neighbourhood::Weighted { weights, .. } => {
                weights.iter().map(|&w| w.max(0) as u32).sum::<u32>() + 1
            }
            Neighbourhood::WeightedStates {
                weights,
                dead_weight,
                alive_weight,
            } => {
                let top = (*dead_weight).max(*alive_weight) as u32;
                weights.iter().map(|&w| w.max(0) as u32).sum::<u32>() * top + 1
            }
        }
    }
}

/// Validated HROT rule: range, geometry and the per-count combo list
#[derive(Clone, Debug)]
pub struct HrotRule {
    pub range: i32,
    pub neighbourhood: Neighbourhood,
    pub combo: ComboList,
}

impl HrotRule {
    pub fn new(
        range: i32,
        neighbourhood: Neighbourhood,
        births: &[u32],
        survivals: &[u32],
    ) -> Result<Self, RuleError> {
        if range < 1 {
            return Err(RuleError::RangeTooSmall(range));
        }

        let side = (2 * range + 1) as usize;
        match &neighbourhood {
            Neighbourhood::Weighted { weights, triangular } => {
                let expected = if *triangular { 2 * side * side } else { side * side };
                if weights.len() != expected {
                    return Err(RuleError::WeightedKernelLength {
                        range,
                        expected,
                        got: weights.len(),
                    });
                }
            }
            Neighbourhood::WeightedStates { weights, .. } => {
                if weights.len() != side * side {
                    return Err(RuleError::WeightedKernelLength {
                        range,
                        expected: side * side,
                        got: weights.len(),
                    });
                }
            }
            Neighbourhood::Shaped { widths } => {
                if widths.len() != side {
                    return Err(RuleError::WidthTableLength {
                        range,
                        expected: side,
                        got: widths.len(),
                    });
                }
            }
            Neighbourhood::CornerEdge {
                corner_range,
                edge_range,
            } => {
                if *corner_range > range || *edge_range > range {
                    return Err(RuleError::CornerEdgeRange(
                        (*corner_range).max(*edge_range),
                        range,
                    ));
                }
            }
            _ => {}
        }

        let combo = ComboList::from_sets(births, survivals, neighbourhood.max_count(range));
        Ok(Self {
            range,
            neighbourhood,
            combo,
        })
    }
}
