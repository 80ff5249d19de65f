/// A seed pattern: relative coordinates of live cells
#[derive(Clone)]
pub struct Pattern {
    pub name: &'static str,
    pub description: &'static str,
    pub width: usize,
    pub height: usize,
    pub cells: Vec<(usize, usize)>,
}

impl Pattern {
    pub fn new(name: &'static str, description: &'static str, cells: Vec<(usize, usize)>) -> Self {
        let width = cells.iter().map(|(x, _)| *x).max().unwrap_or(0) + 1;
        let height = cells.iter().map(|(_, y)| *y).max().unwrap_or(0) + 1;
        Self {
            name,
            description,
            width,
            height,
            cells,
        }
    }

    /// Seed the pattern into an engine with its top-left at (x, y)
    pub fn place_on(&self, engine: &mut crate::application::Engine, x: i32, y: i32) {
        for &(dx, dy) in &self.cells {
            engine.set_cell_alive(x + dx as i32, y + dy as i32);
        }
    }
}

/// Classic pattern library
pub mod presets {
    use super::*;

    /// Glider - simplest spaceship, moves diagonally
    pub fn glider() -> Pattern {
        Pattern::new(
            "Glider",
            "Moves diagonally (period 4)",
            vec![(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
        )
    }

    /// Blinker - period 2 oscillator
    pub fn blinker() -> Pattern {
        Pattern::new("Blinker", "Oscillator (period 2)", vec![(0, 1), (1, 1), (2, 1)])
    }

    /// Toad - period 2 oscillator
    pub fn toad() -> Pattern {
        Pattern::new(
            "Toad",
            "Oscillator (period 2)",
            vec![(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
        )
    }

    /// Block - still life
    pub fn block() -> Pattern {
        Pattern::new("Block", "Still life", vec![(0, 0), (1, 0), (0, 1), (1, 1)])
    }

    /// R-pentomino - long-lived methuselah
    pub fn r_pentomino() -> Pattern {
        Pattern::new(
            "R-pentomino",
            "Methuselah (1103 generations)",
            vec![(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
        )
    }

    /// Lightweight spaceship, moves horizontally
    pub fn lwss() -> Pattern {
        Pattern::new(
            "LWSS",
            "Spaceship (period 4)",
            vec![
                (1, 0),
                (4, 0),
                (0, 1),
                (0, 2),
                (4, 2),
                (0, 3),
                (1, 3),
                (2, 3),
                (3, 3),
            ],
        )
    }

    pub fn all_patterns() -> Vec<Pattern> {
        vec![glider(), blinker(), toad(), block(), r_pentomino(), lwss()]
    }
}
