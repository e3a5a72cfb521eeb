//! Sudoku grid and puzzle generation.
//!
//! Generation is the classic base-pattern shuffle: start from the pattern
//! `(3 * (r % 3) + r / 3 + c) % 9`, shuffle row bands, rows within bands,
//! column stacks, columns within stacks, and the digit labels, then blank a
//! difficulty-dependent number of cells per row.

pub mod solve;

use rand::seq::{index, SliceRandom};
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus as BaseRng;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const SIDE: usize = 9;
pub const BASE: usize = 3;

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum Error {
    #[error("coordinates are outside the grid")]
    OutOfBounds,
    #[error("digit must be 1 through 9")]
    BadDigit,
    #[error("cell is a given and cannot change")]
    Given,
    #[error("expected {SIDE}x{SIDE} cells of digits or dots")]
    Malformed,
}

/// A 9x9 grid; `0` is an empty cell. Givens are the generated clues and
/// cannot be edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[u8; SIDE]; SIDE],
    given: [[bool; SIDE]; SIDE],
}

// Generation.
impl Grid {
    pub fn easy() -> Self {
        Self::generate(3)
    }

    pub fn medium() -> Self {
        Self::generate(5)
    }

    pub fn hard() -> Self {
        Self::generate(6)
    }

    pub fn generate(blanks_per_row: usize) -> Self {
        Self::generate_seeded(blanks_per_row, rand::rngs::OsRng.next_u64())
    }

    pub fn generate_seeded(blanks_per_row: usize, seed: u64) -> Self {
        let mut rng = BaseRng::seed_from_u64(seed);
        let blanks_per_row = blanks_per_row.min(SIDE);

        // Shuffle groups, then lines within each group.
        let mut lines = |rng: &mut BaseRng| -> Vec<usize> {
            let mut groups: Vec<usize> = (0..BASE).collect();
            groups.shuffle(rng);
            let mut out = Vec::with_capacity(SIDE);
            for g in groups {
                let mut inner: Vec<usize> = (0..BASE).collect();
                inner.shuffle(rng);
                out.extend(inner.into_iter().map(|l| g * BASE + l));
            }
            out
        };
        let rows = lines(&mut rng);
        let cols = lines(&mut rng);
        let mut digits: Vec<u8> = (1..=SIDE as u8).collect();
        digits.shuffle(&mut rng);

        let pattern = |r: usize, c: usize| (BASE * (r % BASE) + r / BASE + c) % SIDE;

        let mut cells = [[0u8; SIDE]; SIDE];
        for r in 0..SIDE {
            for c in 0..SIDE {
                cells[r][c] = digits[pattern(rows[r], cols[c])];
            }
        }

        for row in cells.iter_mut() {
            for blank in index::sample(&mut rng, SIDE, blanks_per_row).iter() {
                row[blank] = 0;
            }
        }

        let mut given = [[false; SIDE]; SIDE];
        for r in 0..SIDE {
            for c in 0..SIDE {
                given[r][c] = cells[r][c] != 0;
            }
        }
        log::debug!(
            "generated sudoku with {} blanks per row, seed {}",
            blanks_per_row,
            seed
        );
        Grid { cells, given }
    }
}

// Cell access and editing.
impl Grid {
    pub fn value(&self, r: usize, c: usize) -> u8 {
        self.cells[r][c]
    }

    pub fn is_given(&self, r: usize, c: usize) -> bool {
        self.given[r][c]
    }

    /// Enter a player digit. Givens are immutable.
    pub fn set(&mut self, r: usize, c: usize, digit: u8) -> Result<(), Error> {
        if r >= SIDE || c >= SIDE {
            return Err(Error::OutOfBounds);
        }
        if !(1..=SIDE as u8).contains(&digit) {
            return Err(Error::BadDigit);
        }
        if self.given[r][c] {
            return Err(Error::Given);
        }
        self.cells[r][c] = digit;
        Ok(())
    }

    pub fn clear(&mut self, r: usize, c: usize) -> Result<(), Error> {
        if r >= SIDE || c >= SIDE {
            return Err(Error::OutOfBounds);
        }
        if self.given[r][c] {
            return Err(Error::Given);
        }
        self.cells[r][c] = 0;
        Ok(())
    }

    /// Wipe every player entry, leaving the givens.
    pub fn clear_entries(&mut self) {
        for r in 0..SIDE {
            for c in 0..SIDE {
                if !self.given[r][c] {
                    self.cells[r][c] = 0;
                }
            }
        }
    }

    pub fn empty_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&v| v == 0)
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.empty_count() == 0 && self.is_valid()
    }

    /// No row, column, or box repeats a digit. Empty cells are allowed.
    pub fn is_valid(&self) -> bool {
        let distinct = |cells: &[(usize, usize)]| {
            let mut seen = [false; SIDE + 1];
            for &(r, c) in cells {
                let v = self.cells[r][c] as usize;
                if v == 0 {
                    continue;
                }
                if seen[v] {
                    return false;
                }
                seen[v] = true;
            }
            true
        };
        for i in 0..SIDE {
            let row: Vec<_> = (0..SIDE).map(|c| (i, c)).collect();
            let col: Vec<_> = (0..SIDE).map(|r| (r, i)).collect();
            let boxed: Vec<_> = (0..SIDE)
                .map(|j| ((i / BASE) * BASE + j / BASE, (i % BASE) * BASE + j % BASE))
                .collect();
            if !distinct(&row) || !distinct(&col) || !distinct(&boxed) {
                return false;
            }
        }
        true
    }
}

impl FromStr for Grid {
    type Err = Error;

    /// 81 characters, row-major; `1`-`9` are givens, `.` or `0` empty.
    fn from_str(s: &str) -> Result<Self, Error> {
        let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() != SIDE * SIDE {
            return Err(Error::Malformed);
        }
        let mut cells = [[0u8; SIDE]; SIDE];
        let mut given = [[false; SIDE]; SIDE];
        for (i, ch) in chars.into_iter().enumerate() {
            let (r, c) = (i / SIDE, i % SIDE);
            match ch {
                '.' | '0' => {}
                '1'..='9' => {
                    cells[r][c] = ch as u8 - b'0';
                    given[r][c] = true;
                }
                _ => return Err(Error::Malformed),
            }
        }
        Ok(Grid { cells, given })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for &v in row {
                if v == 0 {
                    write!(f, ".")?;
                } else {
                    write!(f, "{}", v)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
