//! SAT-backed sudoku solving: 729 `cell(r, c, d)` variables, exactly-one
//! constraints per cell, per row, per column, and per box, with every
//! filled cell as a unit clause.

use thiserror::Error;
use varisat::{ExtendFormula, Lit, Solver as Sat, Var};

use super::{Grid, BASE, SIDE};
use crate::cnf;

#[derive(Debug, Error)]
#[error("solver backend failed: {0}")]
pub struct SolverFailure(String);

struct Encoding<'sat> {
    sat: Sat<'sat>,
    vars: Vec<Var>,
}

impl Encoding<'_> {
    fn lit(&self, r: usize, c: usize, d: u8) -> Lit {
        let idx = (r * SIDE + c) * SIDE + (d as usize - 1);
        Lit::from_var(self.vars[idx], true)
    }

    fn build(grid: &Grid) -> Self {
        let mut sat = Sat::new();
        let vars: Vec<Var> = (0..SIDE * SIDE * SIDE).map(|_| sat.new_var()).collect();
        let mut enc = Encoding { sat, vars };

        for r in 0..SIDE {
            for c in 0..SIDE {
                let cell: Vec<Lit> = (1..=SIDE as u8).map(|d| enc.lit(r, c, d)).collect();
                cnf::exactly_k(&mut enc.sat, &cell, 1);
            }
        }
        for d in 1..=SIDE as u8 {
            for i in 0..SIDE {
                let row: Vec<Lit> = (0..SIDE).map(|c| enc.lit(i, c, d)).collect();
                cnf::exactly_k(&mut enc.sat, &row, 1);
                let col: Vec<Lit> = (0..SIDE).map(|r| enc.lit(r, i, d)).collect();
                cnf::exactly_k(&mut enc.sat, &col, 1);
                let boxed: Vec<Lit> = (0..SIDE)
                    .map(|j| {
                        enc.lit(
                            (i / BASE) * BASE + j / BASE,
                            (i % BASE) * BASE + j % BASE,
                            d,
                        )
                    })
                    .collect();
                cnf::exactly_k(&mut enc.sat, &boxed, 1);
            }
        }
        for r in 0..SIDE {
            for c in 0..SIDE {
                let v = grid.value(r, c);
                if v != 0 {
                    let lit = enc.lit(r, c, v);
                    enc.sat.add_clause(&[lit]);
                }
            }
        }
        enc
    }
}

/// Solve the grid as given. `None` when the entries rule out every model.
pub fn solution(grid: &Grid) -> Result<Option<[[u8; SIDE]; SIDE]>, SolverFailure> {
    let mut enc = Encoding::build(grid);
    let solvable = enc
        .sat
        .solve()
        .map_err(|e| SolverFailure(e.to_string()))?;
    if !solvable {
        log::debug!("sudoku facts are unsatisfiable");
        return Ok(None);
    }
    let model = enc
        .sat
        .model()
        .ok_or_else(|| SolverFailure("no model reported".into()))?;

    let mut cells = [[0u8; SIDE]; SIDE];
    for r in 0..SIDE {
        for c in 0..SIDE {
            for d in 1..=SIDE as u8 {
                if model.contains(&enc.lit(r, c, d)) {
                    cells[r][c] = d;
                    break;
                }
            }
        }
    }
    Ok(Some(cells))
}

impl Grid {
    /// Fill every empty cell from the model. Returns false when the puzzle
    /// is unsolvable as entered.
    pub fn solve(&mut self) -> Result<bool, SolverFailure> {
        let solved = match solution(self)? {
            Some(cells) => cells,
            None => return Ok(false),
        };
        for r in 0..SIDE {
            for c in 0..SIDE {
                if self.value(r, c) == 0 {
                    // The model respects the exactly-one constraints, so
                    // this cannot collide with a given.
                    self.set(r, c, solved[r][c]).map_err(|e| {
                        SolverFailure(format!("model cell rejected: {}", e))
                    })?;
                }
            }
        }
        Ok(true)
    }

    /// The first empty cell in row-major order with its model digit.
    pub fn hint(&self) -> Result<Option<(usize, usize, u8)>, SolverFailure> {
        let solved = match solution(self)? {
            Some(cells) => cells,
            None => return Ok(None),
        };
        for r in 0..SIDE {
            for c in 0..SIDE {
                if self.value(r, c) == 0 {
                    return Ok(Some((r, c, solved[r][c])));
                }
            }
        }
        Ok(None)
    }

    /// Whether the entries made so far still leave a solution.
    pub fn is_solvable(&self) -> Result<bool, SolverFailure> {
        Ok(solution(self)?.is_some())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CLASSIC: &str =
        "53..7....6..195....98....6.8...6...34..8.3..17...2...6.6....28....419..5....8..79";
    const CLASSIC_SOLVED: &str =
        "534678912672195348198342567859761423426853791713924856961537284287419635345286179";

    #[test]
    fn solves_the_classic_puzzle() {
        let mut grid: Grid = CLASSIC.parse().unwrap();
        assert!(grid.solve().unwrap());
        let expected: Grid = CLASSIC_SOLVED.parse().unwrap();
        for r in 0..SIDE {
            for c in 0..SIDE {
                assert_eq!(grid.value(r, c), expected.value(r, c));
            }
        }
        assert!(grid.is_complete());
    }

    #[test]
    fn generated_puzzles_are_solvable() {
        for seed in 0..3 {
            let grid = Grid::generate_seeded(6, seed);
            assert!(grid.is_solvable().unwrap());
        }
    }

    #[test]
    fn hint_matches_the_model_and_stays_solvable() {
        let mut grid = Grid::generate_seeded(5, 17);
        let (r, c, d) = grid.hint().unwrap().expect("puzzle has empty cells");
        assert_eq!(grid.value(r, c), 0);
        grid.set(r, c, d).unwrap();
        assert!(grid.is_solvable().unwrap());
    }

    #[test]
    fn hint_on_a_full_grid_is_none() {
        let grid = Grid::generate_seeded(0, 3);
        assert_eq!(grid.hint().unwrap(), None);
    }

    #[test]
    fn contradictory_entry_is_unsolvable() {
        let mut grid = Grid::generate_seeded(5, 23);
        // Copy a digit already present in the row into an empty cell.
        let mut target = None;
        'rows: for r in 0..SIDE {
            for c in 0..SIDE {
                if grid.value(r, c) != 0 {
                    continue;
                }
                if let Some(v) = (0..SIDE).map(|cc| grid.value(r, cc)).find(|&v| v != 0) {
                    target = Some((r, c, v));
                    break 'rows;
                }
            }
        }
        let (r, c, v) = target.expect("a row with both a digit and a blank");
        grid.set(r, c, v).unwrap();
        assert!(!grid.is_solvable().unwrap());
        assert!(!grid.solve().unwrap());
    }
}
