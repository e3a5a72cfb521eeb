//! Minesweeper game orchestration: a board plus the solver-reconstructed
//! solution, driving dig/flag, hint, solve, and the consistency probe.

use thiserror::Error;

use crate::board::{self, Board, CellState, Loc};
use crate::solver::{self, Facts, Solution, Verdict};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Board(#[from] board::Error),
    #[error(transparent)]
    Solver(#[from] solver::Error),
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Outcome {
    Playing,
    Won,
    Lost,
}

/// What the visible facts prove about the current position.
#[derive(Debug)]
pub struct Probe {
    pub safe: Vec<Loc>,
    pub mined: Vec<Loc>,
    /// Flagged cells the facts prove safe.
    pub misflagged: Vec<Loc>,
}

pub struct Minesweeper {
    board: Board,
    solution: Solution,
    outcome: Outcome,
}

impl Minesweeper {
    /// The solution model is reconstructed up front and kept for the whole
    /// game, so hints and full solves never re-run the solver.
    pub fn from_board(board: Board) -> Result<Self, Error> {
        let solution = Solution::reconstruct(&board)?;
        Ok(Self {
            board,
            solution,
            outcome: Outcome::Playing,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn dig(&mut self, loc: Loc) -> Result<(), Error> {
        if self.outcome != Outcome::Playing {
            return Ok(());
        }
        match self.board.dig(loc) {
            Ok(()) => {
                if self.board.is_cleared() {
                    self.outcome = Outcome::Won;
                    log::info!("board cleared");
                }
            }
            Err(board::Error::Exploded) => {
                self.outcome = Outcome::Lost;
                log::info!("dug a mine at {:?}", loc);
            }
            Err(e) => return Err(e.into()),
        }
        // A finished game shows the whole board, mines included.
        if self.outcome != Outcome::Playing {
            self.board.reveal_all();
        }
        Ok(())
    }

    pub fn flag(&mut self, loc: Loc) -> Result<(), Error> {
        if self.outcome != Outcome::Playing {
            return Ok(());
        }
        Ok(self.board.flag(loc)?)
    }

    /// The next safe cell of the stored solution that is still unrevealed,
    /// in row-major order. `None` once every safe cell is open.
    pub fn hint(&self) -> Option<Loc> {
        self.solution
            .numbers
            .keys()
            .copied()
            .find(|&loc| self.board.cell(loc).state != CellState::Revealed)
    }

    /// Flag every solution mine and open every solution safe cell.
    pub fn solve(&mut self) -> Result<(), Error> {
        if self.outcome != Outcome::Playing {
            return Ok(());
        }
        for &loc in &self.solution.mines {
            if self.board.cell(loc).state == CellState::Hidden {
                self.board.flag(loc)?;
            }
        }
        for &loc in self.solution.numbers.keys() {
            // A player flag on a safe cell is wrong; clear it and open anyway.
            if self.board.cell(loc).state == CellState::Flagged {
                self.board.flag(loc)?;
            }
            if self.board.cell(loc).state == CellState::Hidden {
                self.board.dig(loc)?;
            }
        }
        if self.board.is_cleared() {
            self.outcome = Outcome::Won;
        }
        Ok(())
    }

    /// Analyze the visible facts and report every forced cell, plus flags
    /// that contradict the facts.
    pub fn probe(&self) -> Result<Probe, Error> {
        let deductions = solver::analyze(&Facts::from_visible(&self.board))?;
        let misflagged = deductions
            .verdicts
            .iter()
            .filter(|(&loc, &v)| {
                v == Verdict::Safe && self.board.cell(loc).state == CellState::Flagged
            })
            .map(|(&loc, _)| loc)
            .collect();
        Ok(Probe {
            safe: deductions.safe_cells().collect(),
            mined: deductions.mine_cells().collect(),
            misflagged,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Dim;

    fn small_game() -> Minesweeper {
        // x . .
        // . . .
        // . . x
        let board = Board::with_mines(Dim::Square(3), vec![(0, 0), (2, 2)]).unwrap();
        Minesweeper::from_board(board).unwrap()
    }

    #[test]
    fn hint_walks_unrevealed_safe_cells_in_order() {
        let mut game = small_game();
        assert_eq!(game.hint(), Some((1, 0)));
        game.dig((1, 0)).unwrap();
        assert_eq!(game.hint(), Some((2, 0)));
    }

    #[test]
    fn solve_finishes_the_game() {
        let mut game = small_game();
        game.solve().unwrap();
        assert_eq!(game.outcome(), Outcome::Won);
        assert_eq!(game.board().cell((0, 0)).state, CellState::Flagged);
        assert_eq!(game.board().cell((2, 2)).state, CellState::Flagged);
        assert!(game.board().is_cleared());
        assert_eq!(game.hint(), None);
    }

    #[test]
    fn digging_a_mine_loses_and_reveals_the_board() {
        let mut game = small_game();
        game.dig((0, 0)).unwrap();
        assert_eq!(game.outcome(), Outcome::Lost);
        assert_eq!(game.board().hidden_count(), 0);
        // Further moves are ignored.
        game.flag((1, 1)).unwrap();
        assert_eq!(game.board().cell((1, 1)).state, CellState::Revealed);
        game.dig((1, 1)).unwrap();
        assert_eq!(game.outcome(), Outcome::Lost);
    }

    #[test]
    fn clearing_every_safe_cell_wins() {
        let mut game = small_game();
        for loc in game.solution.numbers.clone().keys() {
            game.dig(*loc).unwrap();
        }
        assert_eq!(game.outcome(), Outcome::Won);
        assert_eq!(game.board().hidden_count(), 0);
    }

    #[test]
    fn probe_treats_flags_as_guesses_not_facts() {
        // 2x2, one mine at (1, 1). The revealed corner 1 leaves every
        // neighbor open; flagging all three of them adds no facts, so the
        // position stays satisfiable and nothing is reported.
        let board = Board::with_mines(Dim::Square(2), vec![(1, 1)]).unwrap();
        let mut game = Minesweeper::from_board(board).unwrap();
        game.dig((0, 0)).unwrap();
        for loc in [(1, 0), (0, 1), (1, 1)] {
            game.flag(loc).unwrap();
        }
        let probe = game.probe().unwrap();
        assert!(probe.safe.is_empty());
        assert!(probe.mined.is_empty());
        assert!(probe.misflagged.is_empty());
    }

    #[test]
    fn probe_flags_a_provably_safe_flag() {
        // Single mine at (1, 0); revealing the bottom row pins it exactly.
        let board = Board::with_mines(Dim::Square(3), vec![(1, 0)]).unwrap();
        let mut game = Minesweeper::from_board(board).unwrap();
        game.dig((0, 2)).unwrap();
        game.flag((0, 0)).unwrap();
        let probe = game.probe().unwrap();
        assert!(probe.mined.contains(&(1, 0)));
        assert!(probe.safe.contains(&(0, 0)));
        assert_eq!(probe.misflagged, vec![(0, 0)]);
    }
}
