//! Two solver-backed puzzle games for the terminal.
//!
//! Minesweeper boards and sudoku grids are generated, then handed to a SAT
//! solver: games carry a reconstructed solution model that powers hints,
//! full solves, and consistency probes. Hints can optionally be gated
//! behind a trivia question answered from a SPARQL knowledge base.

pub mod board;
pub mod cnf;
pub mod game;
pub mod opts;
pub mod solver;
pub mod sudoku;
pub mod trivia;
pub mod tui;

pub use board::Board;
pub use game::Minesweeper;
pub use opts::Opts;
pub use sudoku::Grid;
