//! The solvability pipeline: board state becomes logical facts, the facts
//! go to the SAT engine, and the returned model is mapped back onto cells.
//!
//! Two encodings exist. [`Facts::from_visible`] captures only what the
//! player can see and powers deductions (which hidden cells are provably
//! safe or provably mined). [`Facts::from_revealed_grid`] captures the
//! numbers of every clear cell, and its model reconstructs the full mine
//! placement; the stored [`Solution`] backs the solve and hint actions.

use indexmap::{IndexMap, IndexSet};
use thiserror::Error;
use varisat::{ExtendFormula, Lit, Solver as Sat, Var};

use crate::board::{Board, CellState, Content, Loc};
use crate::cnf;

#[derive(Debug, Error)]
pub enum Error {
    #[error("facts are contradictory: no mine placement satisfies them")]
    Unsatisfiable,
    #[error("solver backend failed: {0}")]
    Backend(String),
}

/// One logical fact: exactly `mines` of `cells` hold a mine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fact {
    pub cells: Vec<Loc>,
    pub mines: usize,
}

/// A complete problem instance: the unknown cells and every fact over them.
#[derive(Debug)]
pub struct Facts {
    pub unknowns: IndexSet<Loc>,
    pub counts: Vec<Fact>,
    pub total: Fact,
}

impl Facts {
    /// Encode the player-visible state: every non-revealed cell is an
    /// unknown, every revealed number is a fact over its non-revealed
    /// neighbors, plus the global mine count. Flags contribute nothing; a
    /// flag is a guess, not knowledge.
    pub fn from_visible(board: &Board) -> Self {
        let mut unknowns = IndexSet::new();
        let mut counts = Vec::new();
        for loc in board.locs() {
            let cell = board.cell(loc);
            if cell.state != CellState::Revealed {
                unknowns.insert(loc);
                continue;
            }
            let number = match cell.content {
                Content::Clear(n) => n.unwrap_or(0) as usize,
                // A revealed mine means the game is over; no facts needed.
                Content::Mine => continue,
            };
            let hidden: Vec<Loc> = board
                .neighbors(loc)
                .filter(|&n| board.cell(n).state != CellState::Revealed)
                .collect();
            if !hidden.is_empty() {
                counts.push(Fact { cells: hidden, mines: number });
            }
        }
        let total = Fact {
            cells: unknowns.iter().copied().collect(),
            mines: board.num_mines(),
        };
        Facts { unknowns, counts, total }
    }

    /// Encode the board as if every clear cell's number were on the table:
    /// each clear cell is asserted mine-free and contributes its full
    /// neighborhood count. The solver reconstructs the mine placement from
    /// the numbers alone.
    pub fn from_revealed_grid(board: &Board) -> Self {
        let unknowns: IndexSet<Loc> = board.locs().collect();
        let mut counts = Vec::new();
        for loc in board.locs() {
            let number = match board.cell(loc).content {
                Content::Mine => continue,
                Content::Clear(n) => n.unwrap_or(0) as usize,
            };
            counts.push(Fact { cells: vec![loc], mines: 0 });
            counts.push(Fact {
                cells: board.neighbors(loc).collect(),
                mines: number,
            });
        }
        let total = Fact {
            cells: unknowns.iter().copied().collect(),
            mines: board.num_mines(),
        };
        Facts { unknowns, counts, total }
    }
}

/// What the facts force a single unknown cell to be.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Verdict {
    Mine,
    Safe,
    /// Models exist with and without a mine here.
    Open,
}

/// Outcome of analyzing the visible facts: a verdict per unknown plus one
/// concrete model.
#[derive(Debug)]
pub struct Deductions {
    pub verdicts: IndexMap<Loc, Verdict>,
    pub model: IndexMap<Loc, bool>,
}

impl Deductions {
    pub fn safe_cells(&self) -> impl Iterator<Item = Loc> + '_ {
        self.verdicts
            .iter()
            .filter(|(_, &v)| v == Verdict::Safe)
            .map(|(&loc, _)| loc)
    }

    pub fn mine_cells(&self) -> impl Iterator<Item = Loc> + '_ {
        self.verdicts
            .iter()
            .filter(|(_, &v)| v == Verdict::Mine)
            .map(|(&loc, _)| loc)
    }
}

fn backend(err: impl std::fmt::Display) -> Error {
    Error::Backend(err.to_string())
}

/// Hand the facts to the SAT engine: one variable per unknown, one
/// cardinality constraint per fact.
fn encode<'sat>(facts: &Facts) -> (Sat<'sat>, IndexMap<Loc, Var>) {
    let mut sat = Sat::new();
    let mut vars: IndexMap<Loc, Var> = IndexMap::new();
    for &loc in &facts.unknowns {
        vars.insert(loc, sat.new_var());
    }
    for fact in facts.counts.iter().chain(std::iter::once(&facts.total)) {
        let lits: Vec<Lit> = fact
            .cells
            .iter()
            .filter_map(|loc| vars.get(loc).copied())
            .map(|v| Lit::from_var(v, true))
            .collect();
        cnf::exactly_k(&mut sat, &lits, fact.mines);
    }
    (sat, vars)
}

/// Run the solver over the facts. Returns a sample model and, for every
/// unknown, the verdict obtained by assuming each polarity in turn.
pub fn analyze(facts: &Facts) -> Result<Deductions, Error> {
    let (mut sat, vars) = encode(facts);

    if !sat.solve().map_err(backend)? {
        return Err(Error::Unsatisfiable);
    }
    let sample = sat.model().ok_or_else(|| backend("no model reported"))?;
    let mut model = IndexMap::new();
    for (&loc, &var) in &vars {
        model.insert(loc, sample.contains(&Lit::from_var(var, true)));
    }

    let mut verdicts = IndexMap::new();
    for (&loc, &var) in &vars {
        let lit = Lit::from_var(var, true);
        sat.assume(&[lit]);
        let can_be_mine = sat.solve().map_err(backend)?;
        sat.assume(&[!lit]);
        let can_be_safe = sat.solve().map_err(backend)?;
        let verdict = match (can_be_mine, can_be_safe) {
            (true, true) => Verdict::Open,
            (true, false) => Verdict::Mine,
            (false, true) => Verdict::Safe,
            (false, false) => return Err(Error::Unsatisfiable),
        };
        verdicts.insert(loc, verdict);
    }

    log::debug!(
        "analyzed {} unknowns under {} facts: {} safe, {} mined",
        facts.unknowns.len(),
        facts.counts.len() + 1,
        verdicts.values().filter(|&&v| v == Verdict::Safe).count(),
        verdicts.values().filter(|&&v| v == Verdict::Mine).count(),
    );

    Ok(Deductions { verdicts, model })
}

/// A full-board model mapped back onto cells: the mine set plus the number
/// of every clear cell.
#[derive(Debug, Clone)]
pub struct Solution {
    pub mines: IndexSet<Loc>,
    pub numbers: IndexMap<Loc, u8>,
}

impl Solution {
    /// Solve the full-knowledge instance and destructure its first model
    /// into mine placements and neighbor counts.
    pub fn reconstruct(board: &Board) -> Result<Self, Error> {
        let facts = Facts::from_revealed_grid(board);
        let (mut sat, vars) = encode(&facts);
        if !sat.solve().map_err(backend)? {
            return Err(Error::Unsatisfiable);
        }
        let model = sat.model().ok_or_else(|| backend("no model reported"))?;

        let mines: IndexSet<Loc> = vars
            .iter()
            .filter(|(_, &var)| model.contains(&Lit::from_var(var, true)))
            .map(|(&loc, _)| loc)
            .collect();

        // Row-major order, so hints are deterministic.
        let mut numbers = IndexMap::new();
        for loc in board.locs() {
            if mines.contains(&loc) {
                continue;
            }
            let n = board.neighbors(loc).filter(|n| mines.contains(n)).count() as u8;
            numbers.insert(loc, n);
        }
        log::debug!("reconstructed {} mines from the number grid", mines.len());
        Ok(Solution { mines, numbers })
    }
}
