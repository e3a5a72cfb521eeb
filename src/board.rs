use indexmap::IndexSet;
use rand::{seq::SliceRandom, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus as BaseRng;
use thiserror::Error;

/// A board coordinate, `(column, row)`.
pub type Loc = (usize, usize);

#[derive(Debug, Error, PartialEq, Eq, Copy, Clone)]
pub enum Error {
    #[error("location is outside the board")]
    OutOfBounds,
    #[error("dug up a mine")]
    Exploded,
    #[error("cell is flagged")]
    Flagged,
    #[error("{mines} mines do not fit on a board of {cells} cells")]
    TooManyMines { mines: usize, cells: usize },
}

/// Ground truth of a cell. The count is the number of adjacent mines,
/// `None` when zero.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Content {
    Mine,
    Clear(Option<u8>),
}

impl Default for Content {
    fn default() -> Self {
        Self::Clear(None)
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed,
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

#[derive(Debug, Default, PartialEq, Eq, Copy, Clone)]
pub struct Cell {
    pub state: CellState,
    pub content: Content,
}

impl Cell {
    pub fn glyph(&self) -> char {
        match self.state {
            CellState::Hidden => '\u{25A1}',
            CellState::Flagged => 'F',
            CellState::Revealed => match self.content {
                Content::Mine => 'M',
                Content::Clear(None) => '\u{25A0}',
                Content::Clear(Some(n)) => (b'0' + n) as char,
            },
        }
    }
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Dim {
    Square(usize),
    Rect(usize, usize),
}

impl Dim {
    pub fn w(&self) -> usize {
        match self {
            Dim::Square(n) | Dim::Rect(n, _) => *n,
        }
    }

    pub fn h(&self) -> usize {
        match self {
            Dim::Square(n) | Dim::Rect(_, n) => *n,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<Vec<Cell>>,
    dims: (usize, usize),
    num_mines: usize,
}

// Helpers.
impl Board {
    pub fn is_loc(&self, (x, y): Loc) -> bool {
        x < self.dims.0 && y < self.dims.1
    }

    /// All in-bounds cells adjacent to `loc`, excluding `loc` itself.
    pub fn neighbors(&self, (x, y): Loc) -> impl Iterator<Item = Loc> {
        let (w, h) = self.dims;
        (-1..=1).flat_map(move |dy: isize| {
            (-1..=1).filter_map(move |dx: isize| {
                if dx == 0 && dy == 0 {
                    return None;
                }
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx >= 0 && ny >= 0 && (nx as usize) < w && (ny as usize) < h {
                    Some((nx as usize, ny as usize))
                } else {
                    None
                }
            })
        })
    }

    pub fn locs(&self) -> impl Iterator<Item = Loc> {
        let (w, h) = self.dims;
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    pub fn cell(&self, (x, y): Loc) -> &Cell {
        &self.cells[y][x]
    }

    pub fn w(&self) -> usize {
        self.dims.0
    }

    pub fn h(&self) -> usize {
        self.dims.1
    }

    pub fn num_mines(&self) -> usize {
        self.num_mines
    }
}

// Constructors.
impl Board {
    pub fn easy() -> Result<Self, Error> {
        Self::new(Dim::Square(8), 10)
    }

    pub fn medium() -> Result<Self, Error> {
        Self::new(Dim::Square(10), 30)
    }

    pub fn hard() -> Result<Self, Error> {
        Self::new(Dim::Square(12), 50)
    }

    pub fn new(dim: Dim, num_mines: usize) -> Result<Self, Error> {
        Self::new_seeded(dim, num_mines, rand::rngs::OsRng.next_u64())
    }

    /// Seeded generation, for reproducible games and for tests.
    pub fn new_seeded(dim: Dim, num_mines: usize, seed: u64) -> Result<Self, Error> {
        let cells = dim.w() * dim.h();
        if num_mines >= cells {
            return Err(Error::TooManyMines { mines: num_mines, cells });
        }
        let mut rng = BaseRng::seed_from_u64(seed);
        let mut locs: Vec<Loc> = (0..dim.h())
            .flat_map(|y| (0..dim.w()).map(move |x| (x, y)))
            .collect();
        locs.shuffle(&mut rng);
        locs.truncate(num_mines);
        log::debug!(
            "generated {}x{} board, {} mines, seed {}",
            dim.w(),
            dim.h(),
            num_mines,
            seed
        );
        Self::with_mines(dim, locs)
    }

    /// Build a board with an explicit mine placement.
    pub fn with_mines<I>(dim: Dim, mines: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = Loc>,
    {
        let (w, h) = (dim.w(), dim.h());
        let mut cells = vec![vec![Cell::default(); w]; h];
        let mut placed = IndexSet::new();
        for loc in mines {
            let (x, y) = loc;
            if x >= w || y >= h {
                return Err(Error::OutOfBounds);
            }
            cells[y][x].content = Content::Mine;
            placed.insert(loc);
        }

        let mut board = Self {
            cells,
            dims: (w, h),
            num_mines: placed.len(),
        };

        for (x, y) in board.locs().collect::<Vec<_>>() {
            if board.cells[y][x].content == Content::Mine {
                continue;
            }
            let nearby = board
                .neighbors((x, y))
                .filter(|&(nx, ny)| board.cells[ny][nx].content == Content::Mine)
                .count() as u8;
            if nearby > 0 {
                board.cells[y][x].content = Content::Clear(Some(nearby));
            }
        }

        Ok(board)
    }
}

// Flagging and digging.
impl Board {
    /// Toggle a flag. Revealed cells stay revealed.
    pub fn flag(&mut self, loc: Loc) -> Result<(), Error> {
        if !self.is_loc(loc) {
            return Err(Error::OutOfBounds);
        }
        let cell = &mut self.cells[loc.1][loc.0];
        cell.state = match cell.state {
            CellState::Hidden => CellState::Flagged,
            CellState::Flagged => CellState::Hidden,
            CellState::Revealed => CellState::Revealed,
        };
        Ok(())
    }

    pub fn dig(&mut self, loc: Loc) -> Result<(), Error> {
        if !self.is_loc(loc) {
            return Err(Error::OutOfBounds);
        }
        let cell = &mut self.cells[loc.1][loc.0];
        if cell.state == CellState::Flagged {
            return Err(Error::Flagged);
        }
        match cell.content {
            Content::Mine => {
                cell.state = CellState::Revealed;
                Err(Error::Exploded)
            }
            Content::Clear(None) => {
                self.flood_reveal(loc);
                Ok(())
            }
            Content::Clear(Some(n)) => {
                if cell.state == CellState::Hidden {
                    cell.state = CellState::Revealed;
                    Ok(())
                } else {
                    self.chord(loc, n)
                }
            }
        }
    }

    /// Digging a revealed number whose flag count matches opens the rest of
    /// its neighborhood.
    fn chord(&mut self, loc: Loc, number: u8) -> Result<(), Error> {
        let around: Vec<Loc> = self.neighbors(loc).collect();
        let flagged = around
            .iter()
            .filter(|&&(x, y)| self.cells[y][x].state == CellState::Flagged)
            .count() as u8;
        if flagged != number {
            return Ok(());
        }
        let mut exploded = false;
        for (x, y) in around {
            let cell = &mut self.cells[y][x];
            if cell.state != CellState::Hidden {
                continue;
            }
            match cell.content {
                Content::Mine => {
                    cell.state = CellState::Revealed;
                    exploded = true;
                }
                Content::Clear(None) => self.flood_reveal((x, y)),
                Content::Clear(Some(_)) => cell.state = CellState::Revealed,
            }
        }
        if exploded {
            Err(Error::Exploded)
        } else {
            Ok(())
        }
    }

    /// Reveal a zero cell and everything reachable through zeros. Flagged
    /// cells are left alone; mines are never adjacent to a zero.
    fn flood_reveal(&mut self, start: Loc) {
        let mut queue = vec![start];
        let mut seen: IndexSet<Loc> = IndexSet::new();
        seen.insert(start);
        while let Some(loc) = queue.pop() {
            let cell = &mut self.cells[loc.1][loc.0];
            if cell.state == CellState::Flagged {
                continue;
            }
            cell.state = CellState::Revealed;
            if cell.content != Content::Clear(None) {
                continue;
            }
            for next in self.neighbors(loc).collect::<Vec<_>>() {
                if seen.insert(next) {
                    queue.push(next);
                }
            }
        }
    }
}

// Probing and stat checking.
impl Board {
    /// Win condition: every clear cell has been revealed.
    pub fn is_cleared(&self) -> bool {
        self.locs().all(|(x, y)| {
            let cell = self.cells[y][x];
            cell.content == Content::Mine || cell.state == CellState::Revealed
        })
    }

    pub fn hidden_count(&self) -> usize {
        self.locs()
            .filter(|&(x, y)| self.cells[y][x].state != CellState::Revealed)
            .count()
    }

    /// Expose the whole board. Used when a dig ends the game.
    pub fn reveal_all(&mut self) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                cell.state = CellState::Revealed;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn counts_follow_mine_placement() {
        // x . .
        // . . .
        // . . x
        let board = Board::with_mines(Dim::Square(3), vec![(0, 0), (2, 2)]).unwrap();
        assert_eq!(board.cell((1, 1)).content, Content::Clear(Some(2)));
        assert_eq!(board.cell((1, 0)).content, Content::Clear(Some(1)));
        assert_eq!(board.cell((2, 0)).content, Content::Clear(None));
        assert_eq!(board.cell((0, 2)).content, Content::Clear(None));
        assert_eq!(board.cell((1, 2)).content, Content::Clear(Some(1)));
    }

    #[rstest]
    #[case((0, 0), 3)]
    #[case((1, 0), 5)]
    #[case((1, 1), 8)]
    fn neighbor_counts(#[case] loc: Loc, #[case] expected: usize) {
        let board = Board::with_mines(Dim::Square(3), vec![]).unwrap();
        assert_eq!(board.neighbors(loc).count(), expected);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = Board::new_seeded(Dim::Rect(10, 8), 12, 7).unwrap();
        let b = Board::new_seeded(Dim::Rect(10, 8), 12, 7).unwrap();
        let mines = |board: &Board| {
            board
                .locs()
                .filter(|&loc| board.cell(loc).content == Content::Mine)
                .collect::<Vec<_>>()
        };
        assert_eq!(mines(&a), mines(&b));
        assert_eq!(a.num_mines(), 12);
    }

    #[test]
    fn too_many_mines_is_an_error() {
        assert_eq!(
            Board::new_seeded(Dim::Square(3), 9, 0),
            Err(Error::TooManyMines { mines: 9, cells: 9 })
        );
    }

    #[test]
    fn digging_a_mine_explodes() {
        let mut board = Board::with_mines(Dim::Square(3), vec![(0, 0)]).unwrap();
        assert_eq!(board.dig((0, 0)), Err(Error::Exploded));
        assert_eq!(board.cell((0, 0)).state, CellState::Revealed);
    }

    #[test]
    fn digging_a_flag_is_rejected() {
        let mut board = Board::with_mines(Dim::Square(3), vec![(0, 0)]).unwrap();
        board.flag((1, 1)).unwrap();
        assert_eq!(board.dig((1, 1)), Err(Error::Flagged));
    }

    #[test]
    fn flag_toggles() {
        let mut board = Board::with_mines(Dim::Square(3), vec![(0, 0)]).unwrap();
        board.flag((2, 2)).unwrap();
        assert_eq!(board.cell((2, 2)).state, CellState::Flagged);
        board.flag((2, 2)).unwrap();
        assert_eq!(board.cell((2, 2)).state, CellState::Hidden);
    }

    #[test]
    fn zero_region_floods_but_respects_flags() {
        // Mine in one corner; digging the far corner opens everything except
        // the mine and the flagged cell.
        let mut board = Board::with_mines(Dim::Square(4), vec![(0, 0)]).unwrap();
        board.flag((3, 0)).unwrap();
        board.dig((3, 3)).unwrap();
        assert_eq!(board.cell((0, 0)).state, CellState::Hidden);
        assert_eq!(board.cell((3, 0)).state, CellState::Flagged);
        assert_eq!(board.cell((1, 1)).state, CellState::Revealed);
        assert!(!board.is_cleared());
        board.flag((3, 0)).unwrap();
        board.dig((3, 0)).unwrap();
        assert!(board.is_cleared());
    }

    #[test]
    fn chord_opens_neighbors_when_flags_match() {
        // x . .
        // . . .
        // . . .
        let mut board = Board::with_mines(Dim::Square(3), vec![(0, 0)]).unwrap();
        board.dig((1, 1)).unwrap();
        board.flag((0, 0)).unwrap();
        // (1, 1) is a 1 with its single mine flagged: chording opens the rest.
        board.dig((1, 1)).unwrap();
        assert!(board.is_cleared());
    }

    #[test]
    fn chord_on_a_wrong_flag_explodes() {
        let mut board = Board::with_mines(Dim::Square(3), vec![(0, 0)]).unwrap();
        board.dig((1, 1)).unwrap();
        board.flag((2, 2)).unwrap();
        assert_eq!(board.dig((1, 1)), Err(Error::Exploded));
    }
}
