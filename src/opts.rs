use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;

use crate::board::{self, Board, Dim};
use crate::sudoku::Grid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKind {
    Minesweeper,
    Sudoku,
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minesweeper" | "mines" => Ok(Self::Minesweeper),
            "sudoku" => Ok(Self::Sudoku),
            other => Err(format!("unknown game {:?}, expected minesweeper or sudoku", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(format!("unknown difficulty {:?}, expected easy, medium or hard", other)),
        }
    }
}

#[derive(StructOpt)]
#[structopt(
    name = "puzzlebox",
    about = "Minesweeper and sudoku in the terminal, with solver-backed hints."
)]
pub struct Opts {
    /// Jump straight into a game instead of the main menu.
    #[structopt(long)]
    pub game: Option<GameKind>,
    /// Preset difficulty for freshly generated boards.
    #[structopt(long, default_value = "easy")]
    pub difficulty: Difficulty,
    /// Custom minesweeper board width. Requires --height and --mines.
    #[structopt(long)]
    pub width: Option<usize>,
    /// Custom minesweeper board height. Requires --width and --mines.
    #[structopt(long)]
    pub height: Option<usize>,
    /// Mine count for a custom minesweeper board.
    #[structopt(long)]
    pub mines: Option<usize>,
    /// Seed for reproducible board generation.
    #[structopt(long)]
    pub seed: Option<u64>,
    /// Gate hints behind a trivia question.
    #[structopt(long)]
    pub trivia: bool,
    /// JSON file of trivia question templates, replacing the built-in set.
    #[structopt(long, parse(from_os_str))]
    pub questions: Option<PathBuf>,
    /// SPARQL endpoint answering the trivia queries.
    #[structopt(long, default_value = "https://yago-knowledge.org/sparql/query")]
    pub endpoint: String,
}

impl Opts {
    /// Builds a fresh minesweeper board from the custom dimensions when all
    /// three are given, or from the difficulty preset otherwise.
    pub fn board(&self) -> Result<Board, board::Error> {
        let (dim, mines) = match (self.width, self.height, self.mines) {
            (Some(w), Some(h), Some(m)) => (Dim::Rect(w, h), m),
            _ => match self.difficulty {
                Difficulty::Easy => (Dim::Square(8), 10),
                Difficulty::Medium => (Dim::Square(10), 30),
                Difficulty::Hard => (Dim::Square(12), 50),
            },
        };
        match self.seed {
            Some(seed) => Board::new_seeded(dim, mines, seed),
            None => Board::new(dim, mines),
        }
    }

    /// Builds a fresh sudoku grid at the requested difficulty.
    pub fn grid(&self) -> Grid {
        // Blanks per row, same table as the preset constructors.
        let blanks = match self.difficulty {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 6,
        };
        match self.seed {
            Some(seed) => Grid::generate_seeded(blanks, seed),
            None => Grid::generate(blanks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_and_difficulty_parse_case_insensitively() {
        assert_eq!("Minesweeper".parse::<GameKind>().unwrap(), GameKind::Minesweeper);
        assert_eq!("SUDOKU".parse::<GameKind>().unwrap(), GameKind::Sudoku);
        assert!("chess".parse::<GameKind>().is_err());

        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert!("brutal".parse::<Difficulty>().is_err());
    }

    #[test]
    fn custom_dimensions_override_the_preset() {
        let opts = Opts::from_iter([
            "puzzlebox", "--width", "5", "--height", "4", "--mines", "3", "--seed", "7",
        ]);
        let board = opts.board().unwrap();
        assert_eq!((board.w(), board.h()), (5, 4));
        assert_eq!(board.num_mines(), 3);
    }

    #[test]
    fn presets_follow_the_difficulty_flag() {
        let opts = Opts::from_iter(["puzzlebox", "--difficulty", "hard", "--seed", "1"]);
        let board = opts.board().unwrap();
        assert_eq!((board.w(), board.h()), (12, 12));
        assert_eq!(board.num_mines(), 50);
    }

    #[test]
    fn endpoint_defaults_to_yago() {
        let opts = Opts::from_iter(["puzzlebox"]);
        assert_eq!(opts.endpoint, "https://yago-knowledge.org/sparql/query");
        assert!(!opts.trivia);
    }
}
