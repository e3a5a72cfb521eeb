//! Terminal frontend. Holds no game rules: screens translate key and mouse
//! events into calls on [`crate::game::Minesweeper`] and
//! [`crate::sudoku::Grid`] and draw whatever those report back.

mod minesweeper;
mod sudoku;

use std::io::{self, Write};

use termion::event::{Event, Key};
use termion::input::{Events, MouseTerminal, TermRead};
use termion::raw::{IntoRawMode, RawTerminal};
use termion::{clear, cursor};
use thiserror::Error;

use crate::opts::{GameKind, Opts};
use crate::{board, game, trivia};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Board(#[from] board::Error),
    #[error(transparent)]
    Game(#[from] game::Error),
    #[error(transparent)]
    Sudoku(#[from] crate::sudoku::solve::SolverFailure),
    #[error(transparent)]
    Trivia(#[from] trivia::Error),
}

pub(crate) type Screen = MouseTerminal<RawTerminal<io::Stdout>>;
pub(crate) type EventStream = Events<io::Stdin>;

pub(crate) enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Arrow keys move the cursor on every screen.
pub(crate) fn direction_of(key: Key) -> Option<Direction> {
    match key {
        Key::Up => Some(Direction::Up),
        Key::Down => Some(Direction::Down),
        Key::Left => Some(Direction::Left),
        Key::Right => Some(Direction::Right),
        _ => None,
    }
}

/// One cursor step, clamped to a `w` by `h` grid.
pub(crate) fn step(cursor: (usize, usize), dir: Direction, w: usize, h: usize) -> (usize, usize) {
    let (x, y) = cursor;
    match dir {
        Direction::Up => (x, y.saturating_sub(1)),
        Direction::Down => (x, (y + 1).min(h - 1)),
        Direction::Left => (x.saturating_sub(1), y),
        Direction::Right => ((x + 1).min(w - 1), y),
    }
}

/// Gatekeeper for hints. When trivia is off the gate is always open;
/// otherwise a question must be answered first.
pub struct HintGate {
    enabled: bool,
    client: trivia::Client,
    questions: Vec<trivia::Question>,
}

pub(crate) enum Unlock {
    Open,
    /// Wrong answer; carries one accepted answer for the reveal.
    Denied(String),
}

impl HintGate {
    pub fn from_opts(opts: &Opts) -> Result<Self, Error> {
        let questions = match &opts.questions {
            Some(path) => trivia::load_questions(path)?,
            None => trivia::default_questions(),
        };
        Ok(Self {
            enabled: opts.trivia,
            client: trivia::Client::new(opts.endpoint.clone()),
            questions,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Poses a question when armed. Raw mode is suspended so the player can
    /// type a whole line, then restored.
    pub(crate) fn unlock(&self, screen: &mut Screen) -> Result<Unlock, Error> {
        if !self.enabled {
            return Ok(Unlock::Open);
        }
        let posed = self.client.pose(&self.questions, &mut rand::thread_rng())?;
        screen.suspend_raw_mode()?;
        write!(screen, "\n\r{}\n\ranswer: ", posed.prompt)?;
        screen.flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        screen.activate_raw_mode()?;
        if posed.check(&answer) {
            Ok(Unlock::Open)
        } else {
            Ok(Unlock::Denied(posed.reveal().to_owned()))
        }
    }
}

pub fn run(opts: Opts) -> Result<(), Error> {
    let mut gate = HintGate::from_opts(&opts)?;
    let mut screen = MouseTerminal::from(io::stdout().into_raw_mode()?);
    let mut events = io::stdin().events();

    if let Some(kind) = opts.game {
        play(kind, &opts, &gate, &mut screen, &mut events)?;
    } else {
        menu(&opts, &mut gate, &mut screen, &mut events)?;
    }

    write!(screen, "{}{}", clear::All, cursor::Goto(1, 1))?;
    screen.flush()?;
    Ok(())
}

fn menu(
    opts: &Opts,
    gate: &mut HintGate,
    screen: &mut Screen,
    events: &mut EventStream,
) -> Result<(), Error> {
    loop {
        write!(
            screen,
            "{}{}puzzlebox{}  1: minesweeper   2: sudoku   t: trivia hints [{}]   q: quit",
            clear::All,
            cursor::Goto(1, 1),
            cursor::Goto(1, 3),
            if gate.is_enabled() { "on" } else { "off" },
        )?;
        screen.flush()?;
        let event = match events.next() {
            Some(event) => event?,
            None => return Ok(()),
        };
        match event {
            Event::Key(Key::Char('1')) => {
                play(GameKind::Minesweeper, opts, gate, screen, events)?
            }
            Event::Key(Key::Char('2')) => play(GameKind::Sudoku, opts, gate, screen, events)?,
            Event::Key(Key::Char('t')) => gate.toggle(),
            Event::Key(Key::Char('q')) | Event::Key(Key::Esc) => return Ok(()),
            _ => {}
        }
    }
}

fn play(
    kind: GameKind,
    opts: &Opts,
    gate: &HintGate,
    screen: &mut Screen,
    events: &mut EventStream,
) -> Result<(), Error> {
    match kind {
        GameKind::Minesweeper => minesweeper::play(opts, gate, screen, events),
        GameKind::Sudoku => sudoku::play(opts, gate, screen, events),
    }
}
