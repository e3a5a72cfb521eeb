use std::io::Write;

use termion::event::{Event, Key, MouseButton, MouseEvent};
use termion::{clear, cursor};

use crate::board::{self, Loc};
use crate::game::{self, Minesweeper, Outcome};
use crate::opts::Opts;
use crate::solver;

use super::{direction_of, step, Error, EventStream, HintGate, Screen, Unlock};

const GRID_LEFT: u16 = 2;
const GRID_TOP: u16 = 4;
const HELP: &str = "m flag, u dig, h hint, s solve, p probe, n new, q back";

pub(super) fn play(
    opts: &Opts,
    gate: &HintGate,
    screen: &mut Screen,
    events: &mut EventStream,
) -> Result<(), Error> {
    let mut game = Minesweeper::from_board(opts.board()?)?;
    let mut at: Loc = (0, 0);
    let mut message = String::from(HELP);

    loop {
        draw(screen, &game, at, &message)?;
        let event = match events.next() {
            Some(event) => event?,
            None => return Ok(()),
        };
        message.clear();
        match event {
            Event::Key(key) => {
                if let Some(dir) = direction_of(key) {
                    at = step(at, dir, game.board().w(), game.board().h());
                    continue;
                }
                match key {
                    Key::Char('q') | Key::Esc => return Ok(()),
                    Key::Char('m') => game.flag(at)?,
                    Key::Char('u') | Key::Char(' ') => dig(&mut game, at, &mut message)?,
                    Key::Char('h') => hint(&game, gate, screen, &mut at, &mut message)?,
                    Key::Char('s') => {
                        game.solve()?;
                        message.push_str("solved from the stored model");
                    }
                    Key::Char('p') | Key::Char('!') => probe(&game, &mut message)?,
                    Key::Char('n') => {
                        game = Minesweeper::from_board(opts.board()?)?;
                        at = (0, 0);
                        message.push_str(HELP);
                    }
                    _ => {}
                }
            }
            Event::Mouse(MouseEvent::Press(button, x, y)) => {
                if let Some(loc) = grid_loc(&game, x, y) {
                    at = loc;
                    match button {
                        MouseButton::Left => dig(&mut game, loc, &mut message)?,
                        MouseButton::Right => game.flag(loc)?,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
}

fn dig(game: &mut Minesweeper, loc: Loc, message: &mut String) -> Result<(), Error> {
    match game.dig(loc) {
        Ok(()) => Ok(()),
        Err(game::Error::Board(board::Error::Flagged)) => {
            message.push_str("that cell is flagged");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn hint(
    game: &Minesweeper,
    gate: &HintGate,
    screen: &mut Screen,
    at: &mut Loc,
    message: &mut String,
) -> Result<(), Error> {
    if game.outcome() != Outcome::Playing {
        return Ok(());
    }
    match gate.unlock(screen) {
        Ok(Unlock::Open) => match game.hint() {
            Some(loc) => {
                *at = loc;
                message.push_str(&format!("safe: column {}, row {}", loc.0 + 1, loc.1 + 1));
            }
            None => message.push_str("every safe cell is already open"),
        },
        Ok(Unlock::Denied(answer)) => {
            message.push_str(&format!("wrong, the answer was {}", answer));
        }
        Err(Error::Trivia(e)) => {
            log::warn!("trivia lookup failed: {}", e);
            message.push_str("trivia is unavailable, try again");
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn probe(game: &Minesweeper, message: &mut String) -> Result<(), Error> {
    match game.probe() {
        Ok(probe) => message.push_str(&format!(
            "probe: {} provably safe, {} provably mined, {} misflagged",
            probe.safe.len(),
            probe.mined.len(),
            probe.misflagged.len()
        )),
        Err(game::Error::Solver(solver::Error::Unsatisfiable)) => {
            message.push_str("the visible numbers are contradictory");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// 1-based terminal coordinates back to a board location.
fn grid_loc(game: &Minesweeper, x: u16, y: u16) -> Option<Loc> {
    let col = (x.checked_sub(GRID_LEFT)? / 2) as usize;
    let row = y.checked_sub(GRID_TOP)? as usize;
    let loc = (col, row);
    if game.board().is_loc(loc) {
        Some(loc)
    } else {
        None
    }
}

fn draw(screen: &mut Screen, game: &Minesweeper, at: Loc, message: &str) -> Result<(), Error> {
    write!(screen, "{}{}", clear::All, cursor::Goto(1, 1))?;
    let status = match game.outcome() {
        Outcome::Playing => format!("{} mines", game.board().num_mines()),
        Outcome::Won => "cleared, well done".to_owned(),
        Outcome::Lost => "boom, n for a new board".to_owned(),
    };
    write!(screen, "minesweeper  |  {}", status)?;
    write!(screen, "{}{}", cursor::Goto(1, 2), message)?;
    for y in 0..game.board().h() {
        write!(screen, "{}", cursor::Goto(GRID_LEFT, GRID_TOP + y as u16))?;
        for x in 0..game.board().w() {
            write!(screen, "{} ", game.board().cell((x, y)).glyph())?;
        }
    }
    write!(
        screen,
        "{}",
        cursor::Goto(GRID_LEFT + 2 * at.0 as u16, GRID_TOP + at.1 as u16)
    )?;
    screen.flush()?;
    Ok(())
}
