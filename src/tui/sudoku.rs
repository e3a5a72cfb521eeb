use std::io::Write;

use termion::event::{Event, Key, MouseButton, MouseEvent};
use termion::{clear, cursor, style};

use crate::opts::Opts;
use crate::sudoku::{self, Grid, SIDE};

use super::{direction_of, step, Error, EventStream, HintGate, Screen, Unlock};

const GRID_LEFT: u16 = 2;
const GRID_TOP: u16 = 4;
const HELP: &str = "1-9 set, 0 clear, h hint, s solve, c reset, v check, n new, q back";

pub(super) fn play(
    opts: &Opts,
    gate: &HintGate,
    screen: &mut Screen,
    events: &mut EventStream,
) -> Result<(), Error> {
    let mut grid = opts.grid();
    let mut at = (0usize, 0usize);
    let mut message = String::from(HELP);

    loop {
        draw(screen, &grid, at, &message)?;
        let event = match events.next() {
            Some(event) => event?,
            None => return Ok(()),
        };
        message.clear();
        match event {
            Event::Key(key) => {
                if let Some(dir) = direction_of(key) {
                    at = step(at, dir, SIDE, SIDE);
                    continue;
                }
                match key {
                    Key::Char('q') | Key::Esc => return Ok(()),
                    Key::Char(d @ '1'..='9') => {
                        let digit = d as u8 - b'0';
                        enter(&mut grid, at, digit, &mut message);
                    }
                    Key::Char('0') | Key::Backspace | Key::Delete => {
                        if grid.clear(at.1, at.0) == Err(sudoku::Error::Given) {
                            message.push_str("that cell is a given");
                        }
                    }
                    Key::Char('h') => hint(&mut grid, gate, screen, &mut at, &mut message)?,
                    Key::Char('s') => {
                        if grid.solve()? {
                            message.push_str("completed from a solver model");
                        } else {
                            message.push_str("no solution from here, c resets your entries");
                        }
                    }
                    Key::Char('c') => {
                        grid.clear_entries();
                        message.push_str("entries cleared");
                    }
                    Key::Char('v') => check(&grid, &mut message),
                    Key::Char('n') => {
                        grid = opts.grid();
                        at = (0, 0);
                        message.push_str(HELP);
                    }
                    _ => {}
                }
            }
            Event::Mouse(MouseEvent::Press(MouseButton::Left, x, y)) => {
                if let Some(cell) = grid_cell(x, y) {
                    at = cell;
                }
            }
            _ => {}
        }
    }
}

fn enter(grid: &mut Grid, at: (usize, usize), digit: u8, message: &mut String) {
    match grid.set(at.1, at.0, digit) {
        Ok(()) => {
            if grid.empty_count() == 0 {
                message.push_str(if grid.is_valid() {
                    "solved, congratulations"
                } else {
                    "full, but something conflicts"
                });
            }
        }
        Err(sudoku::Error::Given) => message.push_str("that cell is a given"),
        Err(_) => {}
    }
}

/// A granted hint fills the suggested cell in.
fn hint(
    grid: &mut Grid,
    gate: &HintGate,
    screen: &mut Screen,
    at: &mut (usize, usize),
    message: &mut String,
) -> Result<(), Error> {
    match gate.unlock(screen) {
        Ok(Unlock::Open) => match grid.hint()? {
            Some((r, c, digit)) => {
                *at = (c, r);
                enter(grid, (c, r), digit, message);
                if message.is_empty() {
                    message.push_str(&format!("{} goes in row {}, column {}", digit, r + 1, c + 1));
                }
            }
            None => message.push_str(if grid.is_complete() {
                "the grid is already full"
            } else {
                "no hint, your entries contradict the givens"
            }),
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

fn check(grid: &Grid, message: &mut String) {
    message.push_str(if grid.is_complete() {
        "solved, congratulations"
    } else if grid.is_valid() {
        "no conflicts so far"
    } else {
        "there is a conflict"
    });
}

/// Screen position of cell `(r, c)`. Box bands get an extra column and row.
fn cell_pos(r: usize, c: usize) -> (u16, u16) {
    let x = GRID_LEFT + 2 * c as u16 + 2 * (c as u16 / 3);
    let y = GRID_TOP + r as u16 + r as u16 / 3;
    (x, y)
}

fn grid_cell(x: u16, y: u16) -> Option<(usize, usize)> {
    for r in 0..SIDE {
        for c in 0..SIDE {
            if cell_pos(r, c) == (x, y) {
                return Some((c, r));
            }
        }
    }
    None
}

fn draw(screen: &mut Screen, grid: &Grid, at: (usize, usize), message: &str) -> Result<(), Error> {
    write!(screen, "{}{}", clear::All, cursor::Goto(1, 1))?;
    write!(screen, "sudoku  |  {} empty", grid.empty_count())?;
    write!(screen, "{}{}", cursor::Goto(1, 2), message)?;
    for r in 0..SIDE {
        for c in 0..SIDE {
            let (x, y) = cell_pos(r, c);
            write!(screen, "{}", cursor::Goto(x, y))?;
            let value = grid.value(r, c);
            if value == 0 {
                write!(screen, ".")?;
            } else if grid.is_given(r, c) {
                write!(screen, "{}{}{}", style::Bold, value, style::Reset)?;
            } else {
                write!(screen, "{}", value)?;
            }
        }
    }
    let (x, y) = cell_pos(at.1, at.0);
    write!(screen, "{}", cursor::Goto(x, y))?;
    screen.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_positions_skip_the_band_separators() {
        assert_eq!(cell_pos(0, 0), (GRID_LEFT, GRID_TOP));
        assert_eq!(cell_pos(0, 2), (GRID_LEFT + 4, GRID_TOP));
        // Crossing into the second stack adds a separator column.
        assert_eq!(cell_pos(0, 3), (GRID_LEFT + 8, GRID_TOP));
        assert_eq!(cell_pos(3, 0), (GRID_LEFT, GRID_TOP + 4));
    }

    #[test]
    fn mouse_positions_map_back_to_cells() {
        assert_eq!(grid_cell(GRID_LEFT, GRID_TOP), Some((0, 0)));
        let (x, y) = cell_pos(4, 7);
        assert_eq!(grid_cell(x, y), Some((7, 4)));
        // A separator column belongs to no cell.
        assert_eq!(grid_cell(GRID_LEFT + 1, GRID_TOP), None);
    }
}
