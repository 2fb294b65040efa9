//! Plain-text board rendering for the terminal.

use std::fmt::Write;

use daily_puzzle_core::{CellStatus, GameState, PuzzleKind};

fn cell_char(game: &GameState, row: usize, col: usize) -> char {
    let value = game.board[row][col];
    match game.puzzle.kind {
        PuzzleKind::Binary | PuzzleKind::Sudoku => match value {
            Some(v) => char::from_digit(u32::from(v), 10).unwrap_or('?'),
            None => '.',
        },
        PuzzleKind::LightsOut => '.',
        PuzzleKind::Pairs => match value {
            Some(v) => char::from(b'A' + v % 26),
            None => '#',
        },
    }
}

fn marker(status: CellStatus) -> char {
    match status {
        CellStatus::Conflict => '!',
        CellStatus::Hinted => '+',
        CellStatus::Open => '*',
        _ => ' ',
    }
}

/// Grid with row/column indexes. Lights-out shows lit cells as `o`;
/// `!` marks a conflict, `+` a hinted cell and `*` an open card.
pub fn board(game: &GameState) -> String {
    let lights = game.lights();
    let cols = game.puzzle.cols();
    let mut out = String::from("   ");
    for c in 0..cols {
        let _ = write!(out, "{:<2}", c);
    }
    out.push('\n');

    for (r, statuses) in game.cell_status.iter().enumerate() {
        let _ = write!(out, "{:<3}", r);
        for (c, status) in statuses.iter().enumerate() {
            let ch = match &lights {
                Some(lights) if lights[r][c] == 1 => 'o',
                _ => cell_char(game, r, c),
            };
            out.push(ch);
            out.push(marker(*status));
        }
        out.push('\n');
    }
    out
}

pub fn header(game: &GameState) -> String {
    format!(
        "{} {} ({}) | {:?} | moves {} | hints {} | {}s",
        game.puzzle.date.map(|d| d.to_string()).unwrap_or_default(),
        game.puzzle.kind,
        game.puzzle.difficulty,
        game.status,
        game.moves,
        game.hints_used,
        game.elapsed_ms / 1000,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use daily_puzzle_core::{Difficulty, PuzzleGenerator};

    fn game(kind: PuzzleKind) -> GameState {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        GameState::load(PuzzleGenerator::default().daily(date, kind, Difficulty::Easy))
    }

    #[test]
    fn test_board_has_one_line_per_row() {
        for kind in PuzzleKind::ALL {
            let game = game(kind);
            let text = board(&game);
            assert_eq!(text.lines().count(), game.puzzle.rows() + 1, "{}", kind);
        }
    }

    #[test]
    fn test_sudoku_givens_are_shown() {
        let game = game(PuzzleKind::Sudoku);
        let text = board(&game);
        let (r, c) = (0..4)
            .flat_map(|r| (0..4).map(move |c| (r, c)))
            .find(|&(r, c)| game.puzzle.is_given(r, c))
            .unwrap();
        let line = text.lines().nth(r + 1).unwrap();
        let digit = char::from_digit(u32::from(game.puzzle.solution[r][c]), 10).unwrap();
        assert_eq!(line.chars().nth(3 + 2 * c), Some(digit));
    }

    #[test]
    fn test_pairs_start_face_down() {
        let text = board(&game(PuzzleKind::Pairs));
        assert!(text.lines().skip(1).all(|l| !l.contains(|ch: char| ch.is_ascii_uppercase())));
    }
}
