//! Pairs: a shuffled layout where every card id appears exactly twice.

use super::{Board, Difficulty, Puzzle, Solution, Verdict};
use crate::rng::SeededRandom;

fn dimensions(difficulty: Difficulty) -> (usize, usize) {
    match difficulty {
        Difficulty::Easy => (3, 4),
        Difficulty::Medium => (4, 4),
        Difficulty::Hard => (4, 6),
    }
}

pub fn generate(rng: &mut SeededRandom, difficulty: Difficulty) -> (Board, Solution) {
    let (rows, cols) = dimensions(difficulty);
    let pairs = rows * cols / 2;
    let mut cards: Vec<u8> = (0..pairs as u8).flat_map(|id| [id, id]).collect();
    rng.shuffle(&mut cards);

    let solution: Solution = cards.chunks(cols).map(<[u8]>::to_vec).collect();
    (vec![vec![None; cols]; rows], solution)
}

pub fn validate(puzzle: &Puzzle, board: &Board) -> Verdict {
    if board.len() != puzzle.rows() || board.iter().any(|row| row.len() != puzzle.cols()) {
        return Verdict::Invalid(Vec::new());
    }
    let mut wrong = Vec::new();
    let mut hidden = false;
    for (r, row) in board.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                None => hidden = true,
                Some(v) if *v != puzzle.solution[r][c] => wrong.push((r, c)),
                Some(_) => {}
            }
        }
    }
    if !wrong.is_empty() {
        Verdict::Invalid(wrong)
    } else if hidden {
        Verdict::Incomplete
    } else {
        Verdict::Solved
    }
}
