//! 4x4 sudoku with 2x2 boxes.

use super::{fill_in_verdict, Board, Difficulty, Puzzle, Solution, Verdict};
use crate::rng::SeededRandom;

pub const SIZE: usize = 4;
const BOX: usize = 2;

fn remove_count(difficulty: Difficulty) -> usize {
    match difficulty {
        Difficulty::Easy => 4,
        Difficulty::Medium => 6,
        Difficulty::Hard => 8,
    }
}

pub fn generate(rng: &mut SeededRandom, difficulty: Difficulty) -> (Board, Solution) {
    let mut cells = vec![vec![0u8; SIZE]; SIZE];
    let filled = fill(&mut cells, rng);
    debug_assert!(filled, "an empty 4x4 sudoku always has a completion");

    let mut grid: Board = cells
        .iter()
        .map(|row| row.iter().map(|&v| Some(v)).collect())
        .collect();

    for _ in 0..remove_count(difficulty) {
        let mut r = rng.below(SIZE);
        let mut c = rng.below(SIZE);
        while grid[r][c].is_none() {
            r = rng.below(SIZE);
            c = rng.below(SIZE);
        }
        grid[r][c] = None;
    }

    (grid, cells)
}

fn fill(cells: &mut Solution, rng: &mut SeededRandom) -> bool {
    for r in 0..SIZE {
        for c in 0..SIZE {
            if cells[r][c] != 0 {
                continue;
            }
            let mut nums = [1u8, 2, 3, 4];
            rng.shuffle(&mut nums);
            for num in nums {
                if can_place(cells, r, c, num) {
                    cells[r][c] = num;
                    if fill(cells, rng) {
                        return true;
                    }
                    cells[r][c] = 0;
                }
            }
            return false;
        }
    }
    true
}

fn can_place(cells: &Solution, r: usize, c: usize, num: u8) -> bool {
    for i in 0..SIZE {
        if cells[r][i] == num || cells[i][c] == num {
            return false;
        }
    }
    let (start_r, start_c) = ((r / BOX) * BOX, (c / BOX) * BOX);
    for i in 0..BOX {
        for j in 0..BOX {
            if cells[start_r + i][start_c + j] == num {
                return false;
            }
        }
    }
    true
}

/// Filled cells sharing a value with another cell in their row, column or box.
pub fn conflicts(board: &Board) -> Vec<(usize, usize)> {
    let mut found = Vec::new();
    for r in 0..board.len() {
        for c in 0..board[r].len() {
            let Some(v) = board[r][c] else { continue };
            let clash = (0..SIZE).any(|i| {
                (i != c && board[r].get(i) == Some(&Some(v)))
                    || (i != r && board.get(i).and_then(|row| row.get(c)) == Some(&Some(v)))
            }) || {
                let (start_r, start_c) = ((r / BOX) * BOX, (c / BOX) * BOX);
                (start_r..start_r + BOX)
                    .flat_map(|rr| (start_c..start_c + BOX).map(move |cc| (rr, cc)))
                    .any(|(rr, cc)| {
                        (rr, cc) != (r, c)
                            && board.get(rr).and_then(|row| row.get(cc)) == Some(&Some(v))
                    })
            };
            if clash {
                found.push((r, c));
            }
        }
    }
    found
}

pub fn validate(puzzle: &Puzzle, board: &Board) -> Verdict {
    if board.len() != SIZE || board.iter().any(|row| row.len() != SIZE) {
        return Verdict::Invalid(Vec::new());
    }
    if board
        .iter()
        .flatten()
        .flatten()
        .any(|&v| !(1..=SIZE as u8).contains(&v))
    {
        return Verdict::Invalid(Vec::new());
    }
    // conflicts already cover every rule once the grid is full
    fill_in_verdict(puzzle, board, conflicts(board), |_| Vec::new())
}
