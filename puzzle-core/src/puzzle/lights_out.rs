//! Lights-out: pressing a cell toggles it and its orthogonal neighbours.
//!
//! `grid` holds the starting lights, `solution` the presses that produced
//! them. The player's board is a press matrix.

use super::{Board, Difficulty, Puzzle, Solution, Verdict};
use crate::rng::SeededRandom;

fn params(difficulty: Difficulty) -> (usize, usize) {
    match difficulty {
        Difficulty::Easy => (3, 3),
        Difficulty::Medium => (4, 5),
        Difficulty::Hard => (5, 8),
    }
}

pub fn generate(rng: &mut SeededRandom, difficulty: Difficulty) -> (Board, Solution) {
    let (size, press_count) = params(difficulty);
    let mut cells: Vec<usize> = (0..size * size).collect();

    loop {
        rng.shuffle(&mut cells);
        let mut presses = vec![vec![0u8; size]; size];
        for &idx in &cells[..press_count] {
            presses[idx / size][idx % size] = 1;
        }

        let lights = apply(&vec![vec![0u8; size]; size], &presses);
        // some press sets cancel out on 4x4 and 5x5
        if lights.iter().flatten().any(|&l| l == 1) {
            let grid = lights
                .iter()
                .map(|row| row.iter().map(|&l| Some(l)).collect())
                .collect();
            return (grid, presses);
        }
    }
}

/// Toggle every pressed cell's plus-shaped neighbourhood.
pub fn apply(lights: &Solution, presses: &Solution) -> Solution {
    let size = lights.len();
    let mut out = lights.clone();
    for r in 0..size {
        for c in 0..size {
            if presses[r][c] % 2 == 0 {
                continue;
            }
            out[r][c] ^= 1;
            if r > 0 {
                out[r - 1][c] ^= 1;
            }
            if r + 1 < size {
                out[r + 1][c] ^= 1;
            }
            if c > 0 {
                out[r][c - 1] ^= 1;
            }
            if c + 1 < size {
                out[r][c + 1] ^= 1;
            }
        }
    }
    out
}

fn to_values(board: &Board) -> Solution {
    board
        .iter()
        .map(|row| row.iter().map(|c| c.unwrap_or(0)).collect())
        .collect()
}

/// Lights still on after the player's presses.
pub fn lights_after(puzzle: &Puzzle, board: &Board) -> Solution {
    apply(&to_values(&puzzle.grid), &to_values(board))
}

pub fn validate(puzzle: &Puzzle, board: &Board) -> Verdict {
    if board.len() != puzzle.rows() || board.iter().any(|row| row.len() != puzzle.cols()) {
        return Verdict::Invalid(Vec::new());
    }
    if lights_after(puzzle, board).iter().flatten().all(|&l| l == 0) {
        Verdict::Solved
    } else {
        Verdict::Incomplete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleKind;

    #[test]
    fn test_corner_press_toggles_three_cells() {
        let lights = vec![vec![0u8; 3]; 3];
        let mut presses = vec![vec![0u8; 3]; 3];
        presses[0][0] = 1;
        let out = apply(&lights, &presses);
        assert_eq!(out, vec![vec![1, 1, 0], vec![1, 0, 0], vec![0, 0, 0]]);
    }

    #[test]
    fn test_double_press_cancels() {
        let lights = vec![vec![1u8, 0, 1], vec![0, 1, 0], vec![1, 0, 1]];
        let mut presses = vec![vec![0u8; 3]; 3];
        presses[1][1] = 1;
        let once = apply(&lights, &presses);
        assert_eq!(apply(&once, &presses), lights);
    }

    #[test]
    fn test_stored_solution_turns_everything_off() {
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for seed in 0..20 {
                let mut rng = SeededRandom::new(seed * 31 + 1);
                let (grid, solution) = generate(&mut rng, difficulty);
                let puzzle = Puzzle {
                    id: "t".to_string(),
                    kind: PuzzleKind::LightsOut,
                    difficulty,
                    date: None,
                    seed: 0,
                    grid,
                    solution: solution.clone(),
                };
                let board: Board = solution
                    .iter()
                    .map(|row| row.iter().map(|v| Some(*v)).collect())
                    .collect();
                assert_eq!(validate(&puzzle, &board), Verdict::Solved);
            }
        }
    }

    #[test]
    fn test_generated_grid_is_never_dark() {
        for seed in 0..50 {
            let mut rng = SeededRandom::new(seed);
            let (grid, _) = generate(&mut rng, Difficulty::Hard);
            assert!(grid.iter().flatten().any(|l| *l == Some(1)));
        }
    }
}
