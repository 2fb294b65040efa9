//! Binary (Takuzu) puzzles.

use super::{fill_in_verdict, Board, Difficulty, Puzzle, Solution, Verdict};
use crate::rng::SeededRandom;

fn params(difficulty: Difficulty) -> (usize, f64) {
    match difficulty {
        Difficulty::Easy => (4, 0.3),
        Difficulty::Medium => (6, 0.4),
        Difficulty::Hard => (8, 0.5),
    }
}

pub fn generate(rng: &mut SeededRandom, difficulty: Difficulty) -> (Board, Solution) {
    let (size, hide_probability) = params(difficulty);
    let mut cells = vec![vec![u8::MAX; size]; size];
    let filled = fill(&mut cells, 0, size, rng);
    debug_assert!(filled, "every even size has a valid binary grid");

    let mut grid: Board = cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|&v| if rng.chance(hide_probability) { None } else { Some(v) })
                .collect()
        })
        .collect();

    if grid.iter().flatten().all(Option::is_some) {
        let idx = rng.below(size * size);
        grid[idx / size][idx % size] = None;
    }

    (grid, cells)
}

fn fill(cells: &mut Solution, idx: usize, size: usize, rng: &mut SeededRandom) -> bool {
    if idx == size * size {
        return true;
    }
    let (row, col) = (idx / size, idx % size);
    let order = if rng.chance(0.5) { [0, 1] } else { [1, 0] };

    for value in order {
        cells[row][col] = value;
        if placement_ok(cells, row, col, size) && fill(cells, idx + 1, size, rng) {
            return true;
        }
    }
    cells[row][col] = u8::MAX;
    false
}

/// Checks the cell just placed at (row, col) against the partially filled grid.
fn placement_ok(cells: &Solution, row: usize, col: usize, size: usize) -> bool {
    let v = cells[row][col];
    let half = size / 2;

    if col >= 2 && cells[row][col - 1] == v && cells[row][col - 2] == v {
        return false;
    }
    if row >= 2 && cells[row - 1][col] == v && cells[row - 2][col] == v {
        return false;
    }
    if cells[row][..=col].iter().filter(|&&x| x == v).count() > half {
        return false;
    }
    if (0..=row).filter(|&r| cells[r][col] == v).count() > half {
        return false;
    }
    if col == size - 1 && (0..row).any(|r| cells[r] == cells[row]) {
        return false;
    }
    if row == size - 1 {
        let column = |c: usize| (0..size).map(|r| cells[r][c]).collect::<Vec<_>>();
        let this = column(col);
        if (0..col).any(|c| column(c) == this) {
            return false;
        }
    }
    true
}

/// Filled cells breaking the adjacency or balance rules. A board that is
/// not square has no meaningful conflicts and yields none.
pub fn conflicts(board: &Board) -> Vec<(usize, usize)> {
    let size = board.len();
    if board.iter().any(|row| row.len() != size) {
        return Vec::new();
    }
    let half = size / 2;
    let mut bad = vec![vec![false; size]; size];

    for r in 0..size {
        for c in 0..size {
            let Some(v) = board[r][c] else { continue };
            if c + 2 < size && board[r][c + 1] == Some(v) && board[r][c + 2] == Some(v) {
                bad[r][c] = true;
                bad[r][c + 1] = true;
                bad[r][c + 2] = true;
            }
            if r + 2 < size && board[r + 1][c] == Some(v) && board[r + 2][c] == Some(v) {
                bad[r][c] = true;
                bad[r + 1][c] = true;
                bad[r + 2][c] = true;
            }
        }
    }

    for v in 0..=1u8 {
        for r in 0..size {
            if board[r].iter().filter(|&&x| x == Some(v)).count() > half {
                for c in 0..size {
                    if board[r][c] == Some(v) {
                        bad[r][c] = true;
                    }
                }
            }
        }
        for c in 0..size {
            if (0..size).filter(|&r| board[r][c] == Some(v)).count() > half {
                for r in 0..size {
                    if board[r][c] == Some(v) {
                        bad[r][c] = true;
                    }
                }
            }
        }
    }

    collect_marked(&bad)
}

/// Line uniqueness, only meaningful once the grid is full.
fn duplicate_lines(full: &Solution) -> Vec<(usize, usize)> {
    let size = full.len();
    let mut bad = vec![vec![false; size]; size];

    for a in 0..size {
        for b in (a + 1)..size {
            if full[a] == full[b] {
                for c in 0..size {
                    bad[a][c] = true;
                    bad[b][c] = true;
                }
            }
            if (0..size).all(|r| full[r][a] == full[r][b]) {
                for r in 0..size {
                    bad[r][a] = true;
                    bad[r][b] = true;
                }
            }
        }
    }

    collect_marked(&bad)
}

fn collect_marked(bad: &[Vec<bool>]) -> Vec<(usize, usize)> {
    bad.iter()
        .enumerate()
        .flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, &b)| b)
                .map(move |(c, _)| (r, c))
        })
        .collect()
}

pub fn validate(puzzle: &Puzzle, board: &Board) -> Verdict {
    if board.len() != puzzle.rows() || board.iter().any(|row| row.len() != puzzle.cols()) {
        return Verdict::Invalid(Vec::new());
    }
    if board.iter().flatten().flatten().any(|&v| v > 1) {
        return Verdict::Invalid(Vec::new());
    }
    fill_in_verdict(puzzle, board, conflicts(board), duplicate_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::PuzzleKind;

    fn solution_is_valid(solution: &Solution) -> bool {
        let board: Board = solution
            .iter()
            .map(|row| row.iter().map(|v| Some(*v)).collect())
            .collect();
        conflicts(&board).is_empty() && duplicate_lines(solution).is_empty()
    }

    #[test]
    fn test_sizes_follow_difficulty() {
        for (difficulty, size) in [
            (Difficulty::Easy, 4),
            (Difficulty::Medium, 6),
            (Difficulty::Hard, 8),
        ] {
            let mut rng = SeededRandom::new(31);
            let (grid, solution) = generate(&mut rng, difficulty);
            assert_eq!(grid.len(), size);
            assert_eq!(solution.len(), size);
            assert!(solution.iter().all(|row| row.len() == size));
        }
    }

    #[test]
    fn test_generated_solutions_obey_rules() {
        for seed in 0..25 {
            for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
                let mut rng = SeededRandom::new(seed * 7919);
                let (_, solution) = generate(&mut rng, difficulty);
                assert!(solution_is_valid(&solution), "seed {} {:?}", seed, difficulty);
            }
        }
    }

    #[test]
    fn test_givens_match_solution_and_some_are_hidden() {
        let mut rng = SeededRandom::new(4242);
        let (grid, solution) = generate(&mut rng, Difficulty::Hard);
        let mut hidden = 0;
        for (r, row) in grid.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Some(v) => assert_eq!(*v, solution[r][c]),
                    None => hidden += 1,
                }
            }
        }
        assert!(hidden > 0);
    }

    #[test]
    fn test_three_in_a_row_is_a_conflict() {
        let board = vec![
            vec![Some(1), Some(1), Some(1), None],
            vec![None, None, None, None],
            vec![None, None, None, None],
            vec![None, None, None, None],
        ];
        let found = conflicts(&board);
        assert!(found.contains(&(0, 0)));
        assert!(found.contains(&(0, 2)));
        assert!(!found.contains(&(1, 0)));
    }

    #[test]
    fn test_ragged_board_is_invalid_not_a_panic() {
        let mut rng = SeededRandom::new(8);
        let (grid, solution) = generate(&mut rng, Difficulty::Easy);
        let puzzle = Puzzle {
            id: "ragged".to_string(),
            kind: PuzzleKind::Binary,
            difficulty: Difficulty::Easy,
            date: None,
            seed: 8,
            grid: grid.clone(),
            solution,
        };
        let mut board = grid;
        board[1].pop();

        assert!(conflicts(&board).is_empty());
        assert_eq!(validate(&puzzle, &board), Verdict::Invalid(Vec::new()));

        let mut short = puzzle.grid.clone();
        short.pop();
        assert_eq!(validate(&puzzle, &short), Verdict::Invalid(Vec::new()));
    }

    #[test]
    fn test_duplicate_rows_are_invalid() {
        let puzzle = Puzzle {
            id: "test".to_string(),
            kind: PuzzleKind::Binary,
            difficulty: Difficulty::Easy,
            date: None,
            seed: 0,
            grid: vec![vec![None; 4]; 4],
            solution: vec![vec![0; 4]; 4],
        };
        // balanced, no triples, but rows 0/2 and 1/3 repeat
        let board = vec![
            vec![Some(0), Some(1), Some(0), Some(1)],
            vec![Some(1), Some(0), Some(1), Some(0)],
            vec![Some(0), Some(1), Some(0), Some(1)],
            vec![Some(1), Some(0), Some(1), Some(0)],
        ];
        assert!(matches!(validate(&puzzle, &board), Verdict::Invalid(cells) if !cells.is_empty()));
    }

    #[test]
    fn test_alternate_valid_completion_is_accepted() {
        let solution = vec![
            vec![0, 0, 1, 1],
            vec![1, 1, 0, 0],
            vec![0, 1, 1, 0],
            vec![1, 0, 0, 1],
        ];
        let puzzle = Puzzle {
            id: "test".to_string(),
            kind: PuzzleKind::Binary,
            difficulty: Difficulty::Easy,
            date: None,
            seed: 0,
            grid: vec![vec![None; 4]; 4],
            solution,
        };
        let other = vec![
            vec![Some(0), Some(1), Some(0), Some(1)],
            vec![Some(1), Some(0), Some(1), Some(0)],
            vec![Some(0), Some(0), Some(1), Some(1)],
            vec![Some(1), Some(1), Some(0), Some(0)],
        ];
        assert_eq!(validate(&puzzle, &other), Verdict::Solved);
    }
}
