//! Puzzle types and per-kind generation/validation rules.

pub mod binary;
pub mod lights_out;
pub mod pairs;
pub mod sudoku;

use std::{convert::Infallible, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{rng::SeededRandom, CoreError};

/// Player-facing grid. `None` is an empty (or hidden) cell.
pub type Board = Vec<Vec<Option<u8>>>;

/// Fully determined grid.
pub type Solution = Vec<Vec<u8>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PuzzleKind {
    /// 0/1 grid: no three in a row, balanced rows and columns, no duplicate lines
    #[default]
    Binary,
    /// 4x4 sudoku with 2x2 boxes
    Sudoku,
    /// Press cells to toggle a plus-shaped neighbourhood until every light is off
    LightsOut,
    /// Memory game: uncover matching cards two at a time
    Pairs,
}

impl PuzzleKind {
    pub const ALL: [PuzzleKind; 4] = [
        PuzzleKind::Binary,
        PuzzleKind::Sudoku,
        PuzzleKind::LightsOut,
        PuzzleKind::Pairs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PuzzleKind::Binary => "binary",
            PuzzleKind::Sudoku => "sudoku",
            PuzzleKind::LightsOut => "lights-out",
            PuzzleKind::Pairs => "pairs",
        }
    }
}

impl fmt::Display for PuzzleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PuzzleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" => Ok(PuzzleKind::Binary),
            "sudoku" => Ok(PuzzleKind::Sudoku),
            "lights-out" | "lights_out" | "lightsout" => Ok(PuzzleKind::LightsOut),
            "pairs" => Ok(PuzzleKind::Pairs),
            other => Err(format!("unknown puzzle kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown difficulties fall back to easy.
impl FromStr for Difficulty {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub id: String,
    pub kind: PuzzleKind,
    pub difficulty: Difficulty,
    /// Calendar date for daily puzzles, `None` for practice puzzles
    pub date: Option<NaiveDate>,
    pub seed: u32,
    pub grid: Board,
    pub solution: Solution,
}

/// A puzzle as served to clients: everything except the solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PuzzleView {
    pub id: String,
    pub kind: PuzzleKind,
    pub difficulty: Difficulty,
    pub date: Option<NaiveDate>,
    pub rows: usize,
    pub cols: usize,
    pub grid: Board,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "cells", rename_all = "snake_case")]
pub enum Verdict {
    Solved,
    Incomplete,
    /// Cells that break a rule
    Invalid(Vec<(usize, usize)>),
}

pub fn puzzle_id(seed: u32, kind: PuzzleKind, difficulty: Difficulty) -> String {
    format!("{}-{}-{}", seed, kind, difficulty)
}

/// Split a puzzle id back into its parts. Two-part ids (`{seed}-{difficulty}`)
/// predate per-kind ids and name binary puzzles.
pub fn parse_puzzle_id(id: &str) -> Option<(u32, PuzzleKind, Difficulty)> {
    let (seed, rest) = id.split_once('-')?;
    let seed = seed.parse().ok()?;
    let (kind, difficulty) = match rest.rsplit_once('-') {
        Some((kind, difficulty)) => (kind.parse().ok()?, difficulty),
        None => (PuzzleKind::Binary, rest),
    };
    let difficulty = match difficulty {
        "easy" | "medium" | "hard" => difficulty.parse().ok()?,
        _ => return None,
    };
    Some((seed, kind, difficulty))
}

impl Puzzle {
    /// Build a puzzle of `kind` from a seeded stream.
    pub fn generate(
        seed: u32,
        kind: PuzzleKind,
        difficulty: Difficulty,
        date: Option<NaiveDate>,
    ) -> Self {
        let mut rng = SeededRandom::new(seed);
        let (grid, solution) = match kind {
            PuzzleKind::Binary => binary::generate(&mut rng, difficulty),
            PuzzleKind::Sudoku => sudoku::generate(&mut rng, difficulty),
            PuzzleKind::LightsOut => lights_out::generate(&mut rng, difficulty),
            PuzzleKind::Pairs => pairs::generate(&mut rng, difficulty),
        };

        Self {
            id: puzzle_id(seed, kind, difficulty),
            kind,
            difficulty,
            date,
            seed,
            grid,
            solution,
        }
    }

    pub fn rows(&self) -> usize {
        self.solution.len()
    }

    pub fn cols(&self) -> usize {
        self.solution.first().map_or(0, Vec::len)
    }

    /// Whether the cell was pre-filled and is locked for the player.
    pub fn is_given(&self, row: usize, col: usize) -> bool {
        match self.kind {
            PuzzleKind::Binary | PuzzleKind::Sudoku => {
                matches!(self.grid.get(row).and_then(|r| r.get(col)), Some(Some(_)))
            }
            PuzzleKind::LightsOut | PuzzleKind::Pairs => false,
        }
    }

    /// The board a fresh game starts from.
    pub fn starting_board(&self) -> Board {
        match self.kind {
            PuzzleKind::Binary | PuzzleKind::Sudoku => self.grid.clone(),
            // presses, all unpressed
            PuzzleKind::LightsOut => vec![vec![Some(0); self.cols()]; self.rows()],
            PuzzleKind::Pairs => vec![vec![None; self.cols()]; self.rows()],
        }
    }

    /// Check a value the player wants to write into a cell.
    pub fn check_value(&self, value: u8) -> Result<(), CoreError> {
        let allowed = match self.kind {
            PuzzleKind::Binary | PuzzleKind::LightsOut => value <= 1,
            PuzzleKind::Sudoku => (1..=sudoku::SIZE as u8).contains(&value),
            PuzzleKind::Pairs => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(CoreError::IllegalValue { value })
        }
    }

    pub fn check_bounds(&self, row: usize, col: usize) -> Result<(), CoreError> {
        if row < self.rows() && col < self.cols() {
            Ok(())
        } else {
            Err(CoreError::OutOfBounds {
                row,
                col,
                size: self.rows().max(self.cols()),
            })
        }
    }

    pub fn validate(&self, board: &Board) -> Verdict {
        match self.kind {
            PuzzleKind::Binary => binary::validate(self, board),
            PuzzleKind::Sudoku => sudoku::validate(self, board),
            PuzzleKind::LightsOut => lights_out::validate(self, board),
            PuzzleKind::Pairs => pairs::validate(self, board),
        }
    }

    /// Cells currently breaking a rule, used for live highlighting.
    pub fn conflicts(&self, board: &Board) -> Vec<(usize, usize)> {
        match self.kind {
            PuzzleKind::Binary => binary::conflicts(board),
            PuzzleKind::Sudoku => sudoku::conflicts(board),
            PuzzleKind::LightsOut | PuzzleKind::Pairs => Vec::new(),
        }
    }

    pub fn view(&self) -> PuzzleView {
        PuzzleView {
            id: self.id.clone(),
            kind: self.kind,
            difficulty: self.difficulty,
            date: self.date,
            rows: self.rows(),
            cols: self.cols(),
            grid: self.grid.clone(),
        }
    }
}

/// Every given still holds its original value.
fn givens_kept(puzzle: &Puzzle, board: &Board) -> bool {
    puzzle.grid.iter().zip(board).all(|(given_row, row)| {
        given_row
            .iter()
            .zip(row)
            .all(|(given, cell)| given.is_none() || given == cell)
    })
}

/// Shared verdict for fill-in puzzles (binary, sudoku).
fn fill_in_verdict(
    puzzle: &Puzzle,
    board: &Board,
    conflicts: Vec<(usize, usize)>,
    complete_rules: impl Fn(&Solution) -> Vec<(usize, usize)>,
) -> Verdict {
    if board.len() != puzzle.rows() || board.iter().any(|r| r.len() != puzzle.cols()) {
        return Verdict::Invalid(Vec::new());
    }
    if !givens_kept(puzzle, board) {
        let changed = puzzle
            .grid
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |(c, given)| given.is_some() && **given != board[r][*c])
                    .map(move |(c, _)| (r, c))
            })
            .collect();
        return Verdict::Invalid(changed);
    }
    if !conflicts.is_empty() {
        return Verdict::Invalid(conflicts);
    }

    let filled: Option<Solution> = board
        .iter()
        .map(|row| row.iter().copied().collect::<Option<Vec<u8>>>())
        .collect();
    match filled {
        None => Verdict::Incomplete,
        Some(full) => {
            let broken = complete_rules(&full);
            if broken.is_empty() {
                Verdict::Solved
            } else {
                Verdict::Invalid(broken)
            }
        }
    }
}
