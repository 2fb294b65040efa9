//! Deterministic daily puzzles and the bookkeeping around them.
//!
//! Shared by the backend (puzzle id verification, ledger recomputation) and
//! the offline-first client (generation, game state, streaks).

pub mod achievements;
pub mod error;
pub mod game;
pub mod generator;
pub mod puzzle;
pub mod rng;
pub mod scoring;
pub mod seed;
pub mod stats;
pub mod streak;
pub mod wire;

pub use error::CoreError;
pub use game::{CellStatus, GameState, GameStatus};
pub use generator::PuzzleGenerator;
pub use puzzle::{parse_puzzle_id, Board, Difficulty, Puzzle, PuzzleKind, Verdict};
pub use seed::SeedSchedule;
pub use stats::{DayResult, UserStats};

/// Dates are keyed as `YYYY-MM-DD` everywhere (history maps, seeds, wire).
pub const DATE_FORMAT: &str = "%Y-%m-%d";
