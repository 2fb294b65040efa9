use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    puzzle::{puzzle_id, Difficulty, Puzzle, PuzzleKind},
    seed::{puzzle_seed, SeedSchedule, DEFAULT_SALT},
};

/// Produces the puzzle of the day for any kind and difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleGenerator {
    pub salt: String,
    pub schedule: SeedSchedule,
}

impl Default for PuzzleGenerator {
    fn default() -> Self {
        Self {
            salt: DEFAULT_SALT.to_string(),
            schedule: SeedSchedule::Daily,
        }
    }
}

impl PuzzleGenerator {
    pub fn new(salt: impl Into<String>, schedule: SeedSchedule) -> Self {
        Self {
            salt: salt.into(),
            schedule,
        }
    }

    pub fn seed_for(&self, date: NaiveDate, kind: PuzzleKind) -> u32 {
        puzzle_seed(date, kind, &self.salt, self.schedule)
    }

    /// The daily puzzle. Identical for every caller with the same salt and schedule.
    pub fn daily(&self, date: NaiveDate, kind: PuzzleKind, difficulty: Difficulty) -> Puzzle {
        let seed = self.seed_for(date, kind);
        tracing::debug!(%date, %kind, %difficulty, seed, "generating daily puzzle");
        Puzzle::generate(seed, kind, difficulty, Some(date))
    }

    /// Off-calendar puzzle from an explicit seed.
    pub fn practice(&self, seed: u32, kind: PuzzleKind, difficulty: Difficulty) -> Puzzle {
        Puzzle::generate(seed, kind, difficulty, None)
    }

    /// Whether `id` names one of the puzzles served on `date`.
    pub fn verify_id(&self, date: NaiveDate, id: &str) -> bool {
        PuzzleKind::ALL.iter().any(|&kind| {
            let seed = self.seed_for(date, kind);
            [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard]
                .iter()
                .any(|&difficulty| puzzle_id(seed, kind, difficulty) == id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DATE_FORMAT;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_daily_is_stable_and_dated() {
        let generator = PuzzleGenerator::default();
        let a = generator.daily(date("2024-06-01"), PuzzleKind::Sudoku, Difficulty::Medium);
        let b = generator.daily(date("2024-06-01"), PuzzleKind::Sudoku, Difficulty::Medium);
        assert_eq!(a, b);
        assert_eq!(a.date, Some(date("2024-06-01")));
        assert!(a.id.ends_with("-sudoku-medium"));
    }

    #[test]
    fn test_next_day_differs() {
        let generator = PuzzleGenerator::default();
        let a = generator.daily(date("2024-06-01"), PuzzleKind::Binary, Difficulty::Hard);
        let b = generator.daily(date("2024-06-02"), PuzzleKind::Binary, Difficulty::Hard);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_cycle_schedule_repeats_within_window() {
        let generator = PuzzleGenerator::new(
            DEFAULT_SALT,
            SeedSchedule::Cycle {
                days: 2,
                anchor: date("2024-06-01"),
            },
        );
        let a = generator.daily(date("2024-06-01"), PuzzleKind::Pairs, Difficulty::Easy);
        let b = generator.daily(date("2024-06-02"), PuzzleKind::Pairs, Difficulty::Easy);
        assert_eq!(a.solution, b.solution);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_verify_id() {
        let generator = PuzzleGenerator::default();
        let d = date("2024-06-01");
        let puzzle = generator.daily(d, PuzzleKind::LightsOut, Difficulty::Hard);
        assert!(generator.verify_id(d, &puzzle.id));
        assert!(!generator.verify_id(date("2024-06-05"), &puzzle.id));
        assert!(!generator.verify_id(d, "not-a-puzzle"));
    }

    #[test]
    fn test_practice_has_no_date() {
        let generator = PuzzleGenerator::default();
        let p = generator.practice(99, PuzzleKind::Binary, Difficulty::Easy);
        assert!(p.date.is_none());
        assert_eq!(p.id, "99-binary-easy");
    }
}
