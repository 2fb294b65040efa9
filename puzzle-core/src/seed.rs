//! Daily seed derivation.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{puzzle::PuzzleKind, DATE_FORMAT};

pub const DEFAULT_SALT: &str = "daily-puzzle-secret-salt-v1";

/// How calendar dates map onto puzzle seeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SeedSchedule {
    /// A fresh puzzle every calendar day
    #[default]
    Daily,
    /// The same puzzle for every day of a repeating `days`-long window,
    /// windows aligned on `anchor`
    Cycle { days: u32, anchor: NaiveDate },
}

impl SeedSchedule {
    /// First date of the window containing `date`.
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match *self {
            SeedSchedule::Daily => date,
            SeedSchedule::Cycle { days, anchor } => {
                if days <= 1 {
                    return date;
                }
                let days = i64::from(days);
                let offset = (date - anchor).num_days();
                anchor + Duration::days(offset.div_euclid(days) * days)
            }
        }
    }
}

/// Seed for a plain calendar date: first 32 bits of `sha256("{date}-{salt}")`.
pub fn daily_seed(date: NaiveDate, salt: &str) -> u32 {
    hash_seed(&format!("{}-{}", date.format(DATE_FORMAT), salt))
}

/// Seed for one puzzle kind on `date` under `schedule`.
///
/// Binary puzzles keep the plain daily seed. Other kinds hash their own name in
/// so each kind is an independent stream.
pub fn puzzle_seed(date: NaiveDate, kind: PuzzleKind, salt: &str, schedule: SeedSchedule) -> u32 {
    let bucket = schedule.bucket_start(date);
    match kind {
        PuzzleKind::Binary => daily_seed(bucket, salt),
        other => hash_seed(&format!(
            "{}-{}-{}",
            bucket.format(DATE_FORMAT),
            salt,
            other
        )),
    }
}

fn hash_seed(raw: &str) -> u32 {
    let digest = Sha256::digest(raw.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_daily_seed_is_stable() {
        let a = daily_seed(date("2024-03-01"), DEFAULT_SALT);
        let b = daily_seed(date("2024-03-01"), DEFAULT_SALT);
        assert_eq!(a, b);
    }

    #[test]
    fn test_daily_seed_differs_by_day_and_salt() {
        let a = daily_seed(date("2024-03-01"), DEFAULT_SALT);
        let b = daily_seed(date("2024-03-02"), DEFAULT_SALT);
        let c = daily_seed(date("2024-03-01"), "another-salt");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_kinds_get_independent_seeds() {
        let d = date("2024-03-01");
        let binary = puzzle_seed(d, PuzzleKind::Binary, DEFAULT_SALT, SeedSchedule::Daily);
        let sudoku = puzzle_seed(d, PuzzleKind::Sudoku, DEFAULT_SALT, SeedSchedule::Daily);
        let pairs = puzzle_seed(d, PuzzleKind::Pairs, DEFAULT_SALT, SeedSchedule::Daily);
        assert_eq!(binary, daily_seed(d, DEFAULT_SALT));
        assert_ne!(binary, sudoku);
        assert_ne!(sudoku, pairs);
    }

    #[test]
    fn test_cycle_buckets_share_a_seed() {
        let schedule = SeedSchedule::Cycle {
            days: 3,
            anchor: date("2024-01-01"),
        };
        assert_eq!(schedule.bucket_start(date("2024-01-01")), date("2024-01-01"));
        assert_eq!(schedule.bucket_start(date("2024-01-03")), date("2024-01-01"));
        assert_eq!(schedule.bucket_start(date("2024-01-04")), date("2024-01-04"));

        let s1 = puzzle_seed(date("2024-01-02"), PuzzleKind::Sudoku, DEFAULT_SALT, schedule);
        let s2 = puzzle_seed(date("2024-01-03"), PuzzleKind::Sudoku, DEFAULT_SALT, schedule);
        let s3 = puzzle_seed(date("2024-01-04"), PuzzleKind::Sudoku, DEFAULT_SALT, schedule);
        assert_eq!(s1, s2);
        assert_ne!(s2, s3);
    }

    #[test]
    fn test_cycle_before_anchor_floors() {
        let schedule = SeedSchedule::Cycle {
            days: 7,
            anchor: date("2024-01-08"),
        };
        assert_eq!(schedule.bucket_start(date("2024-01-07")), date("2024-01-01"));
        assert_eq!(schedule.bucket_start(date("2024-01-01")), date("2024-01-01"));
    }

    #[test]
    fn test_cycle_of_one_day_is_daily() {
        let schedule = SeedSchedule::Cycle {
            days: 1,
            anchor: date("2024-01-01"),
        };
        assert_eq!(schedule.bucket_start(date("2024-05-05")), date("2024-05-05"));
    }
}
