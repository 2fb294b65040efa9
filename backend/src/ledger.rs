//! Rules for accepting scores into a user's ledger, free of any database.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use daily_puzzle_core::{
    scoring::BASE_SCORE,
    stats::level_for,
    streak::{self, StreakTransition},
    wire::{LedgerEntry, LedgerStats, ScoreSubmission, SubmissionStatus},
    PuzzleGenerator,
};

/// Days a submission may be dated ahead of the server's today (client timezones)
pub const FUTURE_SLACK_DAYS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
}

impl From<UpsertOutcome> for SubmissionStatus {
    fn from(outcome: UpsertOutcome) -> Self {
        match outcome {
            UpsertOutcome::Created => SubmissionStatus::Created,
            UpsertOutcome::Updated => SubmissionStatus::Updated,
            UpsertOutcome::Unchanged => SubmissionStatus::Unchanged,
        }
    }
}

/// Checks that do not need the database. `Err` carries the rejection reason.
pub fn validate_submission(
    submission: &ScoreSubmission,
    today: NaiveDate,
    backfill_days: i64,
    generator: &PuzzleGenerator,
) -> Result<(), String> {
    let max_score = BASE_SCORE as i32;
    if !(0..=max_score).contains(&submission.score) {
        return Err(format!("score must be between 0 and {}", max_score));
    }
    if submission.date > today + Duration::days(FUTURE_SLACK_DAYS) {
        return Err("date is in the future".to_string());
    }
    if submission.date < today - Duration::days(backfill_days) {
        return Err(format!(
            "date is older than {} days and can no longer be submitted",
            backfill_days
        ));
    }
    if !generator.verify_id(submission.date, &submission.puzzle_id) {
        return Err("puzzle id does not match the puzzle for that date".to_string());
    }
    Ok(())
}

/// Upsert decision for one (user, date): the stored score only ever rises.
pub fn decide(existing_score: Option<i32>, incoming_score: i32) -> UpsertOutcome {
    match existing_score {
        None => UpsertOutcome::Created,
        Some(existing) if incoming_score > existing => UpsertOutcome::Updated,
        Some(_) => UpsertOutcome::Unchanged,
    }
}

/// Streak effect of each submission, in order, on a ledger that already
/// holds `days`.
pub fn transitions(
    mut days: BTreeSet<NaiveDate>,
    submissions: &[ScoreSubmission],
) -> Vec<StreakTransition> {
    submissions
        .iter()
        .map(|submission| {
            let last = days.range(..=submission.date).next_back().copied();
            days.insert(submission.date);
            StreakTransition::between(last, submission.date)
        })
        .collect()
}

/// Recompute a user's aggregates from their whole ledger.
pub fn summarize(entries: &[LedgerEntry], today: NaiveDate) -> LedgerStats {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date).collect();
    let total_points: i64 = entries.iter().map(|e| i64::from(e.score)).sum();
    let puzzles_solved = entries.len() as u32;
    let avg_solve_time = if entries.is_empty() {
        0.0
    } else {
        entries.iter().map(|e| f64::from(e.time_taken)).sum::<f64>() / entries.len() as f64
    };

    LedgerStats {
        streak: streak::current_streak(&days, today),
        longest_streak: streak::longest_streak(&days),
        total_points,
        level: level_for(total_points),
        puzzles_solved,
        avg_solve_time,
        last_played: days.iter().next_back().copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daily_puzzle_core::{Difficulty, PuzzleKind};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, daily_puzzle_core::DATE_FORMAT).unwrap()
    }

    fn submission(generator: &PuzzleGenerator, day: &str, score: i32) -> ScoreSubmission {
        let day = date(day);
        let puzzle = generator.daily(day, PuzzleKind::Sudoku, Difficulty::Easy);
        ScoreSubmission {
            date: day,
            score,
            puzzle_id: puzzle.id,
            time_taken: 30,
        }
    }

    fn entry(day: &str, score: i32, time_taken: u32) -> LedgerEntry {
        LedgerEntry {
            date: date(day),
            score,
            time_taken,
            puzzle_id: "1-binary-easy".to_string(),
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        let generator = PuzzleGenerator::default();
        let sub = submission(&generator, "2024-06-10", 700);
        assert_eq!(
            validate_submission(&sub, date("2024-06-10"), 30, &generator),
            Ok(())
        );
    }

    #[test]
    fn test_score_range_enforced() {
        let generator = PuzzleGenerator::default();
        let today = date("2024-06-10");
        for score in [-1, 1001] {
            let sub = submission(&generator, "2024-06-10", score);
            assert!(validate_submission(&sub, today, 30, &generator).is_err());
        }
    }

    #[test]
    fn test_date_window() {
        let generator = PuzzleGenerator::default();
        let today = date("2024-06-10");

        // One day ahead is timezone slack
        let tomorrow = submission(&generator, "2024-06-11", 500);
        assert!(validate_submission(&tomorrow, today, 30, &generator).is_ok());

        let future = submission(&generator, "2024-06-12", 500);
        assert_eq!(
            validate_submission(&future, today, 30, &generator),
            Err("date is in the future".to_string())
        );

        let edge = submission(&generator, "2024-05-11", 500);
        assert!(validate_submission(&edge, today, 30, &generator).is_ok());

        let stale = submission(&generator, "2024-05-10", 500);
        assert!(validate_submission(&stale, today, 30, &generator).is_err());
    }

    #[test]
    fn test_puzzle_id_must_match_date() {
        let generator = PuzzleGenerator::default();
        let mut sub = submission(&generator, "2024-06-09", 500);
        sub.date = date("2024-06-10");
        assert!(validate_submission(&sub, date("2024-06-10"), 30, &generator).is_err());
    }

    #[test]
    fn test_decide() {
        assert_eq!(decide(None, 100), UpsertOutcome::Created);
        assert_eq!(decide(Some(100), 200), UpsertOutcome::Updated);
        assert_eq!(decide(Some(200), 200), UpsertOutcome::Unchanged);
        assert_eq!(decide(Some(300), 200), UpsertOutcome::Unchanged);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let stored = match decide(None, 640) {
            UpsertOutcome::Created => 640,
            _ => unreachable!(),
        };
        assert_eq!(decide(Some(stored), 640), UpsertOutcome::Unchanged);
    }

    #[test]
    fn test_transitions_follow_ledger_order() {
        let generator = PuzzleGenerator::default();
        let days: BTreeSet<NaiveDate> = [date("2024-06-01"), date("2024-06-05")].into();
        let batch = vec![
            submission(&generator, "2024-06-06", 500),
            submission(&generator, "2024-06-06", 600),
            submission(&generator, "2024-06-09", 500),
            // Backfilled day right after an existing one
            submission(&generator, "2024-06-02", 500),
        ];
        assert_eq!(
            transitions(days, &batch),
            vec![
                StreakTransition::Increment,
                StreakTransition::AlreadyPlayed,
                StreakTransition::Reset,
                StreakTransition::Increment,
            ]
        );

        let first = vec![submission(&generator, "2024-06-10", 500)];
        assert_eq!(
            transitions(BTreeSet::new(), &first),
            vec![StreakTransition::First]
        );
    }

    #[test]
    fn test_summarize() {
        let entries = vec![
            entry("2024-06-01", 900, 10),
            entry("2024-06-02", 800, 20),
            entry("2024-06-04", 700, 30),
            entry("2024-06-05", 600, 40),
        ];
        let stats = summarize(&entries, date("2024-06-05"));
        assert_eq!(stats.streak, 2);
        assert_eq!(stats.longest_streak, 2);
        assert_eq!(stats.total_points, 3000);
        assert_eq!(stats.level, 4);
        assert_eq!(stats.puzzles_solved, 4);
        assert!((stats.avg_solve_time - 25.0).abs() < f64::EPSILON);
        assert_eq!(stats.last_played, Some(date("2024-06-05")));
    }

    #[test]
    fn test_summarize_empty() {
        let stats = summarize(&[], date("2024-06-05"));
        assert_eq!(stats.streak, 0);
        assert_eq!(stats.level, 1);
        assert_eq!(stats.last_played, None);
    }

    #[test]
    fn test_streak_survives_until_day_is_over() {
        let entries = vec![entry("2024-06-03", 500, 10), entry("2024-06-04", 500, 10)];
        assert_eq!(summarize(&entries, date("2024-06-05")).streak, 2);
        assert_eq!(summarize(&entries, date("2024-06-06")).streak, 0);
    }
}
