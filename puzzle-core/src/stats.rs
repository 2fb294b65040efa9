//! Per-user progress: history, streaks, points, level and achievements.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    achievements::{self, Achievement},
    puzzle::{Difficulty, PuzzleKind},
    streak,
};

pub const POINTS_PER_LEVEL: i64 = 1000;

/// Outcome of one day's puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayResult {
    pub solved: bool,
    pub score: i32,
    pub difficulty: Difficulty,
    pub kind: PuzzleKind,
    pub puzzle_id: String,
    /// Seconds
    pub time_taken: u32,
    #[serde(default)]
    pub hints_used: u32,
}

impl DayResult {
    /// Solved beats unsolved, then the higher score wins.
    pub fn beats(&self, other: &DayResult) -> bool {
        (self.solved, self.score) > (other.solved, other.score)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub streak: u32,
    pub longest_streak: u32,
    pub total_points: i64,
    pub level: u32,
    pub achievements: BTreeSet<Achievement>,
    pub last_played: Option<NaiveDate>,
    pub history: BTreeMap<NaiveDate, DayResult>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Dates where the remote entry replaced or filled in the local one
    pub adopted: usize,
    /// Dates where the local entry was at least as good
    pub kept_local: usize,
}

pub fn level_for(total_points: i64) -> u32 {
    (total_points.max(0) / POINTS_PER_LEVEL) as u32 + 1
}

impl UserStats {
    /// Record a day's result, keeping the better one if the date already has
    /// an entry. Returns achievements unlocked by this call.
    pub fn record(&mut self, date: NaiveDate, result: DayResult, today: NaiveDate) -> Vec<Achievement> {
        let replace = self
            .history
            .get(&date)
            .map_or(true, |existing| result.beats(existing));
        if replace {
            self.history.insert(date, result.clone());
        }
        self.recompute(today);

        let mut unlocked = Vec::new();
        for achievement in achievements::qualified(self, &result) {
            if self.achievements.insert(achievement) {
                unlocked.push(achievement);
            }
        }
        if !unlocked.is_empty() {
            tracing::info!(?unlocked, "achievements unlocked");
        }
        unlocked
    }

    /// Fold the server's ledger into the local history. Per date the better
    /// entry wins; dates only known locally stay untouched.
    pub fn merge_remote<I>(&mut self, remote: I, today: NaiveDate) -> MergeReport
    where
        I: IntoIterator<Item = (NaiveDate, DayResult)>,
    {
        let mut report = MergeReport::default();
        for (date, entry) in remote {
            match self.history.get(&date) {
                Some(local) if !entry.beats(local) => report.kept_local += 1,
                _ => {
                    self.history.insert(date, entry);
                    report.adopted += 1;
                }
            }
        }
        self.recompute(today);
        report
    }

    /// Derive streaks, points, level and last-played from the history.
    pub fn recompute(&mut self, today: NaiveDate) {
        let solved: BTreeSet<NaiveDate> = self
            .history
            .iter()
            .filter(|(_, r)| r.solved)
            .map(|(d, _)| *d)
            .collect();

        self.streak = streak::current_streak(&solved, today);
        self.longest_streak = streak::longest_streak(&solved);
        self.total_points = self
            .history
            .values()
            .filter(|r| r.solved)
            .map(|r| i64::from(r.score))
            .sum();
        self.level = level_for(self.total_points);
        self.last_played = solved.iter().next_back().copied();
    }

    pub fn solved_on(&self, date: NaiveDate) -> bool {
        self.history.get(&date).is_some_and(|r| r.solved)
    }

    pub fn puzzles_solved(&self) -> usize {
        self.history.values().filter(|r| r.solved).count()
    }
}
