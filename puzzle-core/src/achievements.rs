use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    puzzle::Difficulty,
    stats::{DayResult, UserStats},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstSolve,
    Streak3,
    Streak7,
    Streak30,
    Points1k,
    Points10k,
    NoHints,
    SpeedDemon,
    HardSolver,
}

pub struct AchievementInfo {
    pub title: &'static str,
    pub description: &'static str,
}

/// Solves under this many seconds unlock `SpeedDemon`
pub const SPEED_DEMON_SECONDS: u32 = 60;

pub static CATALOG: Lazy<HashMap<Achievement, AchievementInfo>> = Lazy::new(|| {
    let mut map = HashMap::new();
    let mut add = |a: Achievement, title: &'static str, description: &'static str| {
        map.insert(a, AchievementInfo { title, description });
    };

    add(Achievement::FirstSolve, "First Steps", "Solve your first daily puzzle");
    add(Achievement::Streak3, "On a Roll", "Solve 3 days in a row");
    add(Achievement::Streak7, "Week Warrior", "Solve 7 days in a row");
    add(Achievement::Streak30, "Unstoppable", "Solve 30 days in a row");
    add(Achievement::Points1k, "Point Collector", "Earn 1,000 points");
    add(Achievement::Points10k, "Point Hoarder", "Earn 10,000 points");
    add(Achievement::NoHints, "Purist", "Solve a puzzle without hints");
    add(Achievement::SpeedDemon, "Speed Demon", "Solve a puzzle in under a minute");
    add(Achievement::HardSolver, "Hardened", "Solve a hard puzzle");

    map
});

impl Achievement {
    pub fn info(&self) -> &'static AchievementInfo {
        // every variant is registered above
        &CATALOG[self]
    }
}

/// Everything `stats` qualifies for, given the result that was just recorded.
pub fn qualified(stats: &UserStats, latest: &DayResult) -> Vec<Achievement> {
    let mut earned = Vec::new();
    let solved_days = stats.history.values().filter(|r| r.solved).count();

    if solved_days >= 1 {
        earned.push(Achievement::FirstSolve);
    }
    for (days, achievement) in [
        (3, Achievement::Streak3),
        (7, Achievement::Streak7),
        (30, Achievement::Streak30),
    ] {
        if stats.longest_streak >= days {
            earned.push(achievement);
        }
    }
    if stats.total_points >= 1_000 {
        earned.push(Achievement::Points1k);
    }
    if stats.total_points >= 10_000 {
        earned.push(Achievement::Points10k);
    }
    if latest.solved {
        if latest.hints_used == 0 {
            earned.push(Achievement::NoHints);
        }
        if latest.time_taken < SPEED_DEMON_SECONDS {
            earned.push(Achievement::SpeedDemon);
        }
        if latest.difficulty == Difficulty::Hard {
            earned.push(Achievement::HardSolver);
        }
    }
    earned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_achievement_has_info() {
        for a in [
            Achievement::FirstSolve,
            Achievement::Streak3,
            Achievement::Streak7,
            Achievement::Streak30,
            Achievement::Points1k,
            Achievement::Points10k,
            Achievement::NoHints,
            Achievement::SpeedDemon,
            Achievement::HardSolver,
        ] {
            assert!(!a.info().title.is_empty());
        }
        assert_eq!(CATALOG.len(), 9);
    }

    #[test]
    fn test_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&Achievement::SpeedDemon).unwrap(),
            "\"speed_demon\""
        );
    }
}
