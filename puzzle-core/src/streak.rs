//! Streak arithmetic over calendar dates.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Consecutive solved days ending today, or ending yesterday when today is
/// not solved yet (the streak is still alive until the day is over).
pub fn current_streak(solved: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut day = today;
    if !solved.contains(&day) {
        day -= Duration::days(1);
    }
    let mut streak = 0;
    while solved.contains(&day) {
        streak += 1;
        day -= Duration::days(1);
    }
    streak
}

pub fn longest_streak(solved: &BTreeSet<NaiveDate>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for &day in solved {
        run = match prev {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

/// What a new submission on `today` does to a streak last extended on `last_played`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    First,
    AlreadyPlayed,
    Increment,
    Reset,
}

impl StreakTransition {
    pub fn between(last_played: Option<NaiveDate>, today: NaiveDate) -> Self {
        match last_played {
            None => StreakTransition::First,
            Some(last) if last == today => StreakTransition::AlreadyPlayed,
            Some(last) if last + Duration::days(1) == today => StreakTransition::Increment,
            Some(_) => StreakTransition::Reset,
        }
    }

    /// Streak after applying this transition to `current`.
    pub fn apply(self, current: u32) -> u32 {
        match self {
            StreakTransition::First | StreakTransition::Reset => 1,
            StreakTransition::AlreadyPlayed => current,
            StreakTransition::Increment => current + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DATE_FORMAT;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn dates(list: &[&str]) -> BTreeSet<NaiveDate> {
        list.iter().map(|s| date(s)).collect()
    }

    #[test]
    fn test_empty_history_has_no_streak() {
        assert_eq!(current_streak(&BTreeSet::new(), date("2024-03-10")), 0);
    }

    #[test]
    fn test_streak_including_today() {
        let solved = dates(&["2024-03-08", "2024-03-09", "2024-03-10"]);
        assert_eq!(current_streak(&solved, date("2024-03-10")), 3);
    }

    #[test]
    fn test_streak_alive_from_yesterday() {
        let solved = dates(&["2024-03-08", "2024-03-09"]);
        assert_eq!(current_streak(&solved, date("2024-03-10")), 2);
    }

    #[test]
    fn test_gap_breaks_streak() {
        let solved = dates(&["2024-03-05", "2024-03-06", "2024-03-08"]);
        assert_eq!(current_streak(&solved, date("2024-03-10")), 0);
        assert_eq!(current_streak(&solved, date("2024-03-08")), 1);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let solved = dates(&["2024-02-28", "2024-02-29", "2024-03-01"]);
        assert_eq!(current_streak(&solved, date("2024-03-01")), 3);
    }

    #[test]
    fn test_longest_streak() {
        let solved = dates(&[
            "2024-01-01",
            "2024-01-02",
            "2024-01-03",
            "2024-01-05",
            "2024-01-06",
        ]);
        assert_eq!(longest_streak(&solved), 3);
        assert_eq!(longest_streak(&BTreeSet::new()), 0);
    }

    #[test]
    fn test_transitions() {
        let today = date("2024-03-10");
        assert_eq!(StreakTransition::between(None, today), StreakTransition::First);
        assert_eq!(
            StreakTransition::between(Some(today), today),
            StreakTransition::AlreadyPlayed
        );
        assert_eq!(
            StreakTransition::between(Some(date("2024-03-09")), today),
            StreakTransition::Increment
        );
        assert_eq!(
            StreakTransition::between(Some(date("2024-03-01")), today),
            StreakTransition::Reset
        );
        assert_eq!(StreakTransition::Increment.apply(4), 5);
        assert_eq!(StreakTransition::Reset.apply(4), 1);
        assert_eq!(StreakTransition::AlreadyPlayed.apply(4), 4);
    }
}
