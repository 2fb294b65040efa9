//! JSON bodies exchanged between the score API and its clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    puzzle::{parse_puzzle_id, Difficulty, PuzzleKind},
    stats::DayResult,
};

/// One day's score as sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub date: NaiveDate,
    pub score: i32,
    pub puzzle_id: String,
    /// Seconds
    pub time_taken: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub scores: Vec<ScoreSubmission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// First score for the date
    Created,
    /// Replaced a lower score
    Updated,
    /// An equal or better score was already stored
    Unchanged,
    /// Refused; resending will not help
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub date: NaiveDate,
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Aggregates recomputed from a user's whole ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub streak: u32,
    pub longest_streak: u32,
    pub total_points: i64,
    pub level: u32,
    pub puzzles_solved: u32,
    /// Seconds
    pub avg_solve_time: f64,
    pub last_played: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub results: Vec<SubmissionResult>,
    pub stats: LedgerStats,
}

/// A stored score as returned by the history and heatmap endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub score: i32,
    pub time_taken: u32,
    pub puzzle_id: String,
}

impl LedgerEntry {
    pub fn kind_and_difficulty(&self) -> (PuzzleKind, Difficulty) {
        parse_puzzle_id(&self.puzzle_id)
            .map(|(_, kind, difficulty)| (kind, difficulty))
            .unwrap_or_default()
    }

    /// Stored scores are always solves.
    pub fn to_day_result(&self) -> DayResult {
        let (kind, difficulty) = self.kind_and_difficulty();
        DayResult {
            solved: true,
            score: self.score,
            difficulty,
            kind,
            puzzle_id: self.puzzle_id.clone(),
            time_taken: self.time_taken,
            hints_used: 0,
        }
    }
}

impl From<(NaiveDate, &DayResult)> for ScoreSubmission {
    fn from((date, result): (NaiveDate, &DayResult)) -> Self {
        Self {
            date,
            score: result.score,
            puzzle_id: result.puzzle_id.clone(),
            time_taken: result.time_taken,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submission_uses_camel_case() {
        let submission = ScoreSubmission {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            score: 870,
            puzzle_id: "42-sudoku-easy".to_string(),
            time_taken: 13,
        };
        assert_eq!(
            serde_json::to_value(&submission).unwrap(),
            json!({"date": "2024-06-01", "score": 870, "puzzleId": "42-sudoku-easy", "timeTaken": 13})
        );
    }

    #[test]
    fn test_result_omits_missing_reason() {
        let result = SubmissionResult {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            status: SubmissionStatus::Unchanged,
            reason: None,
        };
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"date": "2024-06-01", "status": "unchanged"})
        );
    }

    #[test]
    fn test_entry_to_day_result() {
        let entry = LedgerEntry {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            score: 640,
            time_taken: 36,
            puzzle_id: "9-lights-out-hard".to_string(),
        };
        let result = entry.to_day_result();
        assert!(result.solved);
        assert_eq!(result.kind, PuzzleKind::LightsOut);
        assert_eq!(result.difficulty, Difficulty::Hard);

        let unknown = LedgerEntry {
            puzzle_id: "garbage".to_string(),
            ..entry
        };
        assert_eq!(
            unknown.kind_and_difficulty(),
            (PuzzleKind::Binary, Difficulty::Easy)
        );
    }
}
