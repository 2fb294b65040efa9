use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyScore {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub puzzle_id: String,
    pub score: i32,
    /// Seconds
    pub time_taken: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `/api/leaderboard/daily`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyLeaderboardRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub score: i32,
    pub time_taken: i32,
    pub puzzle_id: String,
}

/// A row of `/api/leaderboard/weekly`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyLeaderboardRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub total_score: i64,
    pub days_played: i64,
}

/// A row of `/api/leaderboard/all-time`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AllTimeLeaderboardRow {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub total_points: i64,
    pub streak_count: i32,
}
