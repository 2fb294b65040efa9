use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    /// Login provider reported by the client (e.g. "google")
    pub provider: String,
    pub streak_count: i32,
    pub longest_streak: i32,
    pub total_points: i64,
    pub last_played: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsRow {
    pub user_id: Uuid,
    pub puzzles_solved: i32,
    /// Seconds
    pub avg_solve_time: f64,
    pub updated_at: DateTime<Utc>,
}

/// `GET /api/user/profile` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub level: u32,
    pub stats: Option<UserStatsRow>,
}

impl User {
    /// Get the best display name for this user
    /// Priority: name > email
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}
