use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;

use crate::{
    db,
    error::ApiError,
    models::{AllTimeLeaderboardRow, DailyLeaderboardRow, WeeklyLeaderboardRow},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<NaiveDate>,
}

/// Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// The Sunday-to-Saturday week holding `date`, end exclusive
pub fn week_range(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = week_start(date);
    (start, start + Duration::days(7))
}

pub async fn daily(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<Vec<DailyLeaderboardRow>>, ApiError> {
    let date = query.date.unwrap_or_else(super::today);
    Ok(Json(db::queries::daily_leaderboard(&state.db, date).await?))
}

pub async fn weekly(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WeeklyLeaderboardRow>>, ApiError> {
    let (start, end) = week_range(super::today());
    Ok(Json(db::queries::weekly_leaderboard(&state.db, start, end).await?))
}

pub async fn all_time(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AllTimeLeaderboardRow>>, ApiError> {
    Ok(Json(db::queries::all_time_leaderboard(&state.db).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_starts_on_sunday() {
        // 2024-06-12 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 9).unwrap();
        assert_eq!(week_start(wednesday), sunday);
        assert_eq!(week_start(sunday), sunday);
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(week_start(saturday), sunday);
    }

    #[test]
    fn test_week_range_excludes_next_sunday() {
        let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let (start, end) = week_range(saturday);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 6, 9).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());

        // A score dated tomorrow (allowed timezone slack) belongs to next week
        let tomorrow = saturday + Duration::days(crate::ledger::FUTURE_SLACK_DAYS);
        assert!(tomorrow >= end);
        assert_eq!(week_range(tomorrow).0, end);
    }
}
