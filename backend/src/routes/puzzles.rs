use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Duration, NaiveDate};
use daily_puzzle_core::{puzzle::PuzzleView, Difficulty, PuzzleKind};
use serde::Deserialize;

use crate::{error::ApiError, ledger::FUTURE_SLACK_DAYS, AppState};

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub kind: Option<String>,
    pub difficulty: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Today's puzzle (or a past day's) without its solution
pub async fn daily_puzzle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DailyQuery>,
) -> Result<Json<PuzzleView>, ApiError> {
    let today = super::today();
    let date = query.date.unwrap_or(today);
    if date > today + Duration::days(FUTURE_SLACK_DAYS) {
        return Err(ApiError::BadRequest(
            "Puzzles are not published ahead of time".to_string(),
        ));
    }

    let kind = match query.kind.as_deref() {
        Some(kind) => kind.parse::<PuzzleKind>().map_err(ApiError::BadRequest)?,
        None => PuzzleKind::default(),
    };
    let difficulty = query
        .difficulty
        .as_deref()
        .map(|d| d.parse::<Difficulty>().unwrap_or_default())
        .unwrap_or_default();

    let puzzle = state.generator.daily(date, kind, difficulty);
    Ok(Json(puzzle.view()))
}
