use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use daily_puzzle_core::{scoring, stats::level_for, wire::LedgerStats};
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthenticatedUser,
    db,
    error::ApiError,
    ledger,
    models::{DailyScore, User, UserProfile},
    routes::auth::MAX_NAME_LEN,
    AppState,
};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl HistoryQuery {
    /// 1-based page and a page size clamped to `1..=MAX_PAGE_SIZE`
    pub fn resolve(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        Self {
            total,
            page,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub data: Vec<DailyScore>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub score: i32,
    pub time_taken: u32,
    pub puzzle_id: String,
    /// 0..=4
    pub intensity: u8,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
}

pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<UserProfile>, ApiError> {
    let record = db::queries::get_user(&state.db, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let stats = db::queries::get_user_stats(&state.db, user.user_id).await?;

    Ok(Json(UserProfile {
        level: level_for(record.total_points),
        user: record,
        stats,
    }))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Name is required".to_string()))?;
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::BadRequest(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }

    let updated = db::queries::update_user_name(&state.db, user.user_id, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(updated))
}

pub async fn score_history(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let (page, limit) = query.resolve();
    let (data, total) = db::queries::score_history(&state.db, user.user_id, page, limit).await?;
    Ok(Json(HistoryResponse {
        data,
        pagination: Pagination::new(total, page, limit),
    }))
}

pub async fn heatmap(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<HeatmapDay>>, ApiError> {
    let entries = db::queries::ledger_entries(&state.db, user.user_id).await?;
    let days = entries
        .into_iter()
        .map(|entry| HeatmapDay {
            intensity: scoring::intensity(Some(&entry.to_day_result())),
            date: entry.date,
            score: entry.score,
            time_taken: entry.time_taken,
            puzzle_id: entry.puzzle_id,
        })
        .collect();
    Ok(Json(days))
}

/// Streak, points and level recomputed from the stored scores
pub async fn stats(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<LedgerStats>, ApiError> {
    let entries = db::queries::ledger_entries(&state.db, user.user_id).await?;
    Ok(Json(ledger::summarize(&entries, super::today())))
}
