use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use daily_puzzle_core::{
    wire::{
        LedgerStats, ScoreSubmission, SubmissionResult, SubmissionStatus, SyncRequest,
        SyncResponse,
    },
    streak::StreakTransition,
    PuzzleGenerator,
};
use serde::{Deserialize, Serialize};

use crate::{auth::AuthenticatedUser, db, error::ApiError, ledger, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub score: i32,
    pub time_taken: u32,
    pub puzzle_id: String,
    /// Defaults to the server's today
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub status: SubmissionStatus,
    /// Effect of this submission on the streak
    pub transition: StreakTransition,
    pub streak: u32,
    pub stats: LedgerStats,
}

/// Split a batch into rejections (by index) and submissions worth writing.
pub fn screen(
    submissions: Vec<ScoreSubmission>,
    today: NaiveDate,
    backfill_days: i64,
    generator: &PuzzleGenerator,
) -> (Vec<(usize, SubmissionResult)>, Vec<(usize, ScoreSubmission)>) {
    let mut rejected = Vec::new();
    let mut accepted = Vec::new();
    for (index, submission) in submissions.into_iter().enumerate() {
        match ledger::validate_submission(&submission, today, backfill_days, generator) {
            Ok(()) => accepted.push((index, submission)),
            Err(reason) => {
                tracing::debug!("Rejected score for {}: {}", submission.date, reason);
                rejected.push((
                    index,
                    SubmissionResult {
                        date: submission.date,
                        status: SubmissionStatus::Rejected,
                        reason: Some(reason),
                    },
                ))
            }
        }
    }
    (rejected, accepted)
}

/// Submit a single day's score
pub async fn submit_score(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let today = super::today();
    let submission = ScoreSubmission {
        date: payload.date.unwrap_or(today),
        score: payload.score,
        puzzle_id: payload.puzzle_id,
        time_taken: payload.time_taken,
    };

    ledger::validate_submission(
        &submission,
        today,
        state.config.puzzle.backfill_days,
        &state.generator,
    )
    .map_err(ApiError::BadRequest)?;

    let applied =
        db::queries::apply_submissions(&state.db, user.user_id, &[submission], today).await?;
    let (status, transition) = applied
        .outcomes
        .first()
        .zip(applied.transitions.first())
        .map(|(outcome, transition)| (SubmissionStatus::from(*outcome), *transition))
        .ok_or_else(|| ApiError::Internal("Score submission failed".to_string()))?;

    tracing::info!(
        "Score submitted by {} ({:?}, streak {:?})",
        user.user_id,
        status,
        transition
    );

    Ok(Json(SubmitResponse {
        success: true,
        status,
        transition,
        streak: applied.stats.streak,
        stats: applied.stats,
    }))
}

/// Upload a batch of queued offline scores. Every item gets its own result.
pub async fn sync_scores(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<SyncRequest>,
) -> Result<Json<SyncResponse>, ApiError> {
    let max_batch = state.config.puzzle.max_sync_batch;
    if payload.scores.len() > max_batch {
        return Err(ApiError::BadRequest(format!(
            "At most {} scores per sync",
            max_batch
        )));
    }

    let today = super::today();
    let total = payload.scores.len();
    let (rejected, accepted) = screen(
        payload.scores,
        today,
        state.config.puzzle.backfill_days,
        &state.generator,
    );

    let writes: Vec<ScoreSubmission> = accepted.iter().map(|(_, s)| s.clone()).collect();
    let applied = db::queries::apply_submissions(&state.db, user.user_id, &writes, today).await?;

    let mut results: Vec<Option<SubmissionResult>> = vec![None; total];
    for (index, result) in rejected {
        results[index] = Some(result);
    }
    for ((index, submission), outcome) in accepted.into_iter().zip(applied.outcomes) {
        results[index] = Some(SubmissionResult {
            date: submission.date,
            status: outcome.into(),
            reason: None,
        });
    }

    tracing::info!(
        "Synced {} scores for {} ({} written)",
        total,
        user.user_id,
        writes.len()
    );

    Ok(Json(SyncResponse {
        results: results.into_iter().flatten().collect(),
        stats: applied.stats,
    }))
}
