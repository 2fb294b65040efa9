use std::collections::BTreeSet;

use chrono::NaiveDate;
use daily_puzzle_core::{
    streak::StreakTransition,
    wire::{LedgerEntry, LedgerStats, ScoreSubmission},
};
use sqlx::{PgPool, Postgres, Result, Transaction};
use uuid::Uuid;

use crate::{
    ledger::{self, UpsertOutcome},
    models::{
        AllTimeLeaderboardRow, DailyLeaderboardRow, DailyScore, User, UserStatsRow,
        WeeklyLeaderboardRow,
    },
};

/// Rows returned by every leaderboard
pub const LEADERBOARD_SIZE: i64 = 100;

type EntryRow = (NaiveDate, i32, i32, String);

fn to_entry((date, score, time_taken, puzzle_id): EntryRow) -> LedgerEntry {
    LedgerEntry {
        date,
        score,
        time_taken: time_taken.max(0) as u32,
        puzzle_id,
    }
}

// User queries
pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Look a user up by email, creating the user and their stats row on first login.
/// The name is only taken from the first login.
pub async fn find_or_create_user(
    pool: &PgPool,
    email: &str,
    provider: &str,
    name: Option<&str>,
) -> Result<User> {
    let mut tx = pool.begin().await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, provider, name)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email)
        DO UPDATE SET updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(provider)
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("INSERT INTO user_stats (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(user)
}

pub async fn update_user_name(pool: &PgPool, user_id: Uuid, name: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = $1,
            updated_at = NOW()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_user_stats(pool: &PgPool, user_id: Uuid) -> Result<Option<UserStatsRow>> {
    sqlx::query_as::<_, UserStatsRow>("SELECT * FROM user_stats WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

// Score queries

/// What `apply_submissions` did, per submission and overall
#[derive(Debug)]
pub struct Applied {
    pub outcomes: Vec<UpsertOutcome>,
    pub transitions: Vec<StreakTransition>,
    pub stats: LedgerStats,
}

/// Upsert already-validated submissions for one user and recompute their
/// aggregates, all in one transaction. The user row is locked so concurrent
/// syncs from two devices serialize.
pub async fn apply_submissions(
    pool: &PgPool,
    user_id: Uuid,
    submissions: &[ScoreSubmission],
    today: NaiveDate,
) -> Result<Applied> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

    let days: BTreeSet<NaiveDate> =
        sqlx::query_scalar("SELECT date FROM daily_scores WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .collect();
    let transitions = ledger::transitions(days, submissions);

    let mut outcomes = Vec::with_capacity(submissions.len());
    for submission in submissions {
        outcomes.push(upsert_score(&mut tx, user_id, submission).await?);
    }

    let entries = sqlx::query_as::<_, EntryRow>(
        "SELECT date, score, time_taken, puzzle_id FROM daily_scores WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .map(to_entry)
    .collect::<Vec<_>>();

    let stats = ledger::summarize(&entries, today);
    write_stats(&mut tx, user_id, &stats).await?;

    tx.commit().await?;

    tracing::debug!(
        "Applied {} submissions for user {} (streak {}, points {})",
        submissions.len(),
        user_id,
        stats.streak,
        stats.total_points
    );

    Ok(Applied {
        outcomes,
        transitions,
        stats,
    })
}

async fn upsert_score(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    submission: &ScoreSubmission,
) -> Result<UpsertOutcome> {
    let existing: Option<i32> =
        sqlx::query_scalar("SELECT score FROM daily_scores WHERE user_id = $1 AND date = $2")
            .bind(user_id)
            .bind(submission.date)
            .fetch_optional(&mut **tx)
            .await?;

    let outcome = ledger::decide(existing, submission.score);
    let time_taken = i32::try_from(submission.time_taken).unwrap_or(i32::MAX);

    match outcome {
        UpsertOutcome::Created => {
            sqlx::query(
                r#"
                INSERT INTO daily_scores (id, user_id, date, puzzle_id, score, time_taken)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(submission.date)
            .bind(&submission.puzzle_id)
            .bind(submission.score)
            .bind(time_taken)
            .execute(&mut **tx)
            .await?;
        }
        UpsertOutcome::Updated => {
            sqlx::query(
                r#"
                UPDATE daily_scores
                SET puzzle_id = $3,
                    score = $4,
                    time_taken = $5,
                    updated_at = NOW()
                WHERE user_id = $1 AND date = $2
                "#,
            )
            .bind(user_id)
            .bind(submission.date)
            .bind(&submission.puzzle_id)
            .bind(submission.score)
            .bind(time_taken)
            .execute(&mut **tx)
            .await?;
        }
        UpsertOutcome::Unchanged => {}
    }

    Ok(outcome)
}

async fn write_stats(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    stats: &LedgerStats,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET streak_count = $1,
            longest_streak = $2,
            total_points = $3,
            last_played = $4,
            updated_at = NOW()
        WHERE id = $5
        "#,
    )
    .bind(stats.streak as i32)
    .bind(stats.longest_streak as i32)
    .bind(stats.total_points)
    .bind(stats.last_played)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO user_stats (user_id, puzzles_solved, avg_solve_time)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id)
        DO UPDATE SET
            puzzles_solved = $2,
            avg_solve_time = $3,
            updated_at = NOW()
        "#,
    )
    .bind(user_id)
    .bind(stats.puzzles_solved as i32)
    .bind(stats.avg_solve_time)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// One page of a user's scores, newest first, plus the total count.
pub async fn score_history(
    pool: &PgPool,
    user_id: Uuid,
    page: i64,
    limit: i64,
) -> Result<(Vec<DailyScore>, i64)> {
    let scores = sqlx::query_as::<_, DailyScore>(
        r#"
        SELECT * FROM daily_scores
        WHERE user_id = $1
        ORDER BY date DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind((page - 1) * limit)
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_scores WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((scores, total))
}

/// Every stored score for a user, oldest first.
pub async fn ledger_entries(pool: &PgPool, user_id: Uuid) -> Result<Vec<LedgerEntry>> {
    let rows = sqlx::query_as::<_, EntryRow>(
        r#"
        SELECT date, score, time_taken, puzzle_id
        FROM daily_scores
        WHERE user_id = $1
        ORDER BY date ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(to_entry).collect())
}

// Leaderboard queries
pub async fn daily_leaderboard(pool: &PgPool, date: NaiveDate) -> Result<Vec<DailyLeaderboardRow>> {
    sqlx::query_as::<_, DailyLeaderboardRow>(
        r#"
        SELECT s.user_id, u.name, s.score, s.time_taken, s.puzzle_id
        FROM daily_scores s
        JOIN users u ON u.id = s.user_id
        WHERE s.date = $1
        ORDER BY s.score DESC, s.time_taken ASC
        LIMIT $2
        "#,
    )
    .bind(date)
    .bind(LEADERBOARD_SIZE)
    .fetch_all(pool)
    .await
}

/// Totals for scores dated in `[week_start, week_end)`
pub async fn weekly_leaderboard(
    pool: &PgPool,
    week_start: NaiveDate,
    week_end: NaiveDate,
) -> Result<Vec<WeeklyLeaderboardRow>> {
    sqlx::query_as::<_, WeeklyLeaderboardRow>(
        r#"
        SELECT s.user_id, u.name,
               SUM(s.score)::BIGINT AS total_score,
               COUNT(*) AS days_played
        FROM daily_scores s
        JOIN users u ON u.id = s.user_id
        WHERE s.date >= $1 AND s.date < $2
        GROUP BY s.user_id, u.name
        ORDER BY total_score DESC
        LIMIT $3
        "#,
    )
    .bind(week_start)
    .bind(week_end)
    .bind(LEADERBOARD_SIZE)
    .fetch_all(pool)
    .await
}

pub async fn all_time_leaderboard(pool: &PgPool) -> Result<Vec<AllTimeLeaderboardRow>> {
    sqlx::query_as::<_, AllTimeLeaderboardRow>(
        r#"
        SELECT id AS user_id, name, total_points, streak_count
        FROM users
        ORDER BY total_points DESC
        LIMIT $1
        "#,
    )
    .bind(LEADERBOARD_SIZE)
    .fetch_all(pool)
    .await
}
