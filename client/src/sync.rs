//! Offline-first score queue and the engine that drains it.
//!
//! Solved days are queued locally, one item per date. When the device is
//! online and logged in, ready items are sent in batches; each item gets its
//! own outcome and failed items back off exponentially with jitter.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use daily_puzzle_core::{
    stats::MergeReport,
    wire::{ScoreSubmission, SubmissionStatus, SyncResponse},
    UserStats,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::ScoreApi,
    error::{ClientError, Result},
    session::Session,
};

/// Extra random delay, as a fraction of the backoff
pub const JITTER_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    pub id: Uuid,
    pub score: i32,
    pub date: NaiveDate,
    pub puzzle_id: String,
    /// Seconds
    pub time_taken: u32,
    pub synced: bool,
    pub attempts: u32,
    pub next_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Given up on; kept for inspection until pruned
    #[serde(default)]
    pub dead: bool,
    pub queued_at: DateTime<Utc>,
}

impl SyncItem {
    fn is_ready(&self, now: DateTime<Utc>) -> bool {
        !self.synced && !self.dead && self.next_attempt_at.map_or(true, |at| at <= now)
    }

    pub fn submission(&self) -> ScoreSubmission {
        ScoreSubmission {
            date: self.date,
            score: self.score,
            puzzle_id: self.puzzle_id.clone(),
            time_taken: self.time_taken,
        }
    }

    fn reset_retry(&mut self) {
        self.attempts = 0;
        self.next_attempt_at = None;
        self.last_error = None;
        self.dead = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Failed attempts before an item is given up on
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(60 * 60),
            max_attempts: 8,
        }
    }
}

impl RetryPolicy {
    /// `base * 2^(attempts-1)` plus up to `JITTER_FRACTION` of that, never above `max_delay`.
    pub fn delay<R: Rng>(&self, attempts: u32, rng: &mut R) -> Duration {
        let exponent = attempts.saturating_sub(1).min(31);
        let backoff = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        let jitter_ms = (backoff.as_millis() as f64 * JITTER_FRACTION) as u64;
        let jitter = Duration::from_millis(rng.random_range(0..=jitter_ms));
        (backoff + jitter).min(self.max_delay)
    }
}

/// What happened to one queued item in a flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Accepted,
    Unchanged,
    Retry(String),
    Rejected(String),
}

impl ItemOutcome {
    pub fn from_status(status: SubmissionStatus, reason: Option<String>) -> Self {
        match status {
            SubmissionStatus::Created | SubmissionStatus::Updated => ItemOutcome::Accepted,
            SubmissionStatus::Unchanged => ItemOutcome::Unchanged,
            SubmissionStatus::Rejected => {
                ItemOutcome::Rejected(reason.unwrap_or_else(|| "rejected".to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncQueue {
    items: Vec<SyncItem>,
}

impl SyncQueue {
    pub fn items(&self) -> &[SyncItem] {
        &self.items
    }

    pub fn get(&self, date: NaiveDate) -> Option<&SyncItem> {
        self.items.iter().find(|i| i.date == date)
    }

    /// Items still waiting to be sent (excludes dead ones)
    pub fn pending(&self) -> usize {
        self.items.iter().filter(|i| !i.synced && !i.dead).count()
    }

    pub fn dead(&self) -> impl Iterator<Item = &SyncItem> {
        self.items.iter().filter(|i| i.dead)
    }

    /// Queue a day's score. A date already queued keeps the higher score; a
    /// better score (or an item not yet delivered) gets a fresh retry budget.
    pub fn enqueue(
        &mut self,
        score: i32,
        date: NaiveDate,
        puzzle_id: &str,
        time_taken: u32,
        now: DateTime<Utc>,
    ) -> &SyncItem {
        let index = match self.items.iter().position(|i| i.date == date) {
            Some(index) => {
                let item = &mut self.items[index];
                if score > item.score {
                    item.score = score;
                    item.puzzle_id = puzzle_id.to_string();
                    item.time_taken = time_taken;
                    item.synced = false;
                    item.queued_at = now;
                    item.reset_retry();
                } else if !item.synced {
                    item.reset_retry();
                }
                index
            }
            None => {
                self.items.push(SyncItem {
                    id: Uuid::new_v4(),
                    score,
                    date,
                    puzzle_id: puzzle_id.to_string(),
                    time_taken,
                    synced: false,
                    attempts: 0,
                    next_attempt_at: None,
                    last_error: None,
                    dead: false,
                    queued_at: now,
                });
                self.items.len() - 1
            }
        };
        &self.items[index]
    }

    /// Up to `max` items due for sending, oldest date first.
    pub fn ready_batch(&self, now: DateTime<Utc>, max: usize) -> Vec<SyncItem> {
        let mut ready: Vec<SyncItem> = self
            .items
            .iter()
            .filter(|i| i.is_ready(now))
            .cloned()
            .collect();
        ready.sort_by_key(|i| (i.date, i.queued_at));
        ready.truncate(max);
        ready
    }

    pub fn apply_results<R: Rng>(
        &mut self,
        results: &[(NaiveDate, ItemOutcome)],
        policy: &RetryPolicy,
        now: DateTime<Utc>,
        rng: &mut R,
    ) {
        for (date, outcome) in results {
            let Some(item) = self.items.iter_mut().find(|i| i.date == *date) else {
                continue;
            };
            match outcome {
                ItemOutcome::Accepted | ItemOutcome::Unchanged => {
                    item.synced = true;
                    item.next_attempt_at = None;
                    item.last_error = None;
                }
                ItemOutcome::Retry(error) => {
                    item.attempts += 1;
                    item.last_error = Some(error.clone());
                    if item.attempts >= policy.max_attempts {
                        item.dead = true;
                        item.next_attempt_at = None;
                        tracing::warn!(date = %item.date, attempts = item.attempts, "giving up on score sync");
                    } else {
                        let delay = policy.delay(item.attempts, rng);
                        item.next_attempt_at = chrono::Duration::from_std(delay)
                            .ok()
                            .map(|d| now + d);
                    }
                }
                ItemOutcome::Rejected(reason) => {
                    item.dead = true;
                    item.last_error = Some(reason.clone());
                    item.next_attempt_at = None;
                    tracing::warn!(date = %item.date, %reason, "score rejected by server");
                }
            }
        }
    }

    /// Drop delivered items. Returns how many were removed.
    pub fn prune_synced(&mut self) -> usize {
        let before = self.items.len();
        self.items.retain(|i| !i.synced);
        before - self.items.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Offline,
    LoggedOut,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub skipped: Option<SkipReason>,
    pub sent: usize,
    pub accepted: usize,
    pub unchanged: usize,
    pub rejected: usize,
    pub retrying: usize,
    /// Result of folding the server ledger into local stats
    pub merged: Option<MergeReport>,
}

impl FlushReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }

    fn count(&mut self, outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Accepted => self.accepted += 1,
            ItemOutcome::Unchanged => self.unchanged += 1,
            ItemOutcome::Retry(_) => self.retrying += 1,
            ItemOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Pair each sent item with its result; items the server did not answer for are retried.
fn match_results(batch: &[SyncItem], response: &SyncResponse) -> Vec<(NaiveDate, ItemOutcome)> {
    batch
        .iter()
        .map(|item| {
            let outcome = response
                .results
                .iter()
                .find(|r| r.date == item.date)
                .map(|r| ItemOutcome::from_status(r.status, r.reason.clone()))
                .unwrap_or_else(|| ItemOutcome::Retry("no result returned for item".to_string()));
            (item.date, outcome)
        })
        .collect()
}

pub struct SyncEngine<A> {
    api: A,
    policy: RetryPolicy,
    batch_size: usize,
}

impl<A: ScoreApi> SyncEngine<A> {
    pub fn new(api: A, policy: RetryPolicy, batch_size: usize) -> Self {
        Self {
            api,
            policy,
            batch_size: batch_size.max(1),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Send everything that is due, then pull the server ledger into `stats`.
    ///
    /// Stats are always recomputed for `today`; beyond that, does nothing
    /// while offline or logged out. A transient failure puts the whole
    /// in-flight batch into retry and ends the flush; any other failure
    /// rejects the batch and ends the flush. An expired session
    /// is returned as `ClientError::Unauthorized` so the caller can clear it.
    pub async fn flush(
        &self,
        queue: &mut SyncQueue,
        stats: &mut UserStats,
        session: Option<&Session>,
        connectivity: Connectivity,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Result<FlushReport> {
        stats.recompute(today);
        if connectivity == Connectivity::Offline {
            return Ok(FlushReport::skipped(SkipReason::Offline));
        }
        let Some(session) = session else {
            return Ok(FlushReport::skipped(SkipReason::LoggedOut));
        };

        let mut report = FlushReport::default();
        let mut transport_failed = false;

        loop {
            let batch = queue.ready_batch(now, self.batch_size);
            if batch.is_empty() {
                break;
            }
            let submissions: Vec<ScoreSubmission> = batch.iter().map(SyncItem::submission).collect();
            report.sent += batch.len();

            let results = match self.api.sync_scores(&session.token, &submissions).await {
                Ok(response) => match_results(&batch, &response),
                Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
                Err(e) if e.is_transient() => {
                    tracing::warn!("Score sync failed, will retry: {}", e);
                    transport_failed = true;
                    batch
                        .iter()
                        .map(|item| (item.date, ItemOutcome::Retry(e.to_string())))
                        .collect()
                }
                Err(e) => {
                    tracing::error!("Score sync refused, dropping batch: {}", e);
                    transport_failed = true;
                    batch
                        .iter()
                        .map(|item| (item.date, ItemOutcome::Rejected(e.to_string())))
                        .collect()
                }
            };

            for (_, outcome) in &results {
                report.count(outcome);
            }
            queue.apply_results(&results, &self.policy, now, &mut rand::rng());

            if transport_failed {
                break;
            }
        }

        if !transport_failed {
            match self.api.fetch_history(&session.token).await {
                Ok(entries) => {
                    let merged = stats.merge_remote(
                        entries.iter().map(|e| (e.date, e.to_day_result())),
                        today,
                    );
                    report.merged = Some(merged);
                }
                Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
                Err(e) => tracing::warn!("Could not fetch score history: {}", e),
            }
        }

        tracing::info!(
            sent = report.sent,
            accepted = report.accepted,
            retrying = report.retrying,
            rejected = report.rejected,
            "sync flush finished"
        );
        Ok(report)
    }
}
