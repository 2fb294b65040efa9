//! Today's puzzle (and practice puzzles), wired to local storage and the sync queue.

use chrono::{DateTime, NaiveDate, Utc};
use daily_puzzle_core::{
    achievements::Achievement,
    game::FlipOutcome,
    CoreError, DayResult, Difficulty, GameState, PuzzleGenerator, PuzzleKind, UserStats, Verdict,
};
use rand::Rng;

use crate::{
    api::ScoreApi,
    config::ClientConfig,
    encryption::SessionCipher,
    error::{ClientError, Result},
    session::{Session, SessionStore},
    store::{self, JsonStore},
    sync::{Connectivity, FlushReport, SyncEngine, SyncQueue},
};

/// Side effects of finishing a game
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub date: NaiveDate,
    pub result: DayResult,
    pub unlocked: Vec<Achievement>,
    /// `None` when the flush failed; the score stays queued
    pub flush: Option<FlushReport>,
}

pub struct DailyClient<A> {
    store: JsonStore,
    sessions: SessionStore,
    session: Option<Session>,
    generator: PuzzleGenerator,
    engine: SyncEngine<A>,
    game: Option<GameState>,
    stats: UserStats,
    queue: SyncQueue,
    connectivity: Connectivity,
    completion: Option<Completion>,
}

impl<A: ScoreApi> DailyClient<A> {
    pub async fn open(config: &ClientConfig, api: A, today: NaiveDate) -> Result<Self> {
        let store = JsonStore::open(&config.data_dir).await?;
        let cipher = config
            .session_key
            .as_deref()
            .map(SessionCipher::from_base64_key)
            .transpose()?;
        let engine = SyncEngine::new(api, config.retry_policy(), config.sync.batch_size);
        Self::new(store, cipher, config.generator(), engine, today).await
    }

    /// Load stats, the sync queue and any saved session from `store`. Stats
    /// are recomputed for `today`, so a streak broken while the app was
    /// closed reads as broken.
    pub async fn new(
        store: JsonStore,
        cipher: Option<SessionCipher>,
        generator: PuzzleGenerator,
        engine: SyncEngine<A>,
        today: NaiveDate,
    ) -> Result<Self> {
        let sessions = SessionStore::new(store.clone(), cipher);
        let session = sessions.load().await?;
        let mut stats = store
            .get_or_discard::<UserStats>(store::STATS)
            .await?
            .unwrap_or_default();
        stats.recompute(today);
        let queue = store
            .get_or_discard::<SyncQueue>(store::SYNC_QUEUE)
            .await?
            .unwrap_or_default();
        tracing::debug!(
            dir = %store.dir().display(),
            logged_in = session.is_some(),
            pending = queue.pending(),
            "client state loaded"
        );

        Ok(Self {
            store,
            sessions,
            session,
            generator,
            engine,
            game: None,
            stats,
            queue,
            connectivity: Connectivity::Online,
            completion: None,
        })
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn queue(&self) -> &SyncQueue {
        &self.queue
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        self.connectivity = connectivity;
    }

    /// The completion produced by the last mutation that finished the game.
    pub fn take_completion(&mut self) -> Option<Completion> {
        self.completion.take()
    }

    pub async fn login(&mut self, email: &str, provider: &str, name: Option<&str>) -> Result<&Session> {
        let session = self.engine.api().login(email, provider, name).await?;
        self.sessions.save(&session).await?;
        Ok(self.session.insert(session))
    }

    pub async fn logout(&mut self) -> Result<()> {
        self.session = None;
        self.sessions.clear().await
    }

    /// Open today's puzzle of `kind`. A saved game for the same puzzle and
    /// date is resumed; anything else is replaced by a fresh game.
    pub async fn open_today(
        &mut self,
        kind: PuzzleKind,
        difficulty: Difficulty,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<&GameState> {
        self.stats.recompute(today);
        let puzzle = self.generator.daily(today, kind, difficulty);
        let saved = self.saved_game(today).await?;

        let mut game = match saved {
            Some(game) if game.puzzle.id == puzzle.id => game,
            _ => {
                tracing::info!(puzzle_id = %puzzle.id, "starting new puzzle");
                GameState::load(puzzle)
            }
        };
        if !game.is_finished() {
            game.resume(now)?;
        }
        self.game = Some(game);
        self.save_game(now).await?;
        self.game.as_ref().ok_or(ClientError::NoActiveGame)
    }

    /// Resume whatever puzzle was saved for `today`, if any.
    pub async fn restore_today(&mut self, today: NaiveDate, now: DateTime<Utc>) -> Result<Option<&GameState>> {
        let Some(mut game) = self.saved_game(today).await? else {
            return Ok(None);
        };
        if !game.is_finished() {
            game.resume(now)?;
        }
        self.game = Some(game);
        Ok(self.game.as_ref())
    }

    /// Start an off-calendar puzzle. Without a seed one is drawn at random.
    /// Practice games are saved separately and never touch stats or the queue.
    pub async fn open_practice(
        &mut self,
        kind: PuzzleKind,
        difficulty: Difficulty,
        seed: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<&GameState> {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        let mut game = GameState::load(self.generator.practice(seed, kind, difficulty));
        game.resume(now)?;
        tracing::info!(puzzle_id = %game.puzzle.id, "starting practice puzzle");
        self.game = Some(game);
        self.save_game(now).await?;
        self.game.as_ref().ok_or(ClientError::NoActiveGame)
    }

    pub async fn restore_practice(&mut self, now: DateTime<Utc>) -> Result<Option<&GameState>> {
        let Some(mut game) = self
            .store
            .get_or_discard::<GameState>(store::PRACTICE)
            .await?
        else {
            return Ok(None);
        };
        if !game.is_finished() {
            game.resume(now)?;
        }
        self.game = Some(game);
        Ok(self.game.as_ref())
    }

    async fn saved_game(&self, today: NaiveDate) -> Result<Option<GameState>> {
        let saved = self
            .store
            .get_or_discard::<GameState>(store::TODAY)
            .await?;
        Ok(saved.filter(|game| game.puzzle.date == Some(today)))
    }

    async fn save_game(&self, now: DateTime<Utc>) -> Result<()> {
        let Some(game) = &self.game else {
            return Ok(());
        };
        let key = match game.puzzle.date {
            Some(_) => store::TODAY,
            None => store::PRACTICE,
        };
        self.store.put(key, &game.snapshot(now)).await
    }

    /// Apply `action` to the open game, autosave, and run the completion
    /// side effects when the game just finished (even if `action` failed
    /// because the clock ran out).
    async fn mutate<T>(
        &mut self,
        now: DateTime<Utc>,
        action: impl FnOnce(&mut GameState, DateTime<Utc>) -> std::result::Result<T, CoreError>,
    ) -> Result<T> {
        let game = self.game.as_mut().ok_or(ClientError::NoActiveGame)?;
        let was_finished = game.is_finished();
        let outcome = action(game, now);
        let finished = !was_finished && game.is_finished();

        self.save_game(now).await?;
        if finished {
            self.complete(now).await?;
        }
        Ok(outcome?)
    }

    pub async fn set_cell(&mut self, row: usize, col: usize, value: Option<u8>, now: DateTime<Utc>) -> Result<()> {
        self.mutate(now, |game, now| game.set_cell(row, col, value, now))
            .await
    }

    pub async fn press(&mut self, row: usize, col: usize, now: DateTime<Utc>) -> Result<()> {
        self.mutate(now, |game, now| game.press(row, col, now)).await
    }

    pub async fn flip(&mut self, row: usize, col: usize, now: DateTime<Utc>) -> Result<FlipOutcome> {
        self.mutate(now, |game, now| game.flip(row, col, now)).await
    }

    pub async fn hint(&mut self, now: DateTime<Utc>) -> Result<(usize, usize)> {
        self.mutate(now, |game, now| game.hint(now)).await
    }

    pub async fn check(&mut self, now: DateTime<Utc>) -> Result<Verdict> {
        self.mutate(now, |game, now| game.check(now)).await
    }

    pub async fn give_up(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.mutate(now, |game, now| game.give_up(now)).await
    }

    pub async fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.mutate(now, |game, now| game.pause(now)).await
    }

    pub async fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.mutate(now, |game, now| game.resume(now)).await
    }

    /// Enforce the time limit on the open game.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.mutate(now, |game, now| Ok(game.tick(now))).await?;
        Ok(())
    }

    /// Record the finished game, queue a solve for upload, persist, and try to sync.
    async fn complete(&mut self, now: DateTime<Utc>) -> Result<()> {
        let Some(game) = &self.game else {
            return Ok(());
        };
        let (Some(result), Some(date)) = (game.result(), game.puzzle.date) else {
            return Ok(());
        };

        let unlocked = self.stats.record(date, result.clone(), date);
        if result.solved {
            self.queue
                .enqueue(result.score, date, &result.puzzle_id, result.time_taken, now);
        }
        self.persist().await?;
        tracing::info!(
            %date,
            solved = result.solved,
            score = result.score,
            streak = self.stats.streak,
            "daily puzzle finished"
        );

        let flush = match self.flush(now, date).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!("Sync after completion failed: {}", e);
                None
            }
        };

        self.completion = Some(Completion {
            date,
            result,
            unlocked,
            flush,
        });
        Ok(())
    }

    /// Drain the sync queue. An expired session is cleared before the error
    /// is returned.
    pub async fn flush(&mut self, now: DateTime<Utc>, today: NaiveDate) -> Result<FlushReport> {
        let outcome = self
            .engine
            .flush(
                &mut self.queue,
                &mut self.stats,
                self.session.as_ref(),
                self.connectivity,
                now,
                today,
            )
            .await;

        if matches!(outcome, Err(ClientError::Unauthorized)) {
            tracing::warn!("Session rejected by server, logging out");
            self.logout().await?;
        }
        let report = outcome?;

        self.queue.prune_synced();
        self.persist().await?;
        Ok(report)
    }

    async fn persist(&self) -> Result<()> {
        self.store.put(store::STATS, &self.stats).await?;
        self.store.put(store::SYNC_QUEUE, &self.queue).await
    }
}
