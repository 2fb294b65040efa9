//! Client-side puzzle state machine.
//!
//! `Loaded -> InProgress <-> Paused -> Solved | Failed`. The clock only runs
//! while `InProgress`; every method that can move the clock takes `now` so
//! the machine stays deterministic under test.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    puzzle::{Board, Difficulty, Puzzle, PuzzleKind, Verdict},
    scoring,
    stats::DayResult,
    CoreError,
};

pub const MAX_HINTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Loaded,
    InProgress,
    Paused,
    Solved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStatus {
    Given,
    Empty,
    Filled,
    Hinted,
    Conflict,
    /// Pairs: face up, waiting for its partner
    Open,
    /// Pairs: matched and locked
    Matched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    Opened,
    Matched,
    Mismatched,
    AlreadyRevealed,
}

/// Games running longer than this fail.
pub fn time_limit(difficulty: Difficulty) -> Duration {
    match difficulty {
        Difficulty::Easy => Duration::minutes(10),
        Difficulty::Medium => Duration::minutes(15),
        Difficulty::Hard => Duration::minutes(20),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub puzzle: Puzzle,
    pub board: Board,
    pub cell_status: Vec<Vec<CellStatus>>,
    pub status: GameStatus,
    /// Clock time banked before the current running stretch
    pub elapsed_ms: u64,
    running_since: Option<DateTime<Utc>>,
    pub hints_used: u32,
    pub moves: u32,
    pub score: i32,
    hinted: BTreeSet<(usize, usize)>,
    open_cards: Vec<(usize, usize)>,
}

impl GameState {
    pub fn load(puzzle: Puzzle) -> Self {
        let board = puzzle.starting_board();
        let mut state = Self {
            cell_status: Vec::new(),
            board,
            puzzle,
            status: GameStatus::Loaded,
            elapsed_ms: 0,
            running_since: None,
            hints_used: 0,
            moves: 0,
            score: 0,
            hinted: BTreeSet::new(),
            open_cards: Vec::new(),
        };
        state.refresh_cell_status();
        state
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.status != GameStatus::Loaded {
            return Err(CoreError::InvalidState(self.status));
        }
        self.status = GameStatus::InProgress;
        self.running_since = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        if self.status != GameStatus::InProgress {
            return Err(CoreError::InvalidState(self.status));
        }
        self.bank_clock(now);
        self.status = GameStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            GameStatus::Paused | GameStatus::Loaded => {
                self.status = GameStatus::InProgress;
                self.running_since = Some(now);
                Ok(())
            }
            other => Err(CoreError::InvalidState(other)),
        }
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        let running = self
            .running_since
            .map(|since| (now - since).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        self.elapsed_ms + running
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, GameStatus::Solved | GameStatus::Failed)
    }

    /// Enforce the time limit. Returns the (possibly new) status.
    pub fn tick(&mut self, now: DateTime<Utc>) -> GameStatus {
        if self.status == GameStatus::InProgress {
            let limit = time_limit(self.puzzle.difficulty).num_milliseconds() as u64;
            if self.elapsed_ms(now) > limit {
                tracing::info!(puzzle_id = %self.puzzle.id, "time limit reached");
                self.finish(GameStatus::Failed, now);
            }
        }
        self.status
    }

    /// Write (or clear, with `None`) a cell in a binary or sudoku puzzle.
    pub fn set_cell(
        &mut self,
        row: usize,
        col: usize,
        value: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        self.ensure_running(now)?;
        if !matches!(self.puzzle.kind, PuzzleKind::Binary | PuzzleKind::Sudoku) {
            return Err(CoreError::UnsupportedAction);
        }
        self.puzzle.check_bounds(row, col)?;
        if self.puzzle.is_given(row, col) || self.hinted.contains(&(row, col)) {
            return Err(CoreError::GivenCell { row, col });
        }
        if let Some(v) = value {
            self.puzzle.check_value(v)?;
        }

        self.board[row][col] = value;
        self.moves += 1;
        self.refresh_cell_status();
        Ok(())
    }

    /// Lights-out: toggle whether a cell is pressed.
    pub fn press(&mut self, row: usize, col: usize, now: DateTime<Utc>) -> Result<(), CoreError> {
        self.ensure_running(now)?;
        if self.puzzle.kind != PuzzleKind::LightsOut {
            return Err(CoreError::UnsupportedAction);
        }
        self.puzzle.check_bounds(row, col)?;
        if self.hinted.contains(&(row, col)) {
            return Err(CoreError::GivenCell { row, col });
        }

        let cell = &mut self.board[row][col];
        *cell = Some(cell.unwrap_or(0) ^ 1);
        self.moves += 1;
        self.refresh_cell_status();
        Ok(())
    }

    /// Lights currently on, from the starting pattern and the presses so far.
    pub fn lights(&self) -> Option<Vec<Vec<u8>>> {
        (self.puzzle.kind == PuzzleKind::LightsOut)
            .then(|| crate::puzzle::lights_out::lights_after(&self.puzzle, &self.board))
    }

    /// Pairs: turn a card face up. A mismatched pair stays visible until the
    /// next flip.
    pub fn flip(&mut self, row: usize, col: usize, now: DateTime<Utc>) -> Result<FlipOutcome, CoreError> {
        self.ensure_running(now)?;
        if self.puzzle.kind != PuzzleKind::Pairs {
            return Err(CoreError::UnsupportedAction);
        }
        self.puzzle.check_bounds(row, col)?;

        if self.open_cards.len() == 2 {
            for (r, c) in self.open_cards.drain(..) {
                self.board[r][c] = None;
            }
        }
        if self.board[row][col].is_some() {
            self.refresh_cell_status();
            return Ok(FlipOutcome::AlreadyRevealed);
        }

        self.board[row][col] = Some(self.puzzle.solution[row][col]);
        self.open_cards.push((row, col));

        let outcome = if self.open_cards.len() == 2 {
            self.moves += 1;
            let (a, b) = (self.open_cards[0], self.open_cards[1]);
            if self.puzzle.solution[a.0][a.1] == self.puzzle.solution[b.0][b.1] {
                self.open_cards.clear();
                FlipOutcome::Matched
            } else {
                FlipOutcome::Mismatched
            }
        } else {
            FlipOutcome::Opened
        };

        self.refresh_cell_status();
        Ok(outcome)
    }

    /// Reveal one cell from the solution. Returns the revealed cell.
    pub fn hint(&mut self, now: DateTime<Utc>) -> Result<(usize, usize), CoreError> {
        self.ensure_running(now)?;
        if self.hints_used >= MAX_HINTS {
            return Err(CoreError::HintsExhausted);
        }

        let target = match self.puzzle.kind {
            PuzzleKind::Pairs => self.hint_pair(),
            _ => self.first_wrong_cell(),
        }
        .ok_or(CoreError::NothingToHint)?;

        self.hints_used += 1;
        self.refresh_cell_status();
        tracing::debug!(puzzle_id = %self.puzzle.id, ?target, hints_used = self.hints_used, "hint used");
        Ok(target)
    }

    fn first_wrong_cell(&mut self) -> Option<(usize, usize)> {
        let (rows, cols) = (self.puzzle.rows(), self.puzzle.cols());
        let target = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .find(|&(r, c)| {
                !self.puzzle.is_given(r, c)
                    && !self.hinted.contains(&(r, c))
                    && self.board[r][c] != Some(self.puzzle.solution[r][c])
            })?;
        self.board[target.0][target.1] = Some(self.puzzle.solution[target.0][target.1]);
        self.hinted.insert(target);
        Some(target)
    }

    fn hint_pair(&mut self) -> Option<(usize, usize)> {
        for (r, c) in self.open_cards.drain(..) {
            self.board[r][c] = None;
        }
        let (rows, cols) = (self.puzzle.rows(), self.puzzle.cols());
        let cells: Vec<(usize, usize)> = (0..rows).flat_map(|r| (0..cols).map(move |c| (r, c))).collect();

        let first = cells.iter().copied().find(|&(r, c)| self.board[r][c].is_none())?;
        let card = self.puzzle.solution[first.0][first.1];
        let twin = cells
            .iter()
            .copied()
            .find(|&(r, c)| (r, c) != first && self.puzzle.solution[r][c] == card)?;

        for (r, c) in [first, twin] {
            self.board[r][c] = Some(card);
            self.hinted.insert((r, c));
        }
        Some(first)
    }

    /// Validate the board. A solved board finishes the game and fixes the score.
    pub fn check(&mut self, now: DateTime<Utc>) -> Result<Verdict, CoreError> {
        self.ensure_running(now)?;
        let verdict = self.puzzle.validate(&self.board);
        if verdict == Verdict::Solved {
            self.finish(GameStatus::Solved, now);
            tracing::info!(
                puzzle_id = %self.puzzle.id,
                score = self.score,
                elapsed_ms = self.elapsed_ms,
                "puzzle solved"
            );
        }
        Ok(verdict)
    }

    pub fn give_up(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        match self.status {
            GameStatus::InProgress | GameStatus::Paused | GameStatus::Loaded => {
                self.finish(GameStatus::Failed, now);
                Ok(())
            }
            other => Err(CoreError::InvalidState(other)),
        }
    }

    /// Copy suitable for persisting: a running clock is banked and the copy
    /// is paused, so time spent with the app closed is not counted.
    pub fn snapshot(&self, now: DateTime<Utc>) -> GameState {
        let mut copy = self.clone();
        if copy.status == GameStatus::InProgress {
            copy.bank_clock(now);
            copy.status = GameStatus::Paused;
        }
        copy
    }

    /// The day's result once the game is over.
    pub fn result(&self) -> Option<DayResult> {
        self.is_finished().then(|| DayResult {
            solved: self.status == GameStatus::Solved,
            score: self.score,
            difficulty: self.puzzle.difficulty,
            kind: self.puzzle.kind,
            puzzle_id: self.puzzle.id.clone(),
            time_taken: (self.elapsed_ms / 1000).min(u64::from(u32::MAX)) as u32,
            hints_used: self.hints_used,
        })
    }

    fn ensure_running(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        match self.tick(now) {
            GameStatus::InProgress => Ok(()),
            other => Err(CoreError::InvalidState(other)),
        }
    }

    fn bank_clock(&mut self, now: DateTime<Utc>) {
        self.elapsed_ms = self.elapsed_ms(now);
        self.running_since = None;
    }

    fn finish(&mut self, status: GameStatus, now: DateTime<Utc>) {
        self.bank_clock(now);
        self.status = status;
        self.score = match status {
            GameStatus::Solved => scoring::solve_score(self.elapsed_ms, self.hints_used),
            _ => 0,
        };
        self.open_cards.clear();
        self.refresh_cell_status();
    }

    fn refresh_cell_status(&mut self) {
        let conflicts: BTreeSet<(usize, usize)> =
            self.puzzle.conflicts(&self.board).into_iter().collect();

        self.cell_status = self
            .board
            .iter()
            .enumerate()
            .map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let hinted = self.hinted.contains(&(r, c));
                        match self.puzzle.kind {
                            PuzzleKind::Binary | PuzzleKind::Sudoku => {
                                if self.puzzle.is_given(r, c) {
                                    CellStatus::Given
                                } else if hinted {
                                    CellStatus::Hinted
                                } else if cell.is_none() {
                                    CellStatus::Empty
                                } else if conflicts.contains(&(r, c)) {
                                    CellStatus::Conflict
                                } else {
                                    CellStatus::Filled
                                }
                            }
                            PuzzleKind::LightsOut => match (hinted, cell) {
                                (true, _) => CellStatus::Hinted,
                                (false, Some(1)) => CellStatus::Filled,
                                _ => CellStatus::Empty,
                            },
                            PuzzleKind::Pairs => match cell {
                                None => CellStatus::Empty,
                                Some(_) if self.open_cards.contains(&(r, c)) => CellStatus::Open,
                                Some(_) if hinted => CellStatus::Hinted,
                                Some(_) => CellStatus::Matched,
                            },
                        }
                    })
                    .collect()
            })
            .collect();
    }
}
