//! The state machine every minigame shares.
//!
//! CALIBRATE (optional) → PLAYING → WIN | FAIL → INPUT_NAME (when the score
//! qualifies) → SHOW_LEADERBOARD. The game decides when play ends and when the
//! end screen is done; the session owns the leaderboard gate and name entry.

use anyhow::Result;
use std::time::Duration;
use tracing::info;

use crate::leaderboard::{LeaderboardEntry, LeaderboardStore, NAME_LENGTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Calibrate,
    Playing,
    Won,
    Failed,
    InputName,
    ShowLeaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Char(char),
    Backspace,
    Confirm,
    Restart,
    /// Nudge the segmentation threshold while calibrating
    Sensitivity(i16),
}

/// What the tick loop should do after an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Continue,
    Quit,
    Restart,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Start in CALIBRATE instead of PLAYING
    pub calibrate: bool,
    pub starting_health: Option<i32>,
    pub time_limit: Option<Duration>,
    /// Outcome when the time limit runs out
    pub time_up: Outcome,
    /// Whether a failed run may still enter the leaderboard
    pub record_failures: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            calibrate: false,
            starting_health: None,
            time_limit: None,
            time_up: Outcome::Win,
            record_failures: true,
        }
    }
}

/// Three alphanumeric initials, upper-cased as typed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameEntry {
    buffer: String,
}

impl NameEntry {
    pub fn push(&mut self, c: char) -> bool {
        if self.buffer.chars().count() >= NAME_LENGTH || !c.is_ascii_alphanumeric() {
            return false;
        }
        self.buffer.push(c.to_ascii_uppercase());
        true
    }

    pub fn backspace(&mut self) {
        self.buffer.pop();
    }

    pub fn is_complete(&self) -> bool {
        self.buffer.chars().count() == NAME_LENGTH
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }
}

pub struct GameSession {
    config: SessionConfig,
    store: Option<Box<dyn LeaderboardStore>>,
    state: GameState,
    score: i64,
    health: Option<i32>,
    elapsed: Duration,
    outcome: Option<Outcome>,
    name: NameEntry,
    table: Vec<LeaderboardEntry>,
}

impl GameSession {
    pub fn new(config: SessionConfig, store: Option<Box<dyn LeaderboardStore>>) -> Self {
        let state = if config.calibrate {
            GameState::Calibrate
        } else {
            GameState::Playing
        };
        Self {
            health: config.starting_health,
            config,
            store,
            state,
            score: 0,
            elapsed: Duration::ZERO,
            outcome: None,
            name: NameEntry::default(),
            table: Vec::new(),
        }
    }

    /// Start over with the same settings and leaderboard
    pub fn restart(&mut self) {
        info!("Session restarted");
        *self = Self::new(self.config.clone(), self.store.take());
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn health(&self) -> Option<i32> {
        self.health
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn time_left(&self) -> Option<Duration> {
        self.config
            .time_limit
            .map(|limit| limit.saturating_sub(self.elapsed))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn name(&self) -> &NameEntry {
        &self.name
    }

    /// Table shown on the leaderboard screen
    pub fn table(&self) -> &[LeaderboardEntry] {
        &self.table
    }

    /// CALIBRATE → PLAYING
    pub fn begin_play(&mut self) -> bool {
        if self.state != GameState::Calibrate {
            return false;
        }
        self.transition(GameState::Playing);
        true
    }

    pub fn add_score(&mut self, points: i64) {
        if self.state == GameState::Playing {
            self.score += points;
        }
    }

    pub fn set_score(&mut self, score: i64) {
        self.score = score;
    }

    /// Take damage; reaching zero health fails the run
    pub fn damage(&mut self, amount: i32) {
        if self.state != GameState::Playing {
            return;
        }
        if let Some(health) = self.health.as_mut() {
            *health -= amount;
            if *health <= 0 {
                *health = 0;
                self.finish(Outcome::Fail);
            }
        }
    }

    /// Advance the play clock; running out of time ends the run
    pub fn advance(&mut self, dt: Duration) {
        if self.state != GameState::Playing {
            return;
        }
        self.elapsed += dt;
        if let Some(limit) = self.config.time_limit {
            if self.elapsed >= limit {
                self.elapsed = limit;
                self.finish(self.config.time_up);
            }
        }
    }

    /// PLAYING → WIN | FAIL
    pub fn finish(&mut self, outcome: Outcome) {
        if self.state != GameState::Playing {
            return;
        }
        self.outcome = Some(outcome);
        let next = match outcome {
            Outcome::Win => GameState::Won,
            Outcome::Fail => GameState::Failed,
        };
        info!(?outcome, score = self.score, "Run finished");
        self.transition(next);
    }

    /// WIN | FAIL → INPUT_NAME when the score qualifies, otherwise SHOW_LEADERBOARD
    pub fn conclude(&mut self) -> Result<()> {
        if !matches!(self.state, GameState::Won | GameState::Failed) {
            return Ok(());
        }
        let eligible = self.outcome == Some(Outcome::Win) || self.config.record_failures;
        let qualifies = match &self.store {
            Some(store) if eligible => store.qualifies(self.score)?,
            _ => false,
        };
        if qualifies {
            self.transition(GameState::InputName);
        } else {
            self.reload_table()?;
            self.transition(GameState::ShowLeaderboard);
        }
        Ok(())
    }

    pub fn handle_input(&mut self, event: &InputEvent) -> Result<SessionSignal> {
        if *event == InputEvent::Quit {
            return Ok(SessionSignal::Quit);
        }
        match self.state {
            GameState::InputName => match event {
                InputEvent::Char(c) => {
                    self.name.push(*c);
                }
                InputEvent::Backspace => self.name.backspace(),
                InputEvent::Confirm if self.name.is_complete() => {
                    if let Some(store) = self.store.as_mut() {
                        store.commit(self.name.as_str(), self.score)?;
                    }
                    self.reload_table()?;
                    self.transition(GameState::ShowLeaderboard);
                }
                _ => {}
            },
            GameState::ShowLeaderboard => {
                if matches!(event, InputEvent::Restart | InputEvent::Confirm) {
                    return Ok(SessionSignal::Restart);
                }
            }
            _ => {}
        }
        Ok(SessionSignal::Continue)
    }

    fn reload_table(&mut self) -> Result<()> {
        self.table = match &self.store {
            Some(store) => store.read_top()?,
            None => Vec::new(),
        };
        Ok(())
    }

    fn transition(&mut self, next: GameState) {
        info!(from = ?self.state, to = ?next, "Session state change");
        self.state = next;
    }
}
