//! Session state machine
//!
//! Owns lives, level and score. Every entry point applies its mutation to
//! the counters before building the commands it returns, so a failure while
//! carrying out a command can never leave the counters out of step.

use crate::level::{self, LevelDescriptor, TOTAL_LEVELS};
use crate::persistence::SessionRecord;
use crate::prize::{Directive, Prize, PrizeTable};
use crate::settings::Settings;
use crate::ui::UiUpdate;

use super::command::Command;

/// Lifecycle phase of a play session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Nothing loaded yet
    Idle,
    /// Simulation running, events are applied
    Playing,
    /// Suspended and persisted, events are ignored
    Paused,
    /// Lives ran out; passes straight back to Playing
    GameOver,
}

#[derive(Debug, Clone)]
pub struct Session {
    player_id: i64,
    lives: i32,
    level: u32,
    score: u64,
    phase: SessionPhase,
    initial_lives: i32,
    table: PrizeTable,
    game_overs: u32,
}

impl Session {
    pub fn new(settings: &Settings) -> Self {
        let initial_lives = settings.initial_lives.max(0);
        Self {
            player_id: settings.player_id,
            lives: initial_lives,
            level: 0,
            score: 0,
            phase: SessionPhase::Idle,
            initial_lives,
            table: PrizeTable::from_settings(settings),
            game_overs: 0,
        }
    }

    pub fn player_id(&self) -> i64 {
        self.player_id
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Number of game-over transitions since this session was created
    pub fn game_overs(&self) -> u32 {
        self.game_overs
    }

    pub fn prize_table(&self) -> &PrizeTable {
        &self.table
    }

    /// Current counters as a storable record
    pub fn record(&self, board: String) -> SessionRecord {
        SessionRecord {
            player_id: self.player_id,
            lives: self.lives,
            level: self.level,
            score: self.score,
            board,
        }
    }

    fn is_playing(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    /// Start (or resume) play from a stored record, or from defaults when
    /// the player has none.
    pub fn load(&mut self, record: Option<SessionRecord>) -> Vec<Command> {
        if !matches!(self.phase, SessionPhase::Idle | SessionPhase::Paused) {
            log::warn!("Ignoring load while {:?}", self.phase);
            return Vec::new();
        }

        let record = record.unwrap_or_else(|| {
            log::info!("No session record for player {}, starting fresh", self.player_id);
            SessionRecord::new(self.player_id, self.initial_lives)
        });

        self.lives = if record.lives < 0 {
            log::warn!("Stored lives {} invalid, resetting", record.lives);
            self.initial_lives
        } else {
            record.lives
        };
        self.level = level::clamp_index(i64::from(record.level));
        if self.level != record.level {
            log::warn!("Stored level {} out of range, using 0", record.level);
        }
        self.score = record.score;
        self.phase = SessionPhase::Playing;

        log::info!(
            "Session loaded: player={} lives={} level={} score={}",
            self.player_id,
            self.lives,
            self.level,
            self.score
        );

        let layout = match LevelDescriptor::decode_snapshot(&record.board) {
            Some(board) => {
                log::debug!("Resuming level {} from saved board", self.level);
                board
            }
            None => level::decode(i64::from(self.level)),
        };

        let mut commands = vec![Command::LoadLevel {
            level: self.level,
            layout,
            settle: false,
        }];
        commands.extend(self.refresh_all());
        commands
    }

    /// Ball fell past the paddle: lose a life and pay the level penalty
    pub fn on_ball_lost(&mut self) -> Vec<Command> {
        if !self.is_playing() {
            log::debug!("Ball lost while {:?}, ignored", self.phase);
            return Vec::new();
        }

        let penalty = self.table.ball_lost_penalty(self.level);
        self.lives -= 1;
        let delta = self.apply_score(-i64::try_from(penalty).unwrap_or(i64::MAX));
        let game_over = self.check_game_over();

        log::debug!(
            "Ball lost: lives={} score={} (penalty {})",
            self.lives,
            self.score,
            penalty
        );

        let mut commands = vec![Command::Ui(UiUpdate::ScoreChanged {
            score: self.score,
            delta,
        })];
        if game_over {
            commands.extend(self.game_over_commands());
        } else {
            commands.push(Command::Ui(UiUpdate::LivesChanged(self.lives)));
        }
        commands
    }

    /// Paddle caught a prize
    pub fn on_prize_caught(&mut self, prize: Prize) -> Vec<Command> {
        if !self.is_playing() {
            log::debug!("Prize {prize:?} caught while {:?}, ignored", self.phase);
            return Vec::new();
        }

        let effect = self.table.resolve(prize);
        log::debug!("Prize caught: {prize:?} -> {effect:?}");

        let delta = self.apply_score(effect.score_delta);
        self.lives = self.lives.saturating_add(effect.lives_delta);
        let game_over = self.check_game_over();
        let advanced = match effect.directive {
            Directive::AdvanceLevel => {
                self.advance_level();
                true
            }
            Directive::None | Directive::ReloadLevel => false,
        };

        let mut commands = Vec::new();
        if effect.score_delta != 0 {
            commands.push(Command::Ui(UiUpdate::ScoreChanged {
                score: self.score,
                delta,
            }));
        }
        if game_over {
            commands.extend(self.game_over_commands());
        } else if effect.lives_delta != 0 {
            commands.push(Command::Ui(UiUpdate::LivesChanged(self.lives)));
        }
        if advanced {
            commands.extend(self.level_changed_commands());
        } else if effect.directive == Directive::ReloadLevel && !game_over {
            commands.push(self.reload_current(false));
        }
        commands
    }

    /// Every block on the board is gone
    pub fn on_level_finished(&mut self) -> Vec<Command> {
        if !self.is_playing() {
            log::debug!("Level finished while {:?}, ignored", self.phase);
            return Vec::new();
        }
        self.advance_level();
        self.level_changed_commands()
    }

    /// Points reported by the engine for breaking blocks
    pub fn on_score_updated(&mut self, points: i64) -> Vec<Command> {
        if !self.is_playing() {
            log::debug!("Score update while {:?}, ignored", self.phase);
            return Vec::new();
        }
        let delta = self.apply_score(points);
        vec![Command::Ui(UiUpdate::ScoreChanged {
            score: self.score,
            delta,
        })]
    }

    /// Suspend play and persist the counters with the engine's board snapshot
    pub fn pause(&mut self, board: String) -> Vec<Command> {
        if !self.is_playing() {
            log::debug!("Pause while {:?}, nothing to persist", self.phase);
            return Vec::new();
        }
        self.phase = SessionPhase::Paused;
        log::info!(
            "Session paused: lives={} level={} score={}",
            self.lives,
            self.level,
            self.score
        );
        vec![Command::Persist(self.record(board))]
    }

    /// Reset lives and score, keep the level, restart it from scratch
    pub fn reset_stat(&mut self) -> Vec<Command> {
        self.lives = self.initial_lives;
        self.score = 0;
        self.phase = SessionPhase::Playing;
        log::info!("Session reset on level {}", self.level);

        let mut commands = vec![
            Command::Persist(self.record(String::new())),
            self.reload_current(false),
        ];
        commands.extend(self.refresh_all());
        commands
    }

    pub fn refresh_lives(&self) -> Vec<Command> {
        vec![Command::Ui(UiUpdate::LivesChanged(self.lives))]
    }

    pub fn refresh_level(&self) -> Vec<Command> {
        vec![Command::Ui(UiUpdate::LevelChanged(self.level))]
    }

    pub fn refresh_score(&self) -> Vec<Command> {
        vec![Command::Ui(UiUpdate::ScoreChanged {
            score: self.score,
            delta: 0,
        })]
    }

    fn refresh_all(&self) -> Vec<Command> {
        let mut commands = self.refresh_lives();
        commands.extend(self.refresh_level());
        commands.extend(self.refresh_score());
        commands
    }

    /// Add `delta` to the score, flooring at zero. Returns `delta` unchanged
    /// so the UI can show the full change.
    fn apply_score(&mut self, delta: i64) -> i64 {
        self.score = if delta >= 0 {
            self.score.saturating_add(delta.unsigned_abs())
        } else {
            self.score.saturating_sub(delta.unsigned_abs())
        };
        delta
    }

    /// Handles lives dropping below zero. Returns true if a game over happened.
    fn check_game_over(&mut self) -> bool {
        if self.lives >= 0 {
            return false;
        }
        self.phase = SessionPhase::GameOver;
        self.game_overs += 1;
        log::info!(
            "Game over on level {} (score {}), restarting level",
            self.level,
            self.score
        );
        self.lives = self.initial_lives;
        self.phase = SessionPhase::Playing;
        true
    }

    fn advance_level(&mut self) {
        let next = level::next_level(self.level);
        log::info!("Level {} finished, next {}", self.level, next);
        self.level = next;
    }

    fn game_over_commands(&self) -> Vec<Command> {
        vec![
            Command::Ui(UiUpdate::GameOver),
            Command::Ui(UiUpdate::LivesChanged(self.lives)),
            self.reload_current(false),
        ]
    }

    fn level_changed_commands(&self) -> Vec<Command> {
        vec![
            Command::Ui(UiUpdate::LevelChanged(self.level)),
            self.reload_current(true),
        ]
    }

    fn reload_current(&self, settle: bool) -> Command {
        debug_assert!(self.level < TOTAL_LEVELS);
        let layout = level::decode(i64::from(self.level));
        log::debug!(
            "Reload level {} ({} hits to clear)",
            self.level,
            layout.cardinality()
        );
        Command::LoadLevel {
            level: self.level,
            layout,
            settle,
        }
    }
}
