//! Arkanoid session - play-session state for a brick-breaker game
//!
//! The physics engine runs on its own thread and reports what happens on the
//! board. This crate owns everything around it: lives, level and score, the
//! level catalog, prize effects, persistence across pauses and the queue of
//! UI refreshes.
//!
//! Core modules:
//! - `level`: Board layouts, block codes and the built-in catalog
//! - `prize`: Prize codes, their effects and the random prize generator
//! - `session`: The state machine that mutates lives/level/score
//! - `dispatch`: Fan-in of simulation events to a single listener
//! - `controller`: Worker thread that serializes events onto the session
//! - `persistence`: Per-player records (in-memory and JSON file stores)
//! - `ui`: Queue of refreshes drained by the UI thread
//! - `engine`: Command surface of the simulation

pub mod controller;
pub mod dispatch;
pub mod engine;
pub mod level;
pub mod persistence;
pub mod prize;
pub mod session;
pub mod settings;
pub mod ui;

pub use controller::{ControllerError, SessionController, SessionStats};
pub use dispatch::{Dispatcher, EventListener, SimEvent};
pub use engine::{Engine, LoggingEngine};
pub use level::LevelDescriptor;
pub use persistence::{JsonFileStore, MemoryStore, SessionRecord, SessionStore, StoreError};
pub use prize::{Prize, PrizeGenerator, PrizeTable};
pub use session::{Command, Session, SessionPhase};
pub use settings::Settings;
pub use ui::{UiReceiver, UiSender, UiSink, UiUpdate, ui_queue};

/// Game configuration constants
pub mod consts {
    /// Lives at the start of a session and after a game over
    pub const DEFAULT_LIVES: i32 = 3;
    /// Penalty multiplier for a lost ball, scaled by (level + 1)^2
    pub const DEFAULT_PENALTY_FACTOR: u64 = 2;
    /// Points for the Win prize
    pub const DEFAULT_WIN_BONUS: u64 = 100;
    /// Points for the Score1..Score5 prizes
    pub const DEFAULT_SCORE_AWARDS: [u64; 5] = [10, 25, 50, 100, 200];
    /// Pause between a level ending and the next one loading
    pub const LEVEL_SETTLE_MS: u64 = 250;
}
