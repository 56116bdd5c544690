//! Commands emitted by the session state machine
//!
//! The state machine never performs I/O. Each entry point mutates the
//! counters first and then returns the commands the caller must carry out.

use crate::level::LevelDescriptor;
use crate::persistence::SessionRecord;
use crate::ui::UiUpdate;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Send a layout to the engine
    LoadLevel {
        level: u32,
        layout: LevelDescriptor,
        /// Wait for the simulation to settle before sending (level just finished)
        settle: bool,
    },
    /// Write the record to the session store
    Persist(SessionRecord),
    /// Queue a UI refresh
    Ui(UiUpdate),
}

impl Command {
    pub fn is_game_over(&self) -> bool {
        matches!(self, Command::Ui(UiUpdate::GameOver))
    }
}
