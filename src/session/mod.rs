//! Session state
//!
//! All lives/level/score mutation happens here and nowhere else. The state
//! machine is pure: it returns [`Command`]s and the session worker in
//! `controller` carries them out.

pub mod command;
pub mod state;

pub use command::Command;
pub use state::{Session, SessionPhase};
