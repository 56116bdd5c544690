//! Simulation event dispatcher
//!
//! The engine calls one entry point per event kind from its own thread. At
//! most one listener is registered at a time and the dispatcher only holds a
//! weak handle to it, so a torn-down listener is never kept alive. Events
//! with no live listener are dropped, never queued.

use std::sync::{Arc, RwLock, Weak};

use crate::prize::Prize;

/// Events emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    BallThrown,
    BallLost,
    LevelFinished,
    /// Points earned from broken blocks
    ScoreUpdated(i64),
    AngleChanged(f32),
    /// Remaining hits needed to clear the board
    CardinalityChanged(i32),
    PrizeCaught(Prize),
    RefreshLives,
    RefreshLevel,
    RefreshScore,
}

/// Receiver of simulation events. Called on the simulation thread, so
/// implementations must return quickly.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: SimEvent);
}

#[derive(Default)]
pub struct Dispatcher {
    listener: RwLock<Option<Weak<dyn EventListener>>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("has_listener", &self.has_listener())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`, replacing any previous one
    pub fn register<L: EventListener + 'static>(&self, listener: &Arc<L>) {
        let weak: Weak<L> = Arc::downgrade(listener);
        let weak: Weak<dyn EventListener> = weak;
        match self.listener.write() {
            Ok(mut slot) => *slot = Some(weak),
            Err(poisoned) => *poisoned.into_inner() = Some(weak),
        }
        log::debug!("Event listener registered");
    }

    /// Drop the current listener. Later events are discarded.
    pub fn unregister(&self) {
        match self.listener.write() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        log::debug!("Event listener unregistered");
    }

    /// Whether a listener is registered and still alive
    pub fn has_listener(&self) -> bool {
        self.current().is_some()
    }

    fn current(&self) -> Option<Arc<dyn EventListener>> {
        let slot = self.listener.read().ok()?;
        slot.as_ref().and_then(Weak::upgrade)
    }

    /// Deliver `event` to the listener, or drop it if there is none
    pub fn dispatch(&self, event: SimEvent) {
        match self.current() {
            Some(listener) => listener.on_event(event),
            None => log::trace!("No listener, dropping {event:?}"),
        }
    }

    pub fn ball_thrown(&self) {
        self.dispatch(SimEvent::BallThrown);
    }

    pub fn ball_lost(&self) {
        self.dispatch(SimEvent::BallLost);
    }

    pub fn level_finished(&self) {
        self.dispatch(SimEvent::LevelFinished);
    }

    pub fn score_updated(&self, points: i64) {
        self.dispatch(SimEvent::ScoreUpdated(points));
    }

    pub fn angle_changed(&self, angle: f32) {
        self.dispatch(SimEvent::AngleChanged(angle));
    }

    pub fn cardinality_changed(&self, cardinality: i32) {
        self.dispatch(SimEvent::CardinalityChanged(cardinality));
    }

    /// Prize caught, as the engine's wire code
    pub fn prize_caught(&self, code: i32) {
        match Prize::from_code(code) {
            Some(prize) => self.dispatch(SimEvent::PrizeCaught(prize)),
            None => log::warn!("Unknown prize code {code}, dropped"),
        }
    }

    pub fn refresh_lives(&self) {
        self.dispatch(SimEvent::RefreshLives);
    }

    pub fn refresh_level(&self) {
        self.dispatch(SimEvent::RefreshLevel);
    }

    pub fn refresh_score(&self) {
        self.dispatch(SimEvent::RefreshScore);
    }
}
