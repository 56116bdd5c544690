//! UI refresh surface
//!
//! The session never calls into the presentation layer directly. Updates are
//! pushed onto a thread-safe queue and the UI thread drains them from its own
//! loop, applying each one to a [`UiSink`].

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// A pending change to something the player can see
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiUpdate {
    LivesChanged(i32),
    /// `delta` is the raw change, even when the total was floored at zero
    ScoreChanged { score: u64, delta: i64 },
    LevelChanged(u32),
    CardinalityChanged(i32),
    AngleChanged(f32),
    GameOver,
}

/// Presentation layer callbacks, invoked on the UI thread only
pub trait UiSink {
    fn on_lives_changed(&mut self, lives: i32);
    fn on_score_changed(&mut self, score: u64, delta: i64);
    fn on_level_changed(&mut self, level: u32);
    fn on_cardinality_changed(&mut self, cardinality: i32);
    fn on_game_over(&mut self);

    fn on_angle_changed(&mut self, _angle: f32) {}
}

impl UiUpdate {
    pub fn apply(self, sink: &mut dyn UiSink) {
        match self {
            UiUpdate::LivesChanged(lives) => sink.on_lives_changed(lives),
            UiUpdate::ScoreChanged { score, delta } => sink.on_score_changed(score, delta),
            UiUpdate::LevelChanged(level) => sink.on_level_changed(level),
            UiUpdate::CardinalityChanged(n) => sink.on_cardinality_changed(n),
            UiUpdate::AngleChanged(angle) => sink.on_angle_changed(angle),
            UiUpdate::GameOver => sink.on_game_over(),
        }
    }
}

/// Create a connected sender/receiver pair
pub fn ui_queue() -> (UiSender, UiReceiver) {
    let (tx, rx) = mpsc::channel();
    (UiSender { tx }, UiReceiver { rx })
}

/// Producer side, cloneable and usable from any thread
#[derive(Debug, Clone)]
pub struct UiSender {
    tx: Sender<UiUpdate>,
}

impl UiSender {
    /// Queue an update. Dropped silently once the UI side is gone.
    pub fn send(&self, update: UiUpdate) {
        if self.tx.send(update).is_err() {
            log::debug!("UI receiver gone, dropping {update:?}");
        }
    }
}

/// Consumer side, owned by the UI thread
#[derive(Debug)]
pub struct UiReceiver {
    rx: Receiver<UiUpdate>,
}

impl UiReceiver {
    /// Apply every queued update to `sink` without blocking.
    /// Returns how many were applied.
    pub fn drain_into(&self, sink: &mut dyn UiSink) -> usize {
        let mut applied = 0;
        loop {
            match self.rx.try_recv() {
                Ok(update) => {
                    update.apply(sink);
                    applied += 1;
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
            }
        }
    }

    /// Take every queued update without applying it
    pub fn drain(&self) -> Vec<UiUpdate> {
        self.rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Hud {
        lives: i32,
        score: u64,
        last_delta: i64,
        level: u32,
        game_overs: u32,
    }

    impl UiSink for Hud {
        fn on_lives_changed(&mut self, lives: i32) {
            self.lives = lives;
        }
        fn on_score_changed(&mut self, score: u64, delta: i64) {
            self.score = score;
            self.last_delta = delta;
        }
        fn on_level_changed(&mut self, level: u32) {
            self.level = level;
        }
        fn on_cardinality_changed(&mut self, _cardinality: i32) {}
        fn on_game_over(&mut self) {
            self.game_overs += 1;
        }
    }

    #[test]
    fn test_drain_applies_in_order() {
        let (tx, rx) = ui_queue();
        tx.send(UiUpdate::LivesChanged(2));
        tx.send(UiUpdate::LivesChanged(1));
        tx.send(UiUpdate::ScoreChanged { score: 0, delta: -18 });
        tx.send(UiUpdate::GameOver);

        let mut hud = Hud::default();
        assert_eq!(rx.drain_into(&mut hud), 4);
        assert_eq!(hud.lives, 1);
        assert_eq!(hud.score, 0);
        assert_eq!(hud.last_delta, -18);
        assert_eq!(hud.game_overs, 1);
        assert_eq!(rx.drain_into(&mut hud), 0);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = ui_queue();
        drop(rx);
        tx.send(UiUpdate::LevelChanged(1));
    }
}
