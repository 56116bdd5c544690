//! Session worker
//!
//! A single thread owns the [`Session`] and applies everything to it in the
//! order it arrives: simulation events from the dispatcher and lifecycle
//! requests (resume, pause, reset) from the UI. It carries out the commands
//! the session returns against the engine, the store and the UI queue.
//!
//! The listener registered with the dispatcher only pushes onto the worker's
//! queue, so the simulation thread never waits on session state.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::dispatch::{Dispatcher, EventListener, SimEvent};
use crate::engine::{Engine, ResourceHandle, SurfaceHandle};
use crate::persistence::{SessionRecord, SessionStore, StoreError, save_record};
use crate::session::{Command, Session, SessionPhase};
use crate::settings::Settings;
use crate::ui::{UiSender, UiUpdate};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("session worker has stopped")]
    WorkerGone,
}

/// Point-in-time copy of the session counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub lives: i32,
    pub level: u32,
    pub score: u64,
    pub phase: SessionPhase,
}

type Reply<T> = Sender<T>;

enum Message {
    Event(SimEvent),
    Resume(Reply<Result<(), StoreError>>),
    Pause(Reply<Result<(), StoreError>>),
    Reset(Reply<Result<(), StoreError>>),
    Stats(Reply<SessionStats>),
    Shutdown,
}

/// Dispatcher listener that forwards events to the worker queue
struct QueueListener {
    tx: Sender<Message>,
}

impl EventListener for QueueListener {
    fn on_event(&self, event: SimEvent) {
        if self.tx.send(Message::Event(event)).is_err() {
            log::debug!("Session worker gone, dropping {event:?}");
        }
    }
}

struct Worker {
    session: Session,
    engine: Arc<dyn Engine>,
    store: Arc<dyn SessionStore>,
    ui: UiSender,
    settle_delay: Duration,
    /// The player's stored record could not be read. Saves may only create
    /// a record, never replace one.
    record_unread: bool,
}

impl Worker {
    fn run(mut self, rx: Receiver<Message>) {
        log::debug!("Session worker started");
        for message in rx {
            match message {
                Message::Event(event) => self.handle_event(event),
                Message::Resume(reply) => {
                    let _ = reply.send(self.resume());
                }
                Message::Pause(reply) => {
                    let board = self.engine.save_level();
                    let commands = self.session.pause(board);
                    let _ = reply.send(self.execute(commands));
                }
                Message::Reset(reply) => {
                    let commands = self.session.reset_stat();
                    let _ = reply.send(self.execute(commands));
                }
                Message::Stats(reply) => {
                    let _ = reply.send(SessionStats {
                        lives: self.session.lives(),
                        level: self.session.level(),
                        score: self.session.score(),
                        phase: self.session.phase(),
                    });
                }
                Message::Shutdown => break,
            }
        }
        log::debug!("Session worker stopped");
    }

    fn resume(&mut self) -> Result<(), StoreError> {
        let e = match self.store.get_stat(self.session.player_id()) {
            Ok(record) => {
                self.record_unread = false;
                let commands = self.session.load(record);
                return self.execute(commands);
            }
            Err(e) => e,
        };

        let record = if self.session.phase() == SessionPhase::Paused {
            log::error!("Failed to read session record: {e}; resuming from memory");
            Some(self.session.record(self.engine.save_level()))
        } else {
            log::error!("Failed to read session record: {e}; starting fresh, stored record kept");
            self.record_unread |= self.session.phase() == SessionPhase::Idle;
            None
        };
        let commands = self.session.load(record);
        self.execute(commands)?;
        Err(e)
    }

    fn persist(&mut self, record: &SessionRecord) -> Result<(), StoreError> {
        if !self.record_unread {
            return save_record(self.store.as_ref(), record);
        }
        self.store.insert_stat(record)?;
        self.record_unread = false;
        Ok(())
    }

    fn handle_event(&mut self, event: SimEvent) {
        let commands = match event {
            SimEvent::BallThrown => {
                log::debug!("Ball thrown");
                Vec::new()
            }
            SimEvent::BallLost => self.session.on_ball_lost(),
            SimEvent::LevelFinished => self.session.on_level_finished(),
            SimEvent::ScoreUpdated(points) => self.session.on_score_updated(points),
            SimEvent::AngleChanged(angle) => vec![Command::Ui(UiUpdate::AngleChanged(angle))],
            SimEvent::CardinalityChanged(n) => vec![Command::Ui(UiUpdate::CardinalityChanged(n))],
            SimEvent::PrizeCaught(prize) => self.session.on_prize_caught(prize),
            SimEvent::RefreshLives => self.session.refresh_lives(),
            SimEvent::RefreshLevel => self.session.refresh_level(),
            SimEvent::RefreshScore => self.session.refresh_score(),
        };
        if let Err(e) = self.execute(commands) {
            log::error!("Persisting after {event:?} failed: {e}");
        }
    }

    /// Carry out commands in order. A failed write does not stop the rest;
    /// the first error is returned.
    fn execute(&mut self, commands: Vec<Command>) -> Result<(), StoreError> {
        let mut result = Ok(());
        for command in commands {
            match command {
                Command::LoadLevel {
                    level,
                    layout,
                    settle,
                } => {
                    if settle && !self.settle_delay.is_zero() {
                        thread::sleep(self.settle_delay);
                    }
                    log::debug!("Loading level {level}");
                    self.engine.load_level(&layout);
                    let cardinality = i32::try_from(layout.cardinality()).unwrap_or(i32::MAX);
                    self.ui.send(UiUpdate::CardinalityChanged(cardinality));
                }
                Command::Persist(record) => {
                    if let Err(e) = self.persist(&record) {
                        log::error!("Failed to persist session: {e}");
                        if result.is_ok() {
                            result = Err(e);
                        }
                    }
                }
                Command::Ui(update) => self.ui.send(update),
            }
        }
        result
    }
}

/// Handle to the session worker and the command surface towards the engine
pub struct SessionController {
    tx: Sender<Message>,
    listener: Arc<QueueListener>,
    dispatcher: Arc<Dispatcher>,
    engine: Arc<dyn Engine>,
    worker: Option<JoinHandle<()>>,
}

impl SessionController {
    /// Start the worker thread. Nothing is loaded until [`resume`](Self::resume).
    pub fn spawn(
        settings: &Settings,
        engine: Arc<dyn Engine>,
        store: Arc<dyn SessionStore>,
        dispatcher: Arc<Dispatcher>,
        ui: UiSender,
    ) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = Worker {
            session: Session::new(settings),
            engine: Arc::clone(&engine),
            store,
            ui,
            settle_delay: settings.level_settle_delay(),
            record_unread: false,
        };
        let handle = thread::Builder::new()
            .name("session-worker".into())
            .spawn(move || worker.run(rx))?;

        Ok(Self {
            listener: Arc::new(QueueListener { tx: tx.clone() }),
            tx,
            dispatcher,
            engine,
            worker: Some(handle),
        })
    }

    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Message) -> Result<T, ControllerError> {
        let (reply, response) = mpsc::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| ControllerError::WorkerGone)?;
        response.recv().map_err(|_| ControllerError::WorkerGone)
    }

    /// Load the player's record (or defaults), send the level to the engine,
    /// start the simulation and begin receiving its events.
    pub fn resume(&self) -> Result<(), ControllerError> {
        let result = self.request(Message::Resume)?;
        self.dispatcher.register(&self.listener);
        self.engine.start();
        log::info!("Session resumed");
        result.map_err(ControllerError::from)
    }

    /// Stop receiving events, snapshot the board and persist the session.
    ///
    /// A persistence failure is returned, but play can continue in memory.
    pub fn pause(&self) -> Result<(), ControllerError> {
        self.dispatcher.unregister();
        let result = self.request(Message::Pause)?;
        self.engine.stop();
        log::info!("Session paused");
        result.map_err(ControllerError::from)
    }

    /// Reset lives and score and restart the current level. Play resumes
    /// straight away, even from a paused session.
    pub fn reset_stat(&self) -> Result<(), ControllerError> {
        let result = self.request(Message::Reset)?;
        self.dispatcher.register(&self.listener);
        self.engine.start();
        log::info!("Session reset");
        result.map_err(ControllerError::from)
    }

    pub fn stats(&self) -> Result<SessionStats, ControllerError> {
        self.request(Message::Stats)
    }

    pub fn shift_paddle(&self, position: f32) {
        self.engine.shift_paddle(position);
    }

    pub fn throw_ball(&self, angle: f32) {
        self.engine.throw_ball(angle);
    }

    pub fn set_surface(&self, surface: Option<SurfaceHandle>) {
        self.engine.set_surface(surface);
    }

    pub fn attach_resources(&self, resources: ResourceHandle) {
        self.engine.set_attached_resources(resources);
        self.engine.load_resources();
    }

    /// Stop the worker and tear down the engine
    pub fn shutdown(mut self) {
        self.stop_worker();
        self.engine.destroy();
    }

    fn stop_worker(&mut self) {
        self.dispatcher.unregister();
        let _ = self.tx.send(Message::Shutdown);
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            log::error!("Session worker panicked");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop_worker();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LoggingEngine;
    use crate::level::{self, LevelDescriptor};
    use crate::persistence::MemoryStore;
    use crate::prize::Prize;
    use crate::ui::{UiReceiver, ui_queue};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Engine that remembers every level it was asked to load
    #[derive(Default)]
    struct RecordingEngine {
        loaded: Mutex<Vec<LevelDescriptor>>,
        running: Mutex<bool>,
    }

    impl RecordingEngine {
        fn loaded(&self) -> Vec<LevelDescriptor> {
            self.loaded.lock().unwrap().clone()
        }

        fn running(&self) -> bool {
            *self.running.lock().unwrap()
        }
    }

    impl Engine for RecordingEngine {
        fn start(&self) {
            *self.running.lock().unwrap() = true;
        }
        fn stop(&self) {
            *self.running.lock().unwrap() = false;
        }
        fn destroy(&self) {}
        fn set_surface(&self, _surface: Option<SurfaceHandle>) {}
        fn set_attached_resources(&self, _resources: ResourceHandle) {}
        fn load_resources(&self) {}
        fn load_level(&self, layout: &LevelDescriptor) {
            self.loaded.lock().unwrap().push(layout.clone());
        }
        fn save_level(&self) -> String {
            self.loaded
                .lock()
                .unwrap()
                .last()
                .map(LevelDescriptor::encode)
                .unwrap_or_default()
        }
        fn shift_paddle(&self, _position: f32) {}
        fn throw_ball(&self, _angle: f32) {}
    }

    /// Store whose writes always fail
    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn get_stat(&self, _player_id: i64) -> Result<Option<SessionRecord>, StoreError> {
            Ok(None)
        }
        fn update_stat(&self, _record: &SessionRecord) -> Result<bool, StoreError> {
            Err(StoreError::Poisoned)
        }
        fn insert_stat(&self, _record: &SessionRecord) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
        fn clear_stat(&self, _player_id: i64) -> Result<(), StoreError> {
            Err(StoreError::Poisoned)
        }
    }

    /// Memory store whose reads can be made to fail
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
    }

    impl FlakyStore {
        fn fail_reads(&self) {
            self.fail_reads.store(true, Ordering::SeqCst);
        }

        fn stored(&self, player_id: i64) -> Option<(i32, u32, u64)> {
            self.inner
                .get_stat(player_id)
                .unwrap()
                .map(|r| (r.lives, r.level, r.score))
        }
    }

    impl SessionStore for FlakyStore {
        fn get_stat(&self, player_id: i64) -> Result<Option<SessionRecord>, StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Poisoned);
            }
            self.inner.get_stat(player_id)
        }
        fn update_stat(&self, record: &SessionRecord) -> Result<bool, StoreError> {
            self.inner.update_stat(record)
        }
        fn insert_stat(&self, record: &SessionRecord) -> Result<(), StoreError> {
            self.inner.insert_stat(record)
        }
        fn clear_stat(&self, player_id: i64) -> Result<(), StoreError> {
            self.inner.clear_stat(player_id)
        }
    }

    fn settings() -> Settings {
        Settings {
            player_id: 5,
            level_settle_ms: 0,
            ..Settings::default()
        }
    }

    struct Harness {
        controller: SessionController,
        dispatcher: Arc<Dispatcher>,
        engine: Arc<RecordingEngine>,
        updates: UiReceiver,
    }

    fn harness(store: Arc<dyn SessionStore>) -> Harness {
        let dispatcher = Arc::new(Dispatcher::new());
        let engine = Arc::new(RecordingEngine::default());
        let (ui, updates) = ui_queue();
        let controller = SessionController::spawn(
            &settings(),
            engine.clone(),
            store,
            dispatcher.clone(),
            ui,
        )
        .unwrap();
        Harness {
            controller,
            dispatcher,
            engine,
            updates,
        }
    }

    #[test]
    fn test_resume_pause_persists() {
        let store = Arc::new(MemoryStore::new());
        let dispatcher = Arc::new(Dispatcher::new());
        let (ui, _rx) = ui_queue();
        let controller = SessionController::spawn(
            &settings(),
            Arc::new(LoggingEngine::new()),
            store.clone(),
            dispatcher.clone(),
            ui,
        )
        .unwrap();

        controller.resume().unwrap();
        assert!(dispatcher.has_listener());
        dispatcher.score_updated(40);
        controller.pause().unwrap();
        assert!(!dispatcher.has_listener());

        let record = store.get_stat(5).unwrap().unwrap();
        assert_eq!(record.score, 40);
        assert_eq!(record.lives, 3);
        assert!(!record.board.is_empty());

        let stats = controller.stats().unwrap();
        assert_eq!(stats.phase, SessionPhase::Paused);
        controller.shutdown();
    }

    #[test]
    fn test_events_after_pause_are_dropped() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_stat(&SessionRecord {
                score: 10,
                ..SessionRecord::new(5, 2)
            })
            .unwrap();
        let h = harness(store);

        h.controller.resume().unwrap();
        h.controller.pause().unwrap();
        h.dispatcher.ball_lost();
        h.dispatcher.score_updated(1000);

        let stats = h.controller.stats().unwrap();
        assert_eq!((stats.lives, stats.score), (2, 10));
        assert!(!h.engine.running());
    }

    #[test]
    fn test_resume_loads_saved_board_and_refreshes_ui() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_stat(&SessionRecord {
                level: 1,
                score: 70,
                board: "S B\n   ".to_string(),
                ..SessionRecord::new(5, 1)
            })
            .unwrap();
        let h = harness(store);

        h.controller.resume().unwrap();
        assert!(h.engine.running());
        assert_eq!(h.engine.loaded()[0].rows(), vec!["S B", "   "]);
        assert_eq!(
            h.updates.drain(),
            vec![
                UiUpdate::CardinalityChanged(3),
                UiUpdate::LivesChanged(1),
                UiUpdate::LevelChanged(1),
                UiUpdate::ScoreChanged { score: 70, delta: 0 },
            ]
        );
    }

    #[test]
    fn test_events_apply_in_emission_order() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_stat(&SessionRecord {
                level: 2,
                score: 100,
                ..SessionRecord::new(5, 3)
            })
            .unwrap();
        let h = harness(store);
        h.controller.resume().unwrap();
        h.updates.drain();

        h.dispatcher.ball_lost();
        h.dispatcher.prize_caught(i32::from(Prize::Score1.code()));
        h.dispatcher.cardinality_changed(12);
        let stats = h.controller.stats().unwrap();

        assert_eq!((stats.lives, stats.level, stats.score), (2, 2, 92));
        assert_eq!(
            h.updates.drain(),
            vec![
                UiUpdate::ScoreChanged { score: 82, delta: -18 },
                UiUpdate::LivesChanged(2),
                UiUpdate::ScoreChanged { score: 92, delta: 10 },
                UiUpdate::CardinalityChanged(12),
            ]
        );
    }

    #[test]
    fn test_game_over_reloads_current_level() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_stat(&SessionRecord {
                level: 3,
                ..SessionRecord::new(5, 0)
            })
            .unwrap();
        let h = harness(store);
        h.controller.resume().unwrap();
        h.updates.drain();

        h.dispatcher.ball_lost();
        let stats = h.controller.stats().unwrap();

        assert_eq!((stats.lives, stats.level), (3, 3));
        assert_eq!(stats.phase, SessionPhase::Playing);
        let updates = h.updates.drain();
        assert_eq!(updates.iter().filter(|u| **u == UiUpdate::GameOver).count(), 1);
        assert_eq!(h.engine.loaded().last(), Some(&level::decode(3)));
    }

    #[test]
    fn test_level_finished_loads_next_level() {
        let h = harness(Arc::new(MemoryStore::new()));
        h.controller.resume().unwrap();

        h.dispatcher.level_finished();
        let stats = h.controller.stats().unwrap();

        assert_eq!(stats.level, 1);
        assert_eq!(h.engine.loaded(), vec![level::decode(0), level::decode(1)]);
    }

    #[test]
    fn test_reset_keeps_level() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_stat(&SessionRecord {
                level: 2,
                score: 500,
                ..SessionRecord::new(5, 1)
            })
            .unwrap();
        let h = harness(store.clone());
        h.controller.resume().unwrap();

        h.controller.reset_stat().unwrap();
        let stats = h.controller.stats().unwrap();
        assert_eq!((stats.lives, stats.level, stats.score), (3, 2, 0));
        assert_eq!(
            store.get_stat(5).unwrap(),
            Some(SessionRecord {
                level: 2,
                ..SessionRecord::new(5, 3)
            })
        );
    }

    #[test]
    fn test_failed_persist_is_reported() {
        let h = harness(Arc::new(BrokenStore));
        h.controller.resume().unwrap();
        h.dispatcher.score_updated(30);

        let err = h.controller.pause().unwrap_err();
        assert!(matches!(err, ControllerError::Store(StoreError::Poisoned)));

        let stats = h.controller.stats().unwrap();
        assert_eq!(stats.score, 30);
        assert_eq!(stats.phase, SessionPhase::Paused);
    }

    #[test]
    fn test_read_failure_on_resume_keeps_paused_progress() {
        let store = Arc::new(FlakyStore::default());
        let h = harness(store.clone());
        h.controller.resume().unwrap();
        h.dispatcher.score_updated(400);
        h.dispatcher.level_finished();
        h.controller.pause().unwrap();
        assert_eq!(store.stored(5), Some((3, 1, 400)));

        store.fail_reads();
        let err = h.controller.resume().unwrap_err();
        assert!(matches!(err, ControllerError::Store(StoreError::Poisoned)));

        let stats = h.controller.stats().unwrap();
        assert_eq!((stats.lives, stats.level, stats.score), (3, 1, 400));
        assert_eq!(stats.phase, SessionPhase::Playing);
        assert!(h.dispatcher.has_listener());

        h.dispatcher.score_updated(5);
        h.controller.pause().unwrap();
        assert_eq!(store.stored(5), Some((3, 1, 405)));
    }

    #[test]
    fn test_read_failure_on_first_resume_never_overwrites_record() {
        let store = Arc::new(FlakyStore::default());
        store
            .insert_stat(&SessionRecord {
                level: 3,
                score: 900,
                ..SessionRecord::new(5, 2)
            })
            .unwrap();
        store.fail_reads();
        let h = harness(store.clone());

        assert!(h.controller.resume().is_err());
        let stats = h.controller.stats().unwrap();
        assert_eq!((stats.lives, stats.level, stats.score), (3, 0, 0));

        h.dispatcher.score_updated(10);
        let err = h.controller.pause().unwrap_err();
        assert!(matches!(err, ControllerError::Store(StoreError::DuplicateKey(5))));
        assert_eq!(store.stored(5), Some((2, 3, 900)));
    }

    #[test]
    fn test_read_failure_without_record_still_saves() {
        let store = Arc::new(FlakyStore::default());
        store.fail_reads();
        let h = harness(store.clone());

        assert!(h.controller.resume().is_err());
        h.dispatcher.score_updated(10);
        h.controller.pause().unwrap();
        assert_eq!(store.stored(5), Some((3, 0, 10)));
    }

    #[test]
    fn test_reset_from_pause_resumes_play() {
        let h = harness(Arc::new(MemoryStore::new()));
        h.controller.resume().unwrap();
        h.controller.pause().unwrap();
        assert!(!h.engine.running());

        h.controller.reset_stat().unwrap();
        assert!(h.dispatcher.has_listener());
        assert!(h.engine.running());

        h.dispatcher.score_updated(12);
        let stats = h.controller.stats().unwrap();
        assert_eq!(stats.phase, SessionPhase::Playing);
        assert_eq!(stats.score, 12);
    }

    #[test]
    fn test_requests_after_shutdown_fail() {
        let h = harness(Arc::new(MemoryStore::new()));
        let tx = h.controller.tx.clone();
        h.controller.shutdown();
        assert!(tx.send(Message::Shutdown).is_err());
    }
}
