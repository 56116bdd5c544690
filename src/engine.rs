//! Simulation engine boundary
//!
//! The engine runs physics and rendering on its own thread. This crate only
//! sends it commands through [`Engine`] and receives its events through the
//! dispatcher.

use crate::level::LevelDescriptor;

/// Opaque handle to a native drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u64);

/// Opaque handle to loaded assets (textures, sounds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub u64);

/// Inbound command surface of the simulation. Implementations must be
/// callable from any thread.
pub trait Engine: Send + Sync {
    fn start(&self);
    fn stop(&self);
    fn destroy(&self);

    /// Attach a surface, or detach with `None` when it is destroyed
    fn set_surface(&self, surface: Option<SurfaceHandle>);
    fn set_attached_resources(&self, resources: ResourceHandle);
    fn load_resources(&self);

    /// Replace the board with `layout`
    fn load_level(&self, layout: &LevelDescriptor);
    /// Encoded snapshot of the board as it is right now
    fn save_level(&self) -> String;

    /// Move the paddle to `position` (raw touch signal, not smoothed)
    fn shift_paddle(&self, position: f32);
    /// Launch the ball at `angle` radians
    fn throw_ball(&self, angle: f32);
}

/// Engine that only logs what it is asked to do. Used by the headless binary.
#[derive(Debug, Default)]
pub struct LoggingEngine {
    board: std::sync::Mutex<Option<LevelDescriptor>>,
}

impl LoggingEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Engine for LoggingEngine {
    fn start(&self) {
        log::info!("engine: start");
    }

    fn stop(&self) {
        log::info!("engine: stop");
    }

    fn destroy(&self) {
        log::info!("engine: destroy");
    }

    fn set_surface(&self, surface: Option<SurfaceHandle>) {
        log::info!("engine: surface {surface:?}");
    }

    fn set_attached_resources(&self, resources: ResourceHandle) {
        log::info!("engine: resources {resources:?}");
    }

    fn load_resources(&self) {
        log::info!("engine: load resources");
    }

    fn load_level(&self, layout: &LevelDescriptor) {
        log::info!(
            "engine: load level {}x{} ({} hits)",
            layout.width(),
            layout.height(),
            layout.cardinality()
        );
        if let Ok(mut board) = self.board.lock() {
            *board = Some(layout.clone());
        }
    }

    fn save_level(&self) -> String {
        self.board
            .lock()
            .ok()
            .and_then(|board| board.as_ref().map(LevelDescriptor::encode))
            .unwrap_or_default()
    }

    fn shift_paddle(&self, position: f32) {
        log::debug!("engine: paddle -> {position}");
    }

    fn throw_ball(&self, angle: f32) {
        log::debug!("engine: throw ball at {angle}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level;

    #[test]
    fn test_logging_engine_saves_last_loaded_board() {
        let engine = LoggingEngine::new();
        assert_eq!(engine.save_level(), "");

        let layout = level::decode(3);
        engine.load_level(&layout);
        assert_eq!(LevelDescriptor::decode_snapshot(&engine.save_level()), Some(layout));
    }
}
