//! Session settings and tuning
//!
//! Persisted as JSON next to the session store. Missing fields take their
//! default value so older settings files keep loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    DEFAULT_LIVES, DEFAULT_PENALTY_FACTOR, DEFAULT_SCORE_AWARDS, DEFAULT_WIN_BONUS,
    LEVEL_SETTLE_MS,
};
use crate::prize::DEFAULT_DROP_PROBABILITY;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Player ===
    /// Player whose record is loaded and saved
    pub player_id: i64,
    /// Lives at the start of a session and after game over
    pub initial_lives: i32,

    // === Scoring ===
    /// Ball-lost penalty is `penalty_factor * (level + 1)^2`
    pub penalty_factor: u64,
    /// Bonus for catching the Win prize
    pub win_bonus: u64,
    /// Awards for the five score prizes
    pub score_awards: [u64; 5],
    /// Chance a broken block drops a prize
    pub drop_probability: f64,

    // === Engine ===
    /// How long to let the simulation settle after a level is finished
    /// before sending it the next layout
    pub level_settle_ms: u64,

    // === Storage ===
    /// Session store file
    pub store_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            player_id: 0,
            initial_lives: DEFAULT_LIVES,

            penalty_factor: DEFAULT_PENALTY_FACTOR,
            win_bonus: DEFAULT_WIN_BONUS,
            score_awards: DEFAULT_SCORE_AWARDS,
            drop_probability: DEFAULT_DROP_PROBABILITY,

            level_settle_ms: LEVEL_SETTLE_MS,

            store_path: PathBuf::from("arkanoid_stats.json"),
        }
    }
}

impl Settings {
    pub fn level_settle_delay(&self) -> Duration {
        Duration::from_millis(self.level_settle_ms)
    }

    /// Read settings from `path`
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read settings from `path`, using defaults if it is missing or broken
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
