//! Session record persistence
//!
//! The store is keyed by player id and holds one record per player:
//! lives, level, score and an optional board snapshot.
//!
//! Backends:
//! - `memory`: mutex-guarded map, for tests and ephemeral sessions
//! - `file`: single JSON document, rewritten through a temp file

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted state of one player's session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub player_id: i64,
    pub lives: i32,
    /// Index into the level catalog
    pub level: u32,
    pub score: u64,
    /// Encoded board snapshot, empty when the level should start fresh
    #[serde(default)]
    pub board: String,
}

impl SessionRecord {
    /// Fresh record for a player with no history
    pub fn new(player_id: i64, lives: i32) -> Self {
        Self {
            player_id,
            lives,
            level: 0,
            score: 0,
            board: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player {0} already has a session record")]
    DuplicateKey(i64),
    #[error("session store i/o failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session store is corrupt: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("session store lock poisoned")]
    Poisoned,
}

/// Key-value store of session records
pub trait SessionStore: Send + Sync {
    /// Record for `player_id`, if one was ever saved
    fn get_stat(&self, player_id: i64) -> Result<Option<SessionRecord>, StoreError>;

    /// Overwrite an existing record. Returns `false` if the player is unknown.
    fn update_stat(&self, record: &SessionRecord) -> Result<bool, StoreError>;

    /// Add a record for a new player. Fails with
    /// [`StoreError::DuplicateKey`] if the player already has one.
    fn insert_stat(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Remove the player's record (no-op if absent)
    fn clear_stat(&self, player_id: i64) -> Result<(), StoreError>;
}

/// Insert `record`, falling back to an update when the player already
/// exists. Saving the same record twice leaves the store unchanged.
pub fn save_record(store: &dyn SessionStore, record: &SessionRecord) -> Result<(), StoreError> {
    match store.insert_stat(record) {
        Ok(()) => {
            log::debug!("Inserted session record for player {}", record.player_id);
            Ok(())
        }
        Err(StoreError::DuplicateKey(id)) => {
            log::debug!("Player {id} already stored, updating instead");
            if store.update_stat(record)? {
                Ok(())
            } else {
                // Cleared between the two calls
                store.insert_stat(record)
            }
        }
        Err(e) => Err(e),
    }
}
