//! JSON file session store
//!
//! All records live in one JSON document. Every write goes to a sibling
//! `.tmp` file first and is renamed over the live file, so a crash mid-write
//! leaves the previous document intact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::{SessionRecord, SessionStore, StoreError};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: Vec<SessionRecord>,
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether anything has ever been saved
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read(&self) -> Result<StoreFile, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => {
                let file: StoreFile = serde_json::from_str(&json)?;
                if file.version != FORMAT_VERSION {
                    log::warn!(
                        "Session store {} has version {}, expected {}",
                        self.path.display(),
                        file.version,
                        FORMAT_VERSION
                    );
                }
                Ok(file)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(StoreFile {
                version: FORMAT_VERSION,
                records: Vec::new(),
            }),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, mut file: StoreFile) -> Result<(), StoreError> {
        file.version = FORMAT_VERSION;
        file.records.sort_by_key(|r| r.player_id);
        let json = serde_json::to_string_pretty(&file)?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        log::debug!(
            "Session store written ({} records) to {}",
            file.records.len(),
            self.path.display()
        );
        Ok(())
    }

    fn with_file<T>(
        &self,
        f: impl FnOnce(&mut StoreFile) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let _guard = self.guard.lock().map_err(|_| StoreError::Poisoned)?;
        let mut file = self.read()?;
        let (value, dirty) = f(&mut file)?;
        if dirty {
            self.write(file)?;
        }
        Ok(value)
    }
}

impl SessionStore for JsonFileStore {
    fn get_stat(&self, player_id: i64) -> Result<Option<SessionRecord>, StoreError> {
        self.with_file(|file| {
            let record = file
                .records
                .iter()
                .find(|r| r.player_id == player_id)
                .cloned();
            Ok((record, false))
        })
    }

    fn update_stat(&self, record: &SessionRecord) -> Result<bool, StoreError> {
        self.with_file(|file| {
            match file
                .records
                .iter_mut()
                .find(|r| r.player_id == record.player_id)
            {
                Some(existing) => {
                    *existing = record.clone();
                    Ok((true, true))
                }
                None => Ok((false, false)),
            }
        })
    }

    fn insert_stat(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.with_file(|file| {
            if file.records.iter().any(|r| r.player_id == record.player_id) {
                return Err(StoreError::DuplicateKey(record.player_id));
            }
            file.records.push(record.clone());
            Ok(((), true))
        })
    }

    fn clear_stat(&self, player_id: i64) -> Result<(), StoreError> {
        self.with_file(|file| {
            let before = file.records.len();
            file.records.retain(|r| r.player_id != player_id);
            Ok(((), file.records.len() != before))
        })
    }
}
