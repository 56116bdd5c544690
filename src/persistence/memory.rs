//! In-memory session store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{SessionRecord, SessionStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<i64, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (0 if the lock is poisoned)
    pub fn len(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<i64, SessionRecord>>, StoreError> {
        self.records.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SessionStore for MemoryStore {
    fn get_stat(&self, player_id: i64) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.lock()?.get(&player_id).cloned())
    }

    fn update_stat(&self, record: &SessionRecord) -> Result<bool, StoreError> {
        let mut records = self.lock()?;
        match records.get_mut(&record.player_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn insert_stat(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let mut records = self.lock()?;
        if records.contains_key(&record.player_id) {
            return Err(StoreError::DuplicateKey(record.player_id));
        }
        records.insert(record.player_id, record.clone());
        Ok(())
    }

    fn clear_stat(&self, player_id: i64) -> Result<(), StoreError> {
        self.lock()?.remove(&player_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_record() {
        let store = MemoryStore::new();
        assert_eq!(store.get_stat(9).unwrap(), None);
        assert!(!store.update_stat(&SessionRecord::new(9, 3)).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        store.insert_stat(&SessionRecord::new(1, 3)).unwrap();
        store.clear_stat(1).unwrap();
        store.clear_stat(1).unwrap();
        assert_eq!(store.get_stat(1).unwrap(), None);
    }
}
