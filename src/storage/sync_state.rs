//! Sync cursor persistence
//!
//! Cursors are upserted by (account_id, chain_id); the last write wins.
//! Keeping them monotonic is the coordinator's job, not the store's.

use std::collections::HashMap;
use std::sync::Mutex;

use super::file_system::AccountFiles;
use crate::error::StorageError;
use crate::types::{AccountId, SyncCursor};

const SYNC_STATE_FILE: &str = "sync_state.json";

pub trait SyncStateStore: Send + Sync {
    /// Most recently written cursor, or `None` if this pair was never synced
    fn read(&self, account_id: &AccountId, chain_id: u64) -> Result<Option<SyncCursor>, StorageError>;

    /// Upsert the cursor for its (account_id, chain_id)
    fn write(&self, cursor: &SyncCursor) -> Result<(), StorageError>;
}

/// Cursors in `<base>/<account_id>/sync_state.json`
pub struct FileSyncStateStore {
    files: AccountFiles,
    // Chains of one account share a file; serialize read-modify-write.
    write_lock: Mutex<()>,
}

impl FileSyncStateStore {
    pub fn new(files: AccountFiles) -> Self {
        Self {
            files,
            write_lock: Mutex::new(()),
        }
    }

    fn load_all(&self, account_id: &AccountId) -> Result<Vec<SyncCursor>, StorageError> {
        Ok(self
            .files
            .load::<Vec<SyncCursor>>(account_id, SYNC_STATE_FILE)?
            .unwrap_or_default())
    }
}

impl SyncStateStore for FileSyncStateStore {
    fn read(&self, account_id: &AccountId, chain_id: u64) -> Result<Option<SyncCursor>, StorageError> {
        Ok(self
            .load_all(account_id)?
            .into_iter()
            .find(|cursor| cursor.account_id == *account_id && cursor.chain_id == chain_id))
    }

    fn write(&self, cursor: &SyncCursor) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("sync state lock poisoned".to_string()))?;

        let mut cursors = self.load_all(&cursor.account_id)?;
        match cursors
            .iter_mut()
            .find(|c| c.account_id == cursor.account_id && c.chain_id == cursor.chain_id)
        {
            Some(existing) => *existing = cursor.clone(),
            None => cursors.push(cursor.clone()),
        }
        cursors.sort_by_key(|c| c.chain_id);

        self.files.save(&cursor.account_id, SYNC_STATE_FILE, &cursors)?;
        log::debug!(
            "Saved sync cursor {} for account {} on chain {}",
            cursor.last_transaction_block_number,
            cursor.account_id,
            cursor.chain_id
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySyncStateStore {
    cursors: Mutex<HashMap<(AccountId, u64), SyncCursor>>,
}

impl InMemorySyncStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncStateStore for InMemorySyncStateStore {
    fn read(&self, account_id: &AccountId, chain_id: u64) -> Result<Option<SyncCursor>, StorageError> {
        let cursors = self
            .cursors
            .lock()
            .map_err(|_| StorageError::Unavailable("sync state lock poisoned".to_string()))?;
        Ok(cursors.get(&(account_id.clone(), chain_id)).cloned())
    }

    fn write(&self, cursor: &SyncCursor) -> Result<(), StorageError> {
        let mut cursors = self
            .cursors
            .lock()
            .map_err(|_| StorageError::Unavailable("sync state lock poisoned".to_string()))?;
        cursors.insert((cursor.account_id.clone(), cursor.chain_id), cursor.clone());
        Ok(())
    }
}
