//! Holdings persistence
//!
//! `save` is a batch upsert keyed by (account_id, coin_type): saving a
//! holding that already exists keeps the stored one.

use std::collections::HashMap;
use std::sync::Mutex;

use super::file_system::AccountFiles;
use crate::error::StorageError;
use crate::types::{AccountId, Holding};

const HOLDINGS_FILE: &str = "holdings.json";

pub trait HoldingsStore: Send + Sync {
    fn holdings(&self, account_id: &AccountId) -> Result<Vec<Holding>, StorageError>;

    /// Persist a batch of holdings in one write
    fn save(&self, holdings: &[Holding]) -> Result<(), StorageError>;
}

/// Append holdings not yet present, preserving existing order
fn upsert(existing: &mut Vec<Holding>, batch: impl IntoIterator<Item = Holding>) -> usize {
    let mut added = 0;
    for holding in batch {
        let duplicate = existing.iter().any(|h| {
            h.account_id == holding.account_id && h.coin_type() == holding.coin_type()
        });
        if !duplicate {
            existing.push(holding);
            added += 1;
        }
    }
    added
}

/// Holdings in `<base>/<account_id>/holdings.json`
pub struct FileHoldingsStore {
    files: AccountFiles,
    write_lock: Mutex<()>,
}

impl FileHoldingsStore {
    pub fn new(files: AccountFiles) -> Self {
        Self {
            files,
            write_lock: Mutex::new(()),
        }
    }
}

impl FileHoldingsStore {
    /// Every row in the account's file, whoever it belongs to
    fn load_file(&self, account_id: &AccountId) -> Result<Vec<Holding>, StorageError> {
        Ok(self
            .files
            .load::<Vec<Holding>>(account_id, HOLDINGS_FILE)?
            .unwrap_or_default())
    }
}

impl HoldingsStore for FileHoldingsStore {
    fn holdings(&self, account_id: &AccountId) -> Result<Vec<Holding>, StorageError> {
        let mut holdings = self.load_file(account_id)?;
        holdings.retain(|h| h.account_id == *account_id);
        Ok(holdings)
    }

    fn save(&self, holdings: &[Holding]) -> Result<(), StorageError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("holdings lock poisoned".to_string()))?;

        let mut by_account: HashMap<&AccountId, Vec<Holding>> = HashMap::new();
        for holding in holdings {
            by_account
                .entry(&holding.account_id)
                .or_default()
                .push(holding.clone());
        }

        for (account_id, batch) in by_account {
            let mut stored = self.load_file(account_id)?;
            if upsert(&mut stored, batch) > 0 {
                self.files.save(account_id, HOLDINGS_FILE, &stored)?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryHoldingsStore {
    holdings: Mutex<HashMap<AccountId, Vec<Holding>>>,
}

impl InMemoryHoldingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HoldingsStore for InMemoryHoldingsStore {
    fn holdings(&self, account_id: &AccountId) -> Result<Vec<Holding>, StorageError> {
        let holdings = self
            .holdings
            .lock()
            .map_err(|_| StorageError::Unavailable("holdings lock poisoned".to_string()))?;
        Ok(holdings.get(account_id).cloned().unwrap_or_default())
    }

    fn save(&self, batch: &[Holding]) -> Result<(), StorageError> {
        let mut holdings = self
            .holdings
            .lock()
            .map_err(|_| StorageError::Unavailable("holdings lock poisoned".to_string()))?;
        for holding in batch {
            let stored = holdings.entry(holding.account_id.clone()).or_default();
            upsert(stored, std::iter::once(holding.clone()));
        }
        Ok(())
    }
}
