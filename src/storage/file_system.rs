use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::types::AccountId;

/// Per-account JSON files under a base directory
///
/// Layout: `<base>/<account_id>/<file>`. Writes go through a temp file and a
/// rename, so a reader sees either the old or the new contents.
#[derive(Clone, Debug)]
pub struct AccountFiles {
    base_path: PathBuf,
}

impl AccountFiles {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Get the base directory path
    pub fn base_dir(&self) -> &Path {
        &self.base_path
    }

    /// Get the directory path for a specific account
    fn account_dir(&self, account_id: &AccountId) -> PathBuf {
        self.base_path.join(encode_account_dir(account_id.as_str()))
    }

    pub fn path(&self, account_id: &AccountId, file: &str) -> PathBuf {
        self.account_dir(account_id).join(file)
    }

    /// Load a JSON file, or `None` if it was never written
    pub fn load<T: DeserializeOwned>(
        &self,
        account_id: &AccountId,
        file: &str,
    ) -> Result<Option<T>, StorageError> {
        let path = self.path(account_id, file);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let value = serde_json::from_str(&contents)?;
        Ok(Some(value))
    }

    /// Replace a JSON file atomically
    pub fn save<T: Serialize>(
        &self,
        account_id: &AccountId,
        file: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let dir = self.account_dir(account_id);
        fs::create_dir_all(&dir)?;

        let path = dir.join(file);
        let tmp_path = dir.join(format!("{}.tmp", file));
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// Encode an account id as a single path component
///
/// ASCII alphanumerics and `-` pass through; every other byte, `_`
/// included, becomes `_xx` (lowercase hex). The mapping is injective and
/// never yields `.`, `..` or a separator.
fn encode_account_dir(id: &str) -> String {
    let mut encoded = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push('_');
            encoded.push_str(&hex::encode([byte]));
        }
    }
    encoded
}
