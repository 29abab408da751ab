//! Active-account access
//!
//! The engine never mutates accounts; it only asks "who is active right now"
//! at the moment a chain-ready event arrives.

use std::sync::RwLock;

use crate::types::Account;

/// Synchronous read of the currently active account
pub trait AccountSource: Send + Sync {
    fn active_account(&self) -> Option<Account>;
}

/// Process-local holder of the active account
///
/// Whoever owns account switching calls [`ActiveAccount::set`]; the
/// coordinator only reads.
#[derive(Default)]
pub struct ActiveAccount {
    current: RwLock<Option<Account>>,
}

impl ActiveAccount {
    pub fn new(account: Option<Account>) -> Self {
        Self {
            current: RwLock::new(account),
        }
    }

    pub fn set(&self, account: Option<Account>) {
        match self.current.write() {
            Ok(mut current) => *current = account,
            Err(poisoned) => *poisoned.into_inner() = account,
        }
    }
}

impl AccountSource for ActiveAccount {
    fn active_account(&self) -> Option<Account> {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
