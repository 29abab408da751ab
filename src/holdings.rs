use std::collections::HashSet;
use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::HoldingsStore;
use crate::types::{Account, CoinRecord, CoinType, Holding};

/// Tracked-asset set per account
///
/// Discovery only ever adds holdings; removal is a user action handled
/// elsewhere.
#[derive(Clone)]
pub struct HoldingsRegistry {
    store: Arc<dyn HoldingsStore>,
}

impl HoldingsRegistry {
    pub fn new(store: Arc<dyn HoldingsStore>) -> Self {
        Self { store }
    }

    pub fn existing_holdings(&self, account: &Account) -> Result<Vec<Holding>, StorageError> {
        self.store.holdings(&account.id)
    }

    /// Add holdings for coins the account does not track yet
    ///
    /// Creates everything new in a single store write and returns what was
    /// created; writes nothing if every coin is already held.
    pub fn merge(
        &self,
        account: &Account,
        coins: Vec<CoinRecord>,
    ) -> Result<Vec<Holding>, StorageError> {
        let mut held: HashSet<CoinType> = self
            .existing_holdings(account)?
            .iter()
            .map(Holding::coin_type)
            .collect();

        let new_holdings: Vec<Holding> = coins
            .into_iter()
            .filter(|coin| held.insert(coin.coin_type))
            .map(|coin| Holding::new(account.id.clone(), coin))
            .collect();

        if new_holdings.is_empty() {
            return Ok(new_holdings);
        }

        self.store.save(&new_holdings)?;
        log::info!(
            "Added {} holding(s) for account {}: {}",
            new_holdings.len(),
            account.id,
            new_holdings
                .iter()
                .map(|h| h.coin.code.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(new_holdings)
    }
}
