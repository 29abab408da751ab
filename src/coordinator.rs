//! Sync Coordinator
//!
//! Turns chain-ready events into discovery passes:
//!
//! ```text
//! chain ready ─► read cursor ─► fetch(address, cursor + 1) ─► resolve ─► merge holdings ─► write cursor
//! ```
//!
//! ## Guarantees
//!
//! - At most one pass in flight per (account, chain). A trigger that arrives
//!   while a pass is running for the same key is dropped, not queued.
//! - A failed fetch leaves no trace: no holdings merged, cursor untouched.
//!   The next chain-ready event retries from the same cursor.
//! - The stored cursor never moves backwards, even if a provider reports a
//!   lower block than was stored before.
//! - Nothing a pass does is reported back to the trigger; failures are only
//!   logged.
//!
//! ## Lifetime
//!
//! The coordinator is shared as `Arc<SyncCoordinator>`. Every spawned pass and
//! every [`SyncCoordinator::listen`] task holds its own clone, so the
//! coordinator stays alive until the last listener's channel closes and the
//! last pass finishes.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::account::AccountSource;
use crate::catalog::CoinResolver;
use crate::error::DiscoveryError;
use crate::holdings::HoldingsRegistry;
use crate::provider::TransferHistoryProvider;
use crate::storage::SyncStateStore;
use crate::types::{Account, AccountId, ChainConnection, ChainFamily, Holding, SyncCursor, TokenId};

/// Key for in-flight deduplication and cursor storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncKey {
    pub account_id: AccountId,
    pub chain_id: u64,
}

/// Why a pass did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipCause {
    NoActiveAccount,
    NoChainAddress,
    NoProvider(ChainFamily),
    AlreadyInFlight,
}

#[derive(Debug)]
pub enum PassOutcome {
    Skipped(SkipCause),
    Completed {
        new_holdings: Vec<Holding>,
        /// Cursor after the pass (`None` if the pair has never seen activity)
        cursor: Option<u64>,
        /// Token ids dropped because the catalog does not know them
        unresolved: usize,
    },
}

/// Marks a key as in flight until dropped
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<SyncKey>>>,
    key: SyncKey,
}

impl InFlightGuard {
    fn acquire(in_flight: &Arc<Mutex<HashSet<SyncKey>>>, key: SyncKey) -> Option<Self> {
        let mut keys = in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !keys.insert(key.clone()) {
            return None;
        }
        Some(Self {
            in_flight: Arc::clone(in_flight),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut keys = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        keys.remove(&self.key);
    }
}

pub struct SyncCoordinator {
    accounts: Arc<dyn AccountSource>,
    sync_states: Arc<dyn SyncStateStore>,
    providers: HashMap<ChainFamily, Arc<dyn TransferHistoryProvider>>,
    resolver: CoinResolver,
    holdings: HoldingsRegistry,
    in_flight: Arc<Mutex<HashSet<SyncKey>>>,
}

impl SyncCoordinator {
    pub fn new(
        accounts: Arc<dyn AccountSource>,
        sync_states: Arc<dyn SyncStateStore>,
        resolver: CoinResolver,
        holdings: HoldingsRegistry,
    ) -> Self {
        Self {
            accounts,
            sync_states,
            providers: HashMap::new(),
            resolver,
            holdings,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Register the history provider for its chain family
    pub fn with_provider(mut self, provider: Arc<dyn TransferHistoryProvider>) -> Self {
        self.providers.insert(provider.family(), provider);
        self
    }

    pub fn families(&self) -> Vec<ChainFamily> {
        let mut families: Vec<_> = self.providers.keys().copied().collect();
        families.sort();
        families
    }

    /// Whether a pass is currently running for this key
    pub fn is_in_flight(&self, account_id: &AccountId, chain_id: u64) -> bool {
        let keys = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        keys.contains(&SyncKey {
            account_id: account_id.clone(),
            chain_id,
        })
    }

    /// Chain-ready trigger
    ///
    /// Spawns one discovery pass for the active account on the tokio
    /// runtime, unless there is no active account or a pass for the same
    /// (account, chain) is already running. The returned handle only
    /// signals completion; the pass's result is logged, never returned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_chain_ready(self: &Arc<Self>, chain: ChainConnection) -> Option<JoinHandle<()>> {
        let (account, guard) = match self.begin_pass(&chain) {
            Ok(started) => started,
            Err(cause) => {
                log::debug!("Chain {} ready, no pass started: {:?}", chain.family, cause);
                return None;
            }
        };

        let coordinator = Arc::clone(self);
        Some(tokio::spawn(async move {
            let _guard = guard;
            coordinator.report(&account, &chain, coordinator.run_sync(&account, &chain).await);
        }))
    }

    /// Run a pass on the current task, honoring the in-flight rule
    pub async fn sync_now(&self, chain: &ChainConnection) -> Result<PassOutcome, DiscoveryError> {
        let (account, _guard) = match self.begin_pass(chain) {
            Ok(started) => started,
            Err(cause) => return Ok(PassOutcome::Skipped(cause)),
        };
        self.run_sync(&account, chain).await
    }

    /// Consume a chain-ready event stream until its sender is dropped
    pub fn listen(
        self: &Arc<Self>,
        mut events: mpsc::UnboundedReceiver<ChainConnection>,
    ) -> JoinHandle<()> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(chain) = events.recv().await {
                coordinator.on_chain_ready(chain);
            }
            log::debug!("Chain-ready stream closed");
        })
    }

    fn begin_pass(&self, chain: &ChainConnection) -> Result<(Account, InFlightGuard), SkipCause> {
        let account = self.accounts.active_account().ok_or(SkipCause::NoActiveAccount)?;
        let key = SyncKey {
            account_id: account.id.clone(),
            chain_id: chain.chain_id,
        };
        let guard = InFlightGuard::acquire(&self.in_flight, key).ok_or(SkipCause::AlreadyInFlight)?;
        Ok((account, guard))
    }

    /// One discovery pass: fetch → resolve → merge → persist cursor
    ///
    /// Does not check the in-flight set; callers that may race on the same
    /// key go through [`Self::on_chain_ready`] or [`Self::sync_now`].
    pub async fn run_sync(
        &self,
        account: &Account,
        chain: &ChainConnection,
    ) -> Result<PassOutcome, DiscoveryError> {
        let Some(address) = chain.address else {
            return Ok(PassOutcome::Skipped(SkipCause::NoChainAddress));
        };
        let Some(provider) = self.providers.get(&chain.family) else {
            return Ok(PassOutcome::Skipped(SkipCause::NoProvider(chain.family)));
        };

        let stored = self.sync_states.read(&account.id, chain.chain_id)?;
        let start_block = stored.as_ref().map(SyncCursor::next_start_block);
        let previous = stored.map(|cursor| cursor.last_transaction_block_number);

        let history = provider.fetch(&address, start_block).await?;
        log::debug!(
            "{} history for {}: {} token(s) [{}], last block {:?}",
            chain.family,
            address,
            history.token_ids.len(),
            token_summary(&history.token_ids),
            history.last_transaction_block_number
        );

        let resolution = self.resolver.resolve(&history.token_ids)?;
        let unresolved = resolution.skipped.len();
        let new_holdings = self.holdings.merge(account, resolution.resolved)?;

        let cursor = match history.last_transaction_block_number {
            Some(reported) => {
                let next = previous.map_or(reported, |prev| prev.max(reported));
                if previous != Some(next) {
                    self.sync_states
                        .write(&SyncCursor::new(account.id.clone(), chain.chain_id, next))?;
                } else if reported < next {
                    log::warn!(
                        "{} provider reported block {} below stored cursor {}, keeping cursor",
                        chain.family,
                        reported,
                        next
                    );
                }
                Some(next)
            }
            None => previous,
        };

        Ok(PassOutcome::Completed {
            new_holdings,
            cursor,
            unresolved,
        })
    }

    fn report(
        &self,
        account: &Account,
        chain: &ChainConnection,
        result: Result<PassOutcome, DiscoveryError>,
    ) {
        match result {
            Ok(PassOutcome::Completed {
                new_holdings,
                cursor,
                unresolved,
            }) => log::info!(
                "Discovery on {} for account {} done: {} new holding(s), {} unresolved, cursor {:?}",
                chain.family,
                account.id,
                new_holdings.len(),
                unresolved,
                cursor
            ),
            Ok(PassOutcome::Skipped(cause)) => log::debug!(
                "Discovery on {} for account {} skipped: {:?}",
                chain.family,
                account.id,
                cause
            ),
            Err(e) => log::warn!(
                "Discovery on {} for account {} abandoned: {}",
                chain.family,
                account.id,
                e
            ),
        }
    }
}

/// Contract addresses of a history, for logging
fn token_summary(token_ids: &BTreeSet<TokenId>) -> String {
    token_ids
        .iter()
        .map(|id| id.contract.to_hex())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let key = SyncKey {
            account_id: AccountId::new("a"),
            chain_id: 1,
        };

        let guard = InFlightGuard::acquire(&in_flight, key.clone()).unwrap();
        assert!(InFlightGuard::acquire(&in_flight, key.clone()).is_none());

        let other_chain = SyncKey {
            chain_id: 56,
            ..key.clone()
        };
        assert!(InFlightGuard::acquire(&in_flight, other_chain).is_some());

        drop(guard);
        assert!(InFlightGuard::acquire(&in_flight, key).is_some());
    }
}
