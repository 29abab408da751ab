/// Discovery Manager - Wiring Layer
///
/// Builds the file-backed stores, one history provider per enabled chain
/// family and the coordinator from a [`DiscoveryConfig`].
use std::collections::HashMap;
use std::sync::Arc;

use crate::account::{AccountSource, ActiveAccount};
use crate::catalog::{CoinCatalog, CoinResolver};
use crate::config::DiscoveryConfig;
use crate::coordinator::SyncCoordinator;
use crate::error::DiscoveryError;
use crate::holdings::HoldingsRegistry;
use crate::provider::Eip20HistoryProvider;
use crate::storage::{AccountFiles, FileHoldingsStore, FileSyncStateStore};
use crate::types::{Account, ChainConnection, ChainFamily, EvmAddress, Holding};

pub struct DiscoveryManager {
    pub config: DiscoveryConfig,
    accounts: Arc<ActiveAccount>,
    holdings: HoldingsRegistry,
    coordinator: Arc<SyncCoordinator>,
}

impl DiscoveryManager {
    pub fn new(
        config: DiscoveryConfig,
        catalog: Arc<dyn CoinCatalog>,
    ) -> Result<Self, DiscoveryError> {
        if config.history_apis.is_empty() {
            return Err(DiscoveryError::Config("no chain families enabled".to_string()));
        }

        let files = AccountFiles::new(config.data_dir.clone());
        let accounts = Arc::new(ActiveAccount::default());
        let holdings = HoldingsRegistry::new(Arc::new(FileHoldingsStore::new(files.clone())));

        let mut coordinator = SyncCoordinator::new(
            accounts.clone(),
            Arc::new(FileSyncStateStore::new(files)),
            CoinResolver::new(catalog),
            holdings.clone(),
        );

        for api in &config.history_apis {
            let provider = Eip20HistoryProvider::new(api.clone())?;
            coordinator = coordinator.with_provider(Arc::new(provider));
        }

        Ok(Self {
            config,
            accounts,
            holdings,
            coordinator: Arc::new(coordinator),
        })
    }

    pub fn set_active_account(&self, account: Option<Account>) {
        self.accounts.set(account);
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    /// Holdings of the active account (empty if there is none)
    pub fn active_holdings(&self) -> Result<Vec<Holding>, DiscoveryError> {
        match self.accounts.active_account() {
            Some(account) => Ok(self.holdings.existing_holdings(&account)?),
            None => Ok(Vec::new()),
        }
    }

    /// Signal every enabled chain as ready and wait for the passes to finish
    ///
    /// Families without an address in `addresses` still get an event; their
    /// pass is a no-op.
    pub async fn sync_all(&self, addresses: &HashMap<ChainFamily, EvmAddress>) {
        let handles: Vec<_> = self
            .config
            .families()
            .into_iter()
            .filter_map(|family| {
                let chain = ChainConnection::new(family, addresses.get(&family).copied());
                self.coordinator.on_chain_ready(chain)
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                log::error!("Discovery task panicked: {}", e);
            }
        }
    }
}
