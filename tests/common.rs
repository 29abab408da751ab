//! Common test utilities for discovery integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scripted in-process history provider with call recording and a gate
//! - Stores that fail on demand
//! - A harness wiring the coordinator over in-memory collaborators

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use token_discovery::{
    Account, AccountId, ActiveAccount, ChainConnection, ChainFamily, CoinRecord, CoinResolver,
    EvmAddress, Holding, HoldingsRegistry, HoldingsStore, InMemoryCoinCatalog,
    InMemoryHoldingsStore, InMemorySyncStateStore, ProviderError, StorageError, SyncCoordinator,
    SyncCursor, SyncStateStore, TokenId, TransferHistory, TransferHistoryProvider,
};

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

pub const ACCOUNT_ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

pub fn account_address() -> EvmAddress {
    ACCOUNT_ADDRESS.parse().expect("valid test address")
}

pub fn account(id: &str) -> Account {
    Account::new(AccountId::new(id), format!("Account {}", id))
}

pub fn eth_chain() -> ChainConnection {
    ChainConnection::new(ChainFamily::Ethereum, Some(account_address()))
}

pub fn bsc_chain() -> ChainConnection {
    ChainConnection::new(ChainFamily::BinanceSmartChain, Some(account_address()))
}

/// Token id whose contract address is `byte` repeated
pub fn token(family: ChainFamily, byte: u8) -> TokenId {
    TokenId::new(family, EvmAddress::from_bytes([byte; 20]))
}

pub fn coin(token_id: TokenId, code: &str) -> CoinRecord {
    CoinRecord {
        coin_type: token_id.coin_type(),
        code: code.to_string(),
        name: format!("{} Token", code),
        decimals: 18,
    }
}

pub fn history(tokens: &[TokenId], last_block: Option<u64>) -> TransferHistory {
    TransferHistory {
        token_ids: tokens.iter().copied().collect(),
        last_transaction_block_number: last_block,
    }
}

// ============================================================================
// Scripted provider
// ============================================================================

/// Provider that replays queued responses and records every call
///
/// With a gate, each call blocks after being recorded until a permit is
/// added, which keeps a pass in flight for as long as a test needs.
pub struct ScriptedProvider {
    family: ChainFamily,
    responses: Mutex<VecDeque<Result<TransferHistory, ProviderError>>>,
    calls: Mutex<Vec<Option<u64>>>,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedProvider {
    pub fn new(family: ChainFamily) -> Self {
        Self {
            family,
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(family: ChainFamily, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(family)
        }
    }

    pub fn push(&self, response: Result<TransferHistory, ProviderError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// `start_block` of every call, in order
    pub fn calls(&self) -> Vec<Option<u64>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TransferHistoryProvider for ScriptedProvider {
    fn family(&self) -> ChainFamily {
        self.family
    }

    async fn fetch(
        &self,
        _address: &EvmAddress,
        start_block: Option<u64>,
    ) -> Result<TransferHistory, ProviderError> {
        self.calls.lock().unwrap().push(start_block);

        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }

        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(TransferHistory::empty()))
    }
}

// ============================================================================
// Failing stores
// ============================================================================

/// In-memory cursor store whose writes can be switched to fail
#[derive(Default)]
pub struct FlakySyncStateStore {
    inner: InMemorySyncStateStore,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl SyncStateStore for FlakySyncStateStore {
    fn read(&self, account_id: &AccountId, chain_id: u64) -> Result<Option<SyncCursor>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected read failure".to_string()));
        }
        self.inner.read(account_id, chain_id)
    }

    fn write(&self, cursor: &SyncCursor) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected write failure".to_string()));
        }
        self.inner.write(cursor)
    }
}

/// In-memory holdings store whose batch saves can be switched to fail
#[derive(Default)]
pub struct FlakyHoldingsStore {
    inner: InMemoryHoldingsStore,
    pub fail_saves: AtomicBool,
}

impl HoldingsStore for FlakyHoldingsStore {
    fn holdings(&self, account_id: &AccountId) -> Result<Vec<Holding>, StorageError> {
        self.inner.holdings(account_id)
    }

    fn save(&self, holdings: &[Holding]) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("injected save failure".to_string()));
        }
        self.inner.save(holdings)
    }
}

// ============================================================================
// Harness
// ============================================================================

/// Coordinator over in-memory collaborators with one scripted provider per family
pub struct Harness {
    pub coordinator: Arc<SyncCoordinator>,
    pub accounts: Arc<ActiveAccount>,
    pub sync_states: Arc<FlakySyncStateStore>,
    pub holdings_store: Arc<FlakyHoldingsStore>,
    pub catalog: Arc<InMemoryCoinCatalog>,
    pub eth: Arc<ScriptedProvider>,
    pub bsc: Arc<ScriptedProvider>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_providers(
            ScriptedProvider::new(ChainFamily::Ethereum),
            ScriptedProvider::new(ChainFamily::BinanceSmartChain),
        )
    }

    pub fn with_providers(eth: ScriptedProvider, bsc: ScriptedProvider) -> Self {
        init_logging();

        let accounts = Arc::new(ActiveAccount::new(Some(account("alice"))));
        let sync_states = Arc::new(FlakySyncStateStore::default());
        let holdings_store = Arc::new(FlakyHoldingsStore::default());
        let catalog = Arc::new(InMemoryCoinCatalog::default());
        let eth = Arc::new(eth);
        let bsc = Arc::new(bsc);

        let coordinator = SyncCoordinator::new(
            accounts.clone(),
            sync_states.clone(),
            CoinResolver::new(catalog.clone()),
            HoldingsRegistry::new(holdings_store.clone()),
        )
        .with_provider(eth.clone())
        .with_provider(bsc.clone());

        Self {
            coordinator: Arc::new(coordinator),
            accounts,
            sync_states,
            holdings_store,
            catalog,
            eth,
            bsc,
        }
    }

    pub fn active(&self) -> Account {
        use token_discovery::AccountSource;
        self.accounts.active_account().expect("active account")
    }

    pub fn know(&self, records: &[CoinRecord]) {
        for record in records {
            self.catalog.insert(record.clone());
        }
    }

    pub fn cursor(&self, account_id: &str, chain: &ChainConnection) -> Option<u64> {
        self.sync_states
            .read(&AccountId::new(account_id), chain.chain_id)
            .unwrap()
            .map(|c| c.last_transaction_block_number)
    }

    pub fn set_cursor(&self, account_id: &str, chain: &ChainConnection, block: u64) {
        self.sync_states
            .write(&SyncCursor::new(AccountId::new(account_id), chain.chain_id, block))
            .unwrap();
    }

    pub fn holding_codes(&self, account_id: &str) -> Vec<String> {
        let mut codes: Vec<String> = self
            .holdings_store
            .holdings(&AccountId::new(account_id))
            .unwrap()
            .into_iter()
            .map(|h| h.coin.code)
            .collect();
        codes.sort();
        codes
    }
}

/// Poll `condition` until it holds or `timeout` elapses
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
