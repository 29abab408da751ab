/// In-memory transfer fixtures behind the mock API
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::types::{FailureMode, SeedTransfer, TokenTransferRow};

#[derive(Default)]
pub struct MockHistory {
    transfers: RwLock<Vec<SeedTransfer>>,
    failure: RwLock<Option<FailureMode>>,
    calls: AtomicUsize,
}

impl MockHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transfer(
        &self,
        address: &str,
        contract_address: &str,
        block_number: u64,
        token_symbol: Option<&str>,
    ) {
        self.add_transfers(vec![SeedTransfer {
            address: address.to_string(),
            contract_address: contract_address.to_string(),
            block_number,
            token_symbol: token_symbol.map(str::to_string),
        }]);
    }

    pub fn add_transfers(&self, transfers: Vec<SeedTransfer>) {
        let mut stored = self.transfers.write().unwrap_or_else(|p| p.into_inner());
        stored.extend(transfers);
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn set_failure(&self, mode: Option<FailureMode>) {
        let mut failure = self.failure.write().unwrap_or_else(|p| p.into_inner());
        *failure = mode;
    }

    pub fn failure(&self) -> Option<FailureMode> {
        self.failure.read().ok().and_then(|f| f.clone())
    }

    /// Number of `tokentx` requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    /// Transfers touching `address` at or after `start_block`
    pub fn query(&self, address: &str, start_block: Option<u64>, descending: bool) -> Vec<TokenTransferRow> {
        let address = address.to_lowercase();
        let transfers = self.transfers.read().unwrap_or_else(|p| p.into_inner());

        let mut matching: Vec<&SeedTransfer> = transfers
            .iter()
            .filter(|t| t.address.to_lowercase() == address)
            .filter(|t| start_block.map_or(true, |start| t.block_number >= start))
            .collect();

        matching.sort_by_key(|t| t.block_number);
        if descending {
            matching.reverse();
        }

        matching
            .into_iter()
            .enumerate()
            .map(|(i, t)| TokenTransferRow {
                block_number: t.block_number.to_string(),
                hash: format!("0x{:048x}{:016x}", t.block_number, i),
                from: "0x0000000000000000000000000000000000000000".to_string(),
                to: address.clone(),
                contract_address: t.contract_address.to_lowercase(),
                token_symbol: t.token_symbol.clone().unwrap_or_default(),
                token_decimal: "18".to_string(),
            })
            .collect()
    }
}
