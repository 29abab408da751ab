//! Transfer-history providers
//!
//! - `TransferHistoryProvider` - what the coordinator needs from a backend
//! - `eip20` - Etherscan-compatible implementation, one instance per family
//! - `types` - wire types of the `tokentx` API

pub mod eip20;
pub mod types;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{ChainFamily, EvmAddress, TransferHistory};

pub use eip20::Eip20HistoryProvider;

/// "Which tokens has this address touched since `start_block`?"
///
/// When `start_block` is given, only activity at or after that block
/// (inclusive) is reported. No activity in range yields an empty token set
/// and `last_transaction_block_number == None`.
#[async_trait]
pub trait TransferHistoryProvider: Send + Sync {
    fn family(&self) -> ChainFamily;

    async fn fetch(
        &self,
        address: &EvmAddress,
        start_block: Option<u64>,
    ) -> Result<TransferHistory, ProviderError>;
}
