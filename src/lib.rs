//! Token Discovery: incremental token sync for EVM wallet accounts
//!
//! Given the active account and one or more EVM chains, discovers which
//! fungible tokens the account has ever transacted with and registers newly
//! seen tokens as tracked holdings, exactly once, without rescanning history
//! that was already covered.
//!
//! # Architecture
//!
//! - **SyncCoordinator**: reacts to chain-ready events, one pass in flight per
//!   (account, chain)
//! - **SyncStateStore**: per (account, chain) cursor of the last synced block
//! - **TransferHistoryProvider**: Etherscan-compatible `tokentx` queries,
//!   one instance per chain family
//! - **CoinResolver / HoldingsRegistry**: catalog lookup and duplicate-free
//!   holdings merge
//!
//! # Example
//!
//! ```ignore
//! use token_discovery::{ChainConnection, ChainFamily, DiscoveryConfig, DiscoveryManager};
//!
//! let manager = DiscoveryManager::new(DiscoveryConfig::from_env(), catalog)?;
//! manager.set_active_account(Some(account));
//!
//! let chain = ChainConnection::new(ChainFamily::Ethereum, Some(address));
//! if let Some(pass) = manager.coordinator().on_chain_ready(chain) {
//!     pass.await?;
//! }
//! ```

// Public modules
pub mod account;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod holdings;
pub mod manager;
pub mod provider;
pub mod storage;
pub mod types;

// Re-exports for convenience
pub use account::{AccountSource, ActiveAccount};
pub use catalog::{CoinCatalog, CoinResolver, InMemoryCoinCatalog, Resolution, SkipReason};
pub use config::{DiscoveryConfig, HistoryApiConfig};
pub use coordinator::{PassOutcome, SkipCause, SyncCoordinator, SyncKey};
pub use error::{CatalogError, DiscoveryError, ProviderError, StorageError};
pub use holdings::HoldingsRegistry;
pub use manager::DiscoveryManager;
pub use provider::{Eip20HistoryProvider, TransferHistoryProvider};
pub use storage::{
    AccountFiles, FileHoldingsStore, FileSyncStateStore, HoldingsStore, InMemoryHoldingsStore,
    InMemorySyncStateStore, SyncStateStore,
};
pub use types::{
    Account, AccountId, ChainConnection, ChainFamily, CoinRecord, CoinType, EvmAddress, Holding,
    SyncCursor, TokenId, TransferHistory,
};

// Common result type
pub type Result<T> = std::result::Result<T, DiscoveryError>;
