//! Core data types for token discovery
//!
//! Accounts, chains, token identifiers, catalog records, holdings and sync
//! cursors. Everything here is plain data; behavior lives in the stores,
//! the resolver and the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Stable identity of a wallet account
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random identifier for a freshly created account
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wallet account as seen by the discovery engine (read-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Supported EVM network families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    Ethereum,
    BinanceSmartChain,
}

impl ChainFamily {
    pub const ALL: [ChainFamily; 2] = [ChainFamily::Ethereum, ChainFamily::BinanceSmartChain];

    /// Mainnet chain id of the family
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::Ethereum => 1,
            Self::BinanceSmartChain => 56,
        }
    }

    /// Coin type of a fungible token contract on this family
    pub fn token_coin_type(&self, contract: EvmAddress) -> CoinType {
        match self {
            Self::Ethereum => CoinType::Erc20 { address: contract },
            Self::BinanceSmartChain => CoinType::Bep20 { address: contract },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::BinanceSmartChain => "bsc",
        }
    }
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChainFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Self::Ethereum),
            "bsc" | "binance_smart_chain" | "binancesmartchain" => Ok(Self::BinanceSmartChain),
            other => Err(format!("unknown chain family: {}", other)),
        }
    }
}

/// 20-byte EVM address, always stored as lowercase `0x`-prefixed hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvmAddress([u8; 20]);

impl EvmAddress {
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for EvmAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(digits).map_err(|e| format!("invalid address {}: {}", s, e))?;
        let array: [u8; 20] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| format!("invalid address {}: {} bytes", s, v.len()))?;

        Ok(Self(array))
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for EvmAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EvmAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Catalog key of a fungible asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoinType {
    Erc20 { address: EvmAddress },
    Bep20 { address: EvmAddress },
}

impl CoinType {
    pub fn family(&self) -> ChainFamily {
        match self {
            Self::Erc20 { .. } => ChainFamily::Ethereum,
            Self::Bep20 { .. } => ChainFamily::BinanceSmartChain,
        }
    }

    pub fn contract(&self) -> EvmAddress {
        match self {
            Self::Erc20 { address } | Self::Bep20 { address } => *address,
        }
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erc20 { address } => write!(f, "erc20:{}", address),
            Self::Bep20 { address } => write!(f, "bep20:{}", address),
        }
    }
}

/// Raw token identifier as reported by a transfer-history provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId {
    pub family: ChainFamily,
    pub contract: EvmAddress,
}

impl TokenId {
    pub fn new(family: ChainFamily, contract: EvmAddress) -> Self {
        Self { family, contract }
    }

    pub fn coin_type(&self) -> CoinType {
        self.family.token_coin_type(self.contract)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.contract)
    }
}

/// Canonical catalog entry of a fungible asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub coin_type: CoinType,
    pub code: String,
    pub name: String,
    pub decimals: u8,
}

/// "This account tracks this asset"
///
/// At most one holding exists per (account_id, coin_type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub account_id: AccountId,
    pub coin: CoinRecord,
    pub created_at: DateTime<Utc>,
}

impl Holding {
    pub fn new(account_id: AccountId, coin: CoinRecord) -> Self {
        Self {
            account_id,
            coin,
            created_at: Utc::now(),
        }
    }

    pub fn coin_type(&self) -> CoinType {
        self.coin.coin_type
    }
}

/// Last block confirmed synced for an (account, chain) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    pub account_id: AccountId,
    pub chain_id: u64,
    pub last_transaction_block_number: u64,
    pub updated_at: DateTime<Utc>,
}

impl SyncCursor {
    pub fn new(account_id: AccountId, chain_id: u64, last_transaction_block_number: u64) -> Self {
        Self {
            account_id,
            chain_id,
            last_transaction_block_number,
            updated_at: Utc::now(),
        }
    }

    /// First block the next pass should look at
    pub fn next_start_block(&self) -> u64 {
        self.last_transaction_block_number.saturating_add(1)
    }
}

/// Payload of a chain-ready event
///
/// `address` is `None` when the connection came up without an account
/// address attached; a pass triggered with it is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConnection {
    pub family: ChainFamily,
    pub chain_id: u64,
    pub address: Option<EvmAddress>,
}

impl ChainConnection {
    pub fn new(family: ChainFamily, address: Option<EvmAddress>) -> Self {
        Self {
            family,
            chain_id: family.chain_id(),
            address,
        }
    }
}

/// Result of one transfer-history query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferHistory {
    pub token_ids: BTreeSet<TokenId>,
    pub last_transaction_block_number: Option<u64>,
}

impl TransferHistory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.token_ids.is_empty() && self.last_transaction_block_number.is_none()
    }
}
