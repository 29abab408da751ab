/// Etherscan `module=account&action=tokentx` response types
///
/// Etherscan and BscScan share this format. Only the fields discovery needs
/// are modeled; everything else in a transfer is ignored.
use serde::{Deserialize, Serialize};

/// Message Etherscan sends with `status "0"` when the range is empty
pub const NO_TRANSACTIONS_MESSAGE: &str = "No transactions found";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTxResponse {
    pub status: String,
    pub message: String,
    pub result: TokenTxResult,
}

/// `result` is a list on success and an explanatory string on error
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenTxResult {
    Transfers(Vec<TokenTransfer>),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    /// Decimal string, as Etherscan encodes all numbers
    pub block_number: String,
    pub contract_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
}
