/// Etherscan `tokentx` API types
///
/// These types match the Etherscan/BscScan format so clients can consume
/// them transparently.
use serde::{Deserialize, Serialize};

/// Query string of `GET /api`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTxQuery {
    pub module: Option<String>,
    pub action: Option<String>,
    pub address: Option<String>,
    pub startblock: Option<u64>,
    pub sort: Option<String>,
    pub apikey: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenTxResponse {
    pub status: String,
    pub message: String,
    pub result: serde_json::Value,
}

/// Transfer row in a `tokentx` result (numbers as decimal strings)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransferRow {
    pub block_number: String,
    pub hash: String,
    pub from: String,
    pub to: String,
    pub contract_address: String,
    pub token_symbol: String,
    pub token_decimal: String,
}

/// Fixture transfer seeded through `POST /transfers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedTransfer {
    /// Account address whose history this transfer appears in
    pub address: String,
    pub contract_address: String,
    pub block_number: u64,
    #[serde(default)]
    pub token_symbol: Option<String>,
}

/// Injected failure for `GET /api`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FailureMode {
    /// `status "0"`, `result "Max rate limit reached"`
    RateLimited,
    /// Plain HTTP error with the given status code
    HttpError { status: u16 },
    /// Body that is not JSON
    Malformed,
    /// Answer normally, but only after this many milliseconds
    Delay { millis: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub calls: usize,
    pub transfers: usize,
}
