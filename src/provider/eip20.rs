use async_trait::async_trait;

use super::types::{TokenTransfer, TokenTxResponse, TokenTxResult, NO_TRANSACTIONS_MESSAGE};
use super::TransferHistoryProvider;
use crate::config::HistoryApiConfig;
use crate::error::ProviderError;
use crate::types::{ChainFamily, EvmAddress, TokenId, TransferHistory};

/// Token-transfer history from an Etherscan-compatible API
///
/// The same implementation serves every chain family; only the
/// [`HistoryApiConfig`] differs (Etherscan for ERC-20, BscScan for BEP-20).
pub struct Eip20HistoryProvider {
    client: reqwest::Client,
    config: HistoryApiConfig,
}

impl Eip20HistoryProvider {
    pub fn new(config: HistoryApiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HistoryApiConfig {
        &self.config
    }

    fn query(&self, address: &EvmAddress, start_block: Option<u64>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("module", "account".to_string()),
            ("action", "tokentx".to_string()),
            ("address", address.to_hex()),
            ("sort", "desc".to_string()),
        ];
        if let Some(start_block) = start_block {
            query.push(("startblock", start_block.to_string()));
        }
        if let Some(api_key) = &self.config.api_key {
            query.push(("apikey", api_key.clone()));
        }
        query
    }
}

#[async_trait]
impl TransferHistoryProvider for Eip20HistoryProvider {
    fn family(&self) -> ChainFamily {
        self.config.family
    }

    async fn fetch(
        &self,
        address: &EvmAddress,
        start_block: Option<u64>,
    ) -> Result<TransferHistory, ProviderError> {
        log::debug!(
            "Fetching {} token transfers for {} from block {:?}",
            self.config.family,
            address,
            start_block
        );

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&self.query(address, start_block))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited(body));
        }
        if !status.is_success() {
            return Err(ProviderError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenTxResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        history_from_response(self.config.family, parsed, start_block)
    }
}

/// Reduce a `tokentx` response to the distinct tokens and highest block
pub fn history_from_response(
    family: ChainFamily,
    response: TokenTxResponse,
    start_block: Option<u64>,
) -> Result<TransferHistory, ProviderError> {
    let transfers = match (response.status.as_str(), response.result) {
        ("1", TokenTxResult::Transfers(transfers)) => transfers,
        ("0", TokenTxResult::Transfers(transfers))
            if transfers.is_empty() || response.message == NO_TRANSACTIONS_MESSAGE =>
        {
            return Ok(TransferHistory::empty());
        }
        (_, TokenTxResult::Text(result)) if result.to_lowercase().contains("rate limit") => {
            return Err(ProviderError::RateLimited(result));
        }
        (_, TokenTxResult::Text(result)) => {
            return Err(ProviderError::Api {
                message: response.message,
                result,
            });
        }
        (status, TokenTxResult::Transfers(_)) => {
            return Err(ProviderError::MalformedResponse(format!(
                "unexpected status {} with transfer list",
                status
            )));
        }
    };

    let mut history = TransferHistory::empty();
    for transfer in transfers {
        let (block, token_id) = parse_transfer(family, &transfer)?;

        // The API is asked for `startblock` already; don't trust it blindly.
        if start_block.is_some_and(|start| block < start) {
            continue;
        }

        history.token_ids.insert(token_id);
        history.last_transaction_block_number = Some(
            history
                .last_transaction_block_number
                .map_or(block, |last| last.max(block)),
        );
    }

    Ok(history)
}

fn parse_transfer(
    family: ChainFamily,
    transfer: &TokenTransfer,
) -> Result<(u64, TokenId), ProviderError> {
    let block = transfer.block_number.trim().parse::<u64>().map_err(|e| {
        ProviderError::MalformedResponse(format!(
            "invalid blockNumber '{}': {}",
            transfer.block_number, e
        ))
    })?;

    let contract = transfer
        .contract_address
        .parse::<EvmAddress>()
        .map_err(ProviderError::MalformedResponse)?;

    Ok((block, TokenId::new(family, contract)))
}
