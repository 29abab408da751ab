/// Discovery configuration from environment variables
///
/// Controls where cursors and holdings are stored and which
/// Etherscan-compatible endpoints are queried for each chain family.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::ChainFamily;

const DEFAULT_DATA_DIR: &str = "./discovery_data";
const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/api";
const DEFAULT_BSCSCAN_URL: &str = "https://api.bscscan.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Endpoint settings for one chain family's history API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryApiConfig {
    pub family: ChainFamily,
    /// Base URL of the Etherscan-compatible API (`.../api`)
    pub base_url: String,
    pub api_key: Option<String>,
    /// Network-level timeout for a single history request
    pub timeout: Duration,
}

impl HistoryApiConfig {
    pub fn new(family: ChainFamily, base_url: impl Into<String>) -> Self {
        Self {
            family,
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn default_for(family: ChainFamily) -> Self {
        match family {
            ChainFamily::Ethereum => Self::new(family, DEFAULT_ETHERSCAN_URL),
            ChainFamily::BinanceSmartChain => Self::new(family, DEFAULT_BSCSCAN_URL),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Root directory for per-account cursor and holdings files
    pub data_dir: PathBuf,
    /// One entry per enabled chain family
    pub history_apis: Vec<HistoryApiConfig>,
}

impl DiscoveryConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `DISCOVERY_DATA_DIR`: storage root (default `./discovery_data`)
    /// - `DISCOVERY_CHAINS`: comma list of `ethereum`, `bsc` (default both)
    /// - `ETHERSCAN_URL` / `ETHERSCAN_API_KEY`: Ethereum history API
    /// - `BSCSCAN_URL` / `BSCSCAN_API_KEY`: BNB Smart Chain history API
    /// - `HISTORY_TIMEOUT_SECS`: per-request timeout (default 30)
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Query a local history-mock for Ethereum only
    /// DISCOVERY_CHAINS=ethereum ETHERSCAN_URL=http://localhost:3001/api cargo run
    /// ```
    pub fn from_env() -> Self {
        let data_dir = env::var("DISCOVERY_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        log::info!("Discovery data directory: {}", data_dir.display());

        let timeout = env::var("HISTORY_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| match raw.parse::<u64>() {
                Ok(secs) => Some(secs),
                Err(_) => {
                    log::warn!("Invalid HISTORY_TIMEOUT_SECS '{}', using default", raw);
                    None
                }
            })
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let families = match env::var("DISCOVERY_CHAINS") {
            Ok(raw) => parse_chain_list(&raw),
            Err(_) => ChainFamily::ALL.to_vec(),
        };

        let history_apis = families
            .into_iter()
            .map(|family| {
                let (url_var, key_var) = match family {
                    ChainFamily::Ethereum => ("ETHERSCAN_URL", "ETHERSCAN_API_KEY"),
                    ChainFamily::BinanceSmartChain => ("BSCSCAN_URL", "BSCSCAN_API_KEY"),
                };

                let mut api = HistoryApiConfig::default_for(family).with_timeout(timeout);
                if let Ok(url) = env::var(url_var) {
                    api.base_url = url;
                }
                api.api_key = env::var(key_var).ok().filter(|key| !key.is_empty());

                log::info!("History API for {}: {}", family, api.base_url);
                if api.api_key.is_none() {
                    log::warn!("{} not set, requests to {} will be heavily rate limited", key_var, family);
                }
                api
            })
            .collect();

        Self {
            data_dir,
            history_apis,
        }
    }

    /// Settings for a family, if that family is enabled
    pub fn history_api(&self, family: ChainFamily) -> Option<&HistoryApiConfig> {
        self.history_apis.iter().find(|api| api.family == family)
    }

    pub fn families(&self) -> Vec<ChainFamily> {
        self.history_apis.iter().map(|api| api.family).collect()
    }
}

impl Default for DiscoveryConfig {
    /// Both chain families against the public APIs, without keys
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            history_apis: ChainFamily::ALL
                .iter()
                .map(|family| HistoryApiConfig::default_for(*family))
                .collect(),
        }
    }
}

/// Parse `DISCOVERY_CHAINS`, skipping unknown and repeated names
fn parse_chain_list(raw: &str) -> Vec<ChainFamily> {
    let mut families = Vec::new();
    for name in raw.split(',').filter(|name| !name.trim().is_empty()) {
        match name.parse::<ChainFamily>() {
            Ok(family) if !families.contains(&family) => families.push(family),
            Ok(_) => {}
            Err(e) => log::warn!("Ignoring chain in DISCOVERY_CHAINS: {}", e),
        }
    }
    families
}
