use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use token_discovery::{
    Account, AccountId, ChainFamily, DiscoveryConfig, DiscoveryManager, EvmAddress,
    InMemoryCoinCatalog,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize logger (set RUST_LOG=debug for pipeline details)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DiscoveryConfig::from_env();

    let catalog = match env::var("CATALOG_PATH") {
        Ok(path) => InMemoryCoinCatalog::from_json_file(&PathBuf::from(path))?,
        Err(_) => {
            log::warn!("CATALOG_PATH not set, every discovered token will be unresolved");
            InMemoryCoinCatalog::default()
        }
    };

    let account_id = match env::var("ACCOUNT_ID") {
        Ok(id) => AccountId::new(id),
        Err(_) => {
            let id = AccountId::generate();
            log::info!("ACCOUNT_ID not set, using fresh account {}", id);
            id
        }
    };

    let address: EvmAddress = env::var("ACCOUNT_ADDRESS")
        .map_err(|_| anyhow::anyhow!("ACCOUNT_ADDRESS must be set"))?
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let manager = DiscoveryManager::new(config, Arc::new(catalog))?;
    manager.set_active_account(Some(Account::new(account_id.clone(), "default")));

    // EVM families share the account address
    let addresses: HashMap<ChainFamily, EvmAddress> = manager
        .config
        .families()
        .into_iter()
        .map(|family| (family, address))
        .collect();

    log::info!("Discovering tokens for {} on {:?}", address, manager.config.families());
    manager.sync_all(&addresses).await;

    let holdings = manager.active_holdings()?;
    println!("Account {} tracks {} token(s):", account_id, holdings.len());
    for holding in holdings {
        println!(
            "  {:<10} {:<32} {}",
            holding.coin.code, holding.coin.name, holding.coin.coin_type
        );
    }

    Ok(())
}
