/// History Mock Server
///
/// Serves Etherscan-compatible token transfer history from fixtures, for
/// local discovery runs without an API key.
use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use history_mock::{run_server, MockHistory, SeedTransfer};

#[derive(Debug)]
struct Config {
    server_host: String,
    server_port: u16,
    /// Optional JSON file with an array of seed transfers
    fixtures_path: Option<String>,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Load .env file if present

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .context("Invalid SERVER_PORT")?;

        let fixtures_path = env::var("FIXTURES_PATH").ok();

        Ok(Self {
            server_host,
            server_port,
            fixtures_path,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting History Mock Server...");

    let config = Config::from_env().context("Failed to load configuration")?;
    log::info!("Server will listen on {}:{}", config.server_host, config.server_port);

    let history = Arc::new(MockHistory::new());
    if let Some(path) = &config.fixtures_path {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures from {}", path))?;
        let transfers: Vec<SeedTransfer> =
            serde_json::from_str(&contents).context("Invalid fixtures file")?;
        log::info!("Loaded {} fixture transfer(s) from {}", transfers.len(), path);
        history.add_transfers(transfers);
    }

    run_server(history, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
