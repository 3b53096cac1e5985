use config::{Config, File};
use dotenv::dotenv;
use eyre::Result;
use serde::Deserialize;

/// Golem Network Token contract on Ethereum mainnet.
const GNT_CONTRACT_ADDRESS: &str = "0xA7dfb33234098c66FdE44907e918DAD70a3f211c";

/// First block at which BatchTransfer events can exist.
const GNT_GENESIS_BLOCK: u64 = 5_385_618;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub indexer: IndexerSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChainConfig {
    pub http_rpc_url: String,
    #[serde(default = "default_contract_address")]
    pub contract_address: String,
    #[serde(default = "default_genesis_block")]
    pub genesis_block: u64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct IndexerSettings {
    /// Upper bound on the block span requested in one cycle.
    #[serde(default = "default_block_sync_batch_size")]
    pub block_sync_batch_size: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_startup_retry_secs")]
    pub startup_retry_secs: u64,
    /// Concurrent block-timestamp lookups and writes per cycle.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let settings = Config::builder()
            .add_source(File::with_name("config.yaml").required(false))
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .list_separator(","),
            )
            .build()?;

        settings.try_deserialize().map_err(eyre::Error::from)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            block_sync_batch_size: default_block_sync_batch_size(),
            poll_interval_secs: default_poll_interval_secs(),
            startup_retry_secs: default_startup_retry_secs(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

fn default_api_port() -> u16 {
    3000
}

fn default_contract_address() -> String {
    GNT_CONTRACT_ADDRESS.to_owned()
}

fn default_genesis_block() -> u64 {
    GNT_GENESIS_BLOCK
}

fn default_block_sync_batch_size() -> u64 {
    20_000
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_startup_retry_secs() -> u64 {
    300
}

fn default_max_concurrent_lookups() -> usize {
    8
}
