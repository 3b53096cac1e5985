mod api;
mod config;
mod db;
mod entities;
mod error;
mod indexer;
mod provider;
#[cfg(test)]
mod testutil;
mod types;

use std::{sync::Arc, time::Duration};

use alloy::primitives::Address;
use eyre::{eyre, Result, WrapErr};
use tokio::time::sleep;
use tracing::{error, info};

use crate::api::AppState;
use crate::config::AppConfig;
use crate::db::{DbClient, TransferSink};
use crate::indexer::Indexer;
use crate::provider::{EventSource, EvmProvider};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cfg = AppConfig::load()?;

    let contract: Address = cfg
        .chain
        .contract_address
        .parse()
        .wrap_err("Invalid chain.contract_address")?;
    let source: Arc<dyn EventSource> =
        Arc::new(EvmProvider::new(&cfg.chain.http_rpc_url, contract)?);

    // The database may not be up yet at process start; keep retrying
    // instead of crash-looping.
    let retry_delay = Duration::from_secs(cfg.indexer.startup_retry_secs);
    let sink: Arc<dyn TransferSink> = loop {
        match DbClient::connect(&cfg.database.url).await {
            Ok(db) => break Arc::new(db) as Arc<dyn TransferSink>,
            Err(e) => {
                error!(
                    "database connection failed: {e}; retrying in {}s",
                    retry_delay.as_secs()
                );
                sleep(retry_delay).await;
            }
        }
    };
    info!("Connected to database");

    let indexer = Indexer::new(
        Arc::clone(&source),
        Arc::clone(&sink),
        cfg.chain.genesis_block,
        cfg.indexer.clone(),
    );
    let ingestion = tokio::spawn(indexer.start());

    let state = AppState { sink, source };
    tokio::select! {
        res = ingestion => match res {
            Ok(res) => res,
            Err(e) => Err(eyre!("ingestion task panicked: {}", e)),
        },
        res = api::serve(state, cfg.api.port) => res,
    }
}
