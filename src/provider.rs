use alloy::{
    primitives::Address,
    providers::{Provider, ProviderBuilder},
    rpc::types::{Filter, Log},
    sol,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use eyre::Result;
use std::sync::Arc;
use tracing::warn;

use crate::error::RecordError;
use crate::types::RawTransfer;

sol! {
    #[derive(Debug)]
    event BatchTransfer(address indexed from, address indexed to, uint256 value, uint64 closureTime);
}

/// What the ingestion pipeline needs from a blockchain node. Implemented by
/// [`EvmProvider`] in production and by fakes in tests.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// All BatchTransfer events emitted by the contract in `[from_block,
    /// to_block]`. A range beyond the chain tip yields an empty vec.
    async fn batch_transfers(&self, from_block: u64, to_block: u64) -> Result<Vec<RawTransfer>>;

    /// Timestamp (seconds since epoch) of one block.
    async fn block_timestamp(&self, block_number: u64) -> Result<u64>;

    /// Current chain tip. Used only as a reachability probe.
    async fn current_block_number(&self) -> Result<u64>;
}

#[derive(Clone)]
pub struct EvmProvider {
    http: Arc<dyn Provider + Send + Sync>,
    contract: Address,
}

impl EvmProvider {
    pub fn new(http_url: &str, contract: Address) -> Result<Self> {
        let http = ProviderBuilder::new().connect_http(http_url.parse()?);

        Ok(Self {
            http: Arc::new(http),
            contract,
        })
    }
}

#[async_trait]
impl EventSource for EvmProvider {
    async fn batch_transfers(&self, from_block: u64, to_block: u64) -> Result<Vec<RawTransfer>> {
        let filter = Filter::new()
            .address(self.contract)
            .event_signature(BatchTransfer::SIGNATURE_HASH)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self.http.get_logs(&filter).await?;

        let mut transfers = Vec::with_capacity(logs.len());
        for log in logs {
            match decode_transfer(&log) {
                Ok(transfer) => transfers.push(transfer),
                Err(e) => warn!(
                    block_number = log.block_number,
                    log_index = log.log_index,
                    "skipping undecodable log: {e}"
                ),
            }
        }
        Ok(transfers)
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64> {
        let block = self
            .http
            .get_block_by_number(block_number.into())
            .await?
            .ok_or_else(|| eyre::eyre!("block {block_number} not found"))?;
        Ok(block.header.timestamp)
    }

    async fn current_block_number(&self) -> Result<u64> {
        self.http.get_block_number().await.map_err(Into::into)
    }
}

fn decode_transfer(log: &Log) -> Result<RawTransfer> {
    let block_number = log.block_number.ok_or(RecordError::MissingBlockNumber)?;
    let transaction_index = log
        .transaction_index
        .ok_or(RecordError::MissingTransactionIndex)?;
    let log_index = log.log_index.ok_or(RecordError::MissingLogIndex)?;

    let decoded = log.log_decode::<BatchTransfer>()?;
    let BatchTransfer {
        from,
        to,
        value,
        closureTime: closure_time,
    } = decoded.inner.data;

    Ok(RawTransfer {
        from,
        to,
        value,
        closure_time,
        block_number,
        transaction_index,
        log_index,
    })
}
