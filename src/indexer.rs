use std::{sync::Arc, time::Duration};

use tokio::{
    sync::Semaphore,
    task::JoinSet,
    time::{interval, sleep, MissedTickBehavior},
};
use tracing::{debug, error, info, instrument};

use crate::config::IndexerSettings;
use crate::db::TransferSink;
use crate::error::CycleError;
use crate::provider::EventSource;
use crate::types::{RawTransfer, TransferRecord};

/// Outcome of one ingestion cycle, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub start_block: u64,
    pub end_block: u64,
    pub written: usize,
    pub failed: usize,
}

pub struct Indexer {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn TransferSink>,
    genesis_block: u64,
    settings: IndexerSettings,
}

impl Indexer {
    pub fn new(
        source: Arc<dyn EventSource>,
        sink: Arc<dyn TransferSink>,
        genesis_block: u64,
        settings: IndexerSettings,
    ) -> Self {
        Self {
            source,
            sink,
            genesis_block,
            settings,
        }
    }

    /// Next block to scan from: the sink's highest persisted block, or the
    /// configured genesis when nothing has been written yet. A sink error
    /// propagates; defaulting to genesis on a transient failure would
    /// silently re-scan the entire history.
    pub async fn resolve_start_block(&self) -> eyre::Result<u64> {
        Ok(self
            .sink
            .max_block_number()
            .await?
            .unwrap_or(self.genesis_block))
    }

    /// One checkpoint-scan-enrich-write pass over a fixed block window.
    pub async fn run_cycle(&self) -> Result<CycleSummary, CycleError> {
        let start_block = self
            .resolve_start_block()
            .await
            .map_err(CycleError::Checkpoint)?;
        let end_block = start_block + self.settings.block_sync_batch_size;

        let events = self
            .source
            .batch_transfers(start_block, end_block)
            .await
            .map_err(|source| CycleError::Source {
                from_block: start_block,
                to_block: end_block,
                source,
            })?;

        if events.is_empty() {
            debug!("no transfers in blocks {} to {}", start_block, end_block);
            return Ok(CycleSummary {
                start_block,
                end_block,
                written: 0,
                failed: 0,
            });
        }

        info!(
            "processing {} transfers from blocks {} to {}",
            events.len(),
            start_block,
            end_block
        );

        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_lookups));
        let mut tasks = JoinSet::new();
        for event in events {
            let source = Arc::clone(&self.source);
            let sink = Arc::clone(&self.sink);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                process_event(source.as_ref(), sink.as_ref(), event).await
            });
        }

        let mut written = 0;
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => written += 1,
                Ok(false) => failed += 1,
                Err(e) if e.is_panic() => return Err(CycleError::Fault(e)),
                Err(e) => {
                    error!("transfer task cancelled: {}", e);
                    failed += 1;
                }
            }
        }

        Ok(CycleSummary {
            start_block,
            end_block,
            written,
            failed,
        })
    }

    /// Initialize the sink (retrying until the infrastructure is up), then
    /// run one cycle immediately and one per poll interval, indefinitely.
    /// Only an event-task panic ends the schedule.
    #[instrument(skip_all)]
    pub async fn start(self) -> eyre::Result<()> {
        let retry_delay = Duration::from_secs(self.settings.startup_retry_secs);
        loop {
            match self.sink.ensure_schema().await {
                Ok(()) => break,
                Err(e) => {
                    error!(
                        "sink initialization failed: {e:#}; retrying in {}s",
                        retry_delay.as_secs()
                    );
                    sleep(retry_delay).await;
                }
            }
        }
        info!(
            "sink schema ready, ingesting every {}s",
            self.settings.poll_interval_secs
        );

        let mut ticker = interval(Duration::from_secs(self.settings.poll_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match self.run_cycle().await {
                Ok(summary) => info!(
                    start_block = summary.start_block,
                    end_block = summary.end_block,
                    written = summary.written,
                    failed = summary.failed,
                    "ingestion cycle complete"
                ),
                Err(fault @ CycleError::Fault(_)) => {
                    error!("unrecoverable fault in ingestion cycle: {}", fault);
                    return Err(fault.into());
                }
                Err(e) => error!("ingestion cycle failed: {}", e),
            }
        }
    }
}

/// Enrich one event with its block timestamp and persist it. Failures are
/// logged with the event's identity and reported as `false`; one bad event
/// must not stall the batch, and an unadvanced checkpoint re-scans its
/// block next cycle anyway.
async fn process_event(
    source: &dyn EventSource,
    sink: &dyn TransferSink,
    event: RawTransfer,
) -> bool {
    let block_number = event.block_number;
    let transaction_index = event.transaction_index;
    let log_index = event.log_index;

    let block_timestamp = match source.block_timestamp(block_number).await {
        Ok(ts) => ts,
        Err(e) => {
            error!(
                block_number,
                transaction_index, log_index, "block timestamp lookup failed: {e:#}"
            );
            return false;
        }
    };

    let record = match TransferRecord::from_event(&event, block_timestamp) {
        Ok(record) => record,
        Err(e) => {
            error!(
                block_number,
                transaction_index, log_index, "event normalization failed: {e}"
            );
            return false;
        }
    };

    if let Err(e) = sink.write_transfer(&record).await {
        error!(
            block_number,
            transaction_index, log_index, "record write failed: {e:#}"
        );
        return false;
    }

    true
}
