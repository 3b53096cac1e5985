use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use eyre::{eyre, Result};

use crate::db::TransferSink;
use crate::provider::EventSource;
use crate::types::{RawTransfer, TransferRecord};

pub fn transfer(
    block_number: u64,
    transaction_index: u64,
    log_index: u64,
    whole_tokens: u64,
) -> RawTransfer {
    RawTransfer {
        from: Address::repeat_byte(0xaa),
        to: Address::repeat_byte(0xbb),
        value: U256::from(whole_tokens) * U256::from(10u64).pow(U256::from(18)),
        closure_time: 1_650_000_000,
        block_number,
        transaction_index,
        log_index,
    }
}

/// In-memory node. Serves the configured transfers for any requested range
/// and deterministic block timestamps, with injectable failures.
#[derive(Default)]
pub struct FakeSource {
    pub transfers: Vec<RawTransfer>,
    pub requested_ranges: Mutex<Vec<(u64, u64)>>,
    pub failing_blocks: HashSet<u64>,
    /// Blocks whose timestamp lookup panics instead of erroring, to stand
    /// in for a defect in enrichment logic.
    pub panicking_blocks: HashSet<u64>,
    pub fail_fetch: bool,
    pub fail_tip: bool,
}

impl FakeSource {
    pub fn with_transfers(transfers: Vec<RawTransfer>) -> Self {
        Self {
            transfers,
            ..Self::default()
        }
    }

    pub fn timestamp_for(block_number: u64) -> u64 {
        1_600_000_000 + block_number
    }
}

#[async_trait]
impl EventSource for FakeSource {
    async fn batch_transfers(&self, from_block: u64, to_block: u64) -> Result<Vec<RawTransfer>> {
        self.requested_ranges
            .lock()
            .unwrap()
            .push((from_block, to_block));
        if self.fail_fetch {
            return Err(eyre!("node timeout"));
        }
        Ok(self
            .transfers
            .iter()
            .filter(|t| t.block_number >= from_block && t.block_number <= to_block)
            .cloned()
            .collect())
    }

    async fn block_timestamp(&self, block_number: u64) -> Result<u64> {
        if self.failing_blocks.contains(&block_number) {
            return Err(eyre!("block {block_number} unavailable"));
        }
        if self.panicking_blocks.contains(&block_number) {
            panic!("defect while enriching block {block_number}");
        }
        Ok(Self::timestamp_for(block_number))
    }

    async fn current_block_number(&self) -> Result<u64> {
        if self.fail_tip {
            return Err(eyre!("node unreachable"));
        }
        Ok(10_000_000)
    }
}

/// In-memory sink keyed by record identity, so writes overwrite rather than
/// duplicate, matching the real store's semantics.
#[derive(Default)]
pub struct FakeSink {
    pub records: Mutex<BTreeMap<(i64, i64, i64), TransferRecord>>,
    pub fail_checkpoint: bool,
    pub fail_writes: bool,
    pub fail_ping: bool,
    /// Number of ensure_schema calls that should still fail.
    pub ensure_failures: AtomicUsize,
    pub ensure_calls: AtomicUsize,
}

impl FakeSink {
    pub fn max_behind_lock(&self) -> Option<u64> {
        self.records
            .lock()
            .unwrap()
            .keys()
            .map(|(block, _, _)| *block as u64)
            .max()
    }
}

#[async_trait]
impl TransferSink for FakeSink {
    async fn ensure_schema(&self) -> Result<()> {
        self.ensure_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.ensure_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.ensure_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(eyre!("database not ready"));
        }
        Ok(())
    }

    async fn write_transfer(&self, record: &TransferRecord) -> Result<()> {
        if self.fail_writes {
            return Err(eyre!("write refused"));
        }
        self.records.lock().unwrap().insert(
            (
                record.block_number,
                record.transaction_index,
                record.log_index,
            ),
            record.clone(),
        );
        Ok(())
    }

    async fn max_block_number(&self) -> Result<Option<u64>> {
        if self.fail_checkpoint {
            return Err(eyre!("sink query failed"));
        }
        Ok(self.max_behind_lock())
    }

    async fn ping(&self) -> Result<()> {
        if self.fail_ping {
            return Err(eyre!("sink unreachable"));
        }
        Ok(())
    }
}
