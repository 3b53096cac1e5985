use alloy::primitives::{Address, U256};
use bigdecimal::{
    num_bigint::{BigInt, Sign},
    BigDecimal,
};
use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;

use crate::entities::transfers;
use crate::error::RecordError;

/// GNT uses 18 decimals; raw on-chain values are scaled down by 10^18.
pub const TOKEN_DECIMALS: i64 = 18;

/// A decoded BatchTransfer event as emitted by the chain. Immutable; the
/// (block_number, transaction_index, log_index) triple is its identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub closure_time: u64,
    pub block_number: u64,
    pub transaction_index: u64,
    pub log_index: u64,
}

/// The canonical persisted form of one transfer, derived once from a
/// [`RawTransfer`] plus its block's timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub from: String,
    pub to: String,
    pub amount: BigDecimal,
    pub closure_time: i64,
    pub block_number: i64,
    pub transaction_index: i64,
    pub log_index: i64,
    pub block_timestamp: DateTime<Utc>,
}

impl TransferRecord {
    pub fn from_event(event: &RawTransfer, block_timestamp: u64) -> Result<Self, RecordError> {
        let secs = i64::try_from(block_timestamp).map_err(|_| RecordError::InvalidTimestamp {
            value: block_timestamp,
        })?;
        let block_timestamp = DateTime::from_timestamp(secs, 0)
            .ok_or(RecordError::InvalidTimestamp {
                value: secs as u64,
            })?;

        Ok(Self {
            from: format!("{}", event.from),
            to: format!("{}", event.to),
            amount: scale_amount(&event.value),
            closure_time: to_i64(event.closure_time)?,
            block_number: to_i64(event.block_number)?,
            transaction_index: to_i64(event.transaction_index)?,
            log_index: to_i64(event.log_index)?,
            block_timestamp,
        })
    }

    pub fn into_active_model(self) -> transfers::ActiveModel {
        transfers::ActiveModel {
            block_number: Set(self.block_number),
            transaction_index: Set(self.transaction_index),
            log_index: Set(self.log_index),
            from: Set(self.from),
            to: Set(self.to),
            amount: Set(self.amount),
            closure_time: Set(self.closure_time),
            block_timestamp: Set(self.block_timestamp),
        }
    }
}

fn to_i64(value: u64) -> Result<i64, RecordError> {
    i64::try_from(value).map_err(|_| RecordError::NumberOverflow { value })
}

/// Exact decimal scaling; 2 * 10^18 raw becomes 2.0 tokens.
fn scale_amount(value: &U256) -> BigDecimal {
    let digits = BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>());
    BigDecimal::new(digits, TOKEN_DECIMALS)
}
