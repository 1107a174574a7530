//! Share-token `Transfer` logs read over JSON-RPC.

use crate::address::{Address, AddressError};
use crate::amount::{self, AmountError};
use crate::events::{BlockRef, TransferEvent};
use crate::rpc::{RpcClient, RpcError, block_tag};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// `keccak256("Transfer(address,address,uint256)")`.
pub const TRANSFER_TOPIC: &str =
    "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("invalid address in log: {0}")]
    Address(#[from] AddressError),

    #[error("invalid amount in log: {0}")]
    Amount(#[from] AmountError),

    #[error("log parsing error: {0}")]
    Parse(String),
}

/// Ordered transfer events from the chain.
#[async_trait]
pub trait TransferSource: Send + Sync {
    /// Highest block treated as final.
    async fn safe_head(&self) -> Result<u64, SyncError>;

    /// Transfers in `from_block..=to_block`, sorted by block and log index.
    async fn fetch(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferEvent>, SyncError>;
}

pub struct LogSync {
    rpc: RpcClient,
    share_token: Address,
    confirmations: u64,
}

impl LogSync {
    pub fn new(rpc: RpcClient, share_token: Address, confirmations: u64) -> Self {
        Self {
            rpc,
            share_token,
            confirmations,
        }
    }

    async fn block_timestamp(&self, number: u64) -> Result<i64, SyncError> {
        #[derive(serde::Deserialize)]
        struct BlockHeader {
            timestamp: String,
        }

        let header: BlockHeader = self
            .rpc
            .call("eth_getBlockByNumber", json!([block_tag(number), false]))
            .await?;
        let timestamp = amount::parse_hex_quantity(&header.timestamp)?;
        i64::try_from(timestamp)
            .map_err(|_| SyncError::Parse(format!("timestamp {timestamp} out of range")))
    }
}

#[async_trait]
impl TransferSource for LogSync {
    async fn safe_head(&self) -> Result<u64, SyncError> {
        let head: String = self.rpc.call("eth_blockNumber", json!([])).await?;
        let head = parse_u64(&head)?;
        Ok(head.saturating_sub(self.confirmations))
    }

    async fn fetch(
        &self,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TransferEvent>, SyncError> {
        let logs: Vec<RawLog> = self
            .rpc
            .call(
                "eth_getLogs",
                json!([{
                    "address": self.share_token.as_str(),
                    "fromBlock": block_tag(from_block),
                    "toBlock": block_tag(to_block),
                    "topics": [TRANSFER_TOPIC],
                }]),
            )
            .await?;

        let mut timestamps: HashMap<u64, i64> = HashMap::new();
        let mut events = Vec::with_capacity(logs.len());
        for log in logs.into_iter().filter(|log| !log.removed) {
            let block_number = parse_u64(&log.block_number)?;
            let timestamp = match timestamps.get(&block_number) {
                Some(timestamp) => *timestamp,
                None => {
                    let timestamp = self.block_timestamp(block_number).await?;
                    timestamps.insert(block_number, timestamp);
                    timestamp
                }
            };
            events.push(log.into_event(timestamp)?);
        }
        events.sort_by_key(|event| event.position());

        debug!(
            from_block,
            to_block,
            events = events.len(),
            "Fetched transfer logs"
        );
        Ok(events)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLog {
    topics: Vec<String>,
    data: String,
    block_number: String,
    transaction_hash: String,
    log_index: String,
    #[serde(default)]
    removed: bool,
}

impl RawLog {
    fn into_event(self, timestamp: i64) -> Result<TransferEvent, SyncError> {
        let [topic, from, to] = self.topics.as_slice() else {
            return Err(SyncError::Parse(format!(
                "expected 3 topics, got {}",
                self.topics.len()
            )));
        };
        if !topic.eq_ignore_ascii_case(TRANSFER_TOPIC) {
            return Err(SyncError::Parse(format!("unexpected topic {topic}")));
        }
        let log_index = u32::try_from(parse_u64(&self.log_index)?)
            .map_err(|_| SyncError::Parse(format!("log index {} too large", self.log_index)))?;
        Ok(TransferEvent {
            from: Address::from_topic(from)?,
            to: Address::from_topic(to)?,
            value: amount::parse_hex_quantity(&self.data)?,
            block: BlockRef {
                number: parse_u64(&self.block_number)?,
                timestamp,
            },
            tx_hash: self.transaction_hash,
            log_index,
        })
    }
}

fn parse_u64(quantity: &str) -> Result<u64, SyncError> {
    let value = amount::parse_hex_quantity(quantity)?;
    u64::try_from(value).map_err(|_| SyncError::Parse(format!("{quantity} exceeds u64")))
}
