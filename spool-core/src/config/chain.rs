//! Chain access configuration.

use crate::address::Address;
use std::time::Duration;
use url::Url;

/// Where and how to read the share ledger.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// JSON-RPC endpoint of an archive-capable node.
    pub rpc_url: Url,
    /// The share-token contract; also the pool id.
    pub share_token: Address,
    /// The staked underlying asset token.
    pub staked_token: Address,
    /// First block to index when no checkpoint exists.
    pub start_block: u64,
    /// Blocks behind head considered final.
    pub confirmations: u64,
    /// Maximum number of blocks per `eth_getLogs` window.
    pub batch_size: u64,
    pub poll_interval: Duration,
}
