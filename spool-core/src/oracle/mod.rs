//! Ledger totals needed to price shares.

pub mod json_rpc;
#[cfg(test)]
pub(crate) mod testing;

pub use crate::entities::PoolMetadata;
pub use json_rpc::JsonRpcOracle;

use crate::amount::AmountError;
use crate::events::BlockRef;
use crate::rpc::RpcError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Ledger-wide totals at a given block, in decimal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_supply: Decimal,
    pub staked_asset: Decimal,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("cannot decode {call} return data: {reason}")]
    Abi { call: &'static str, reason: String },

    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

/// Source of authoritative share supply and staked asset.
///
/// Both reads must reflect the state right after `block`, not the chain head,
/// so that replaying history reproduces the same ratios.
#[async_trait]
pub trait TotalsOracle: Send + Sync {
    async fn current_totals(&self, block: BlockRef) -> Result<Totals, OracleError>;

    /// Metadata read once, when the pool record is first created.
    async fn static_metadata(&self) -> Result<PoolMetadata, OracleError>;
}
