//! Totals read from the share and staked-asset token contracts.

use super::{OracleError, PoolMetadata, Totals, TotalsOracle};
use crate::address::Address;
use crate::amount;
use crate::events::BlockRef;
use crate::rpc::RpcClient;
use async_trait::async_trait;
use tracing::debug;

const TOTAL_SUPPLY: &str = "0x18160ddd";
const BALANCE_OF: &str = "0x70a08231";
const DECIMALS: &str = "0x313ce567";
const NAME: &str = "0x06fdde03";
const SYMBOL: &str = "0x95d89b41";

/// Size of an ABI word in bytes.
const WORD: usize = 32;

/// `TotalsOracle` over `eth_call`.
///
/// The staked asset is the staked token's balance held by the share token
/// contract.
pub struct JsonRpcOracle {
    rpc: RpcClient,
    share_token: Address,
    staked_token: Address,
    value_scale: u32,
}

impl JsonRpcOracle {
    pub fn new(
        rpc: RpcClient,
        share_token: Address,
        staked_token: Address,
        value_scale: u32,
    ) -> Self {
        Self {
            rpc,
            share_token,
            staked_token,
            value_scale,
        }
    }

    async fn read_uint(
        &self,
        call: &'static str,
        to: &Address,
        data: &str,
        block: Option<u64>,
    ) -> Result<u128, OracleError> {
        let ret = self.rpc.eth_call(to, data, block).await?;
        amount::parse_hex_quantity(&ret).map_err(|e| OracleError::Abi {
            call,
            reason: e.to_string(),
        })
    }

    async fn read_string(&self, call: &'static str, data: &str) -> Result<String, OracleError> {
        let ret = self.rpc.eth_call(&self.share_token, data, None).await?;
        decode_abi_string(&ret).map_err(|reason| OracleError::Abi { call, reason })
    }
}

#[async_trait]
impl TotalsOracle for JsonRpcOracle {
    async fn current_totals(&self, block: BlockRef) -> Result<Totals, OracleError> {
        let at = Some(block.number);
        let supply = self
            .read_uint("totalSupply", &self.share_token, TOTAL_SUPPLY, at)
            .await?;
        let balance_call = format!("{BALANCE_OF}{}", self.share_token.to_abi_word());
        let staked = self
            .read_uint("balanceOf", &self.staked_token, &balance_call, at)
            .await?;
        let totals = Totals {
            total_supply: amount::from_raw(supply, self.value_scale)?,
            staked_asset: amount::from_raw(staked, self.value_scale)?,
        };
        debug!(
            block = block.number,
            total_supply = %totals.total_supply,
            staked_asset = %totals.staked_asset,
            "Read ledger totals"
        );
        Ok(totals)
    }

    async fn static_metadata(&self) -> Result<PoolMetadata, OracleError> {
        let decimals = self
            .read_uint("decimals", &self.share_token, DECIMALS, None)
            .await?;
        let decimals = u8::try_from(decimals).map_err(|_| OracleError::Abi {
            call: "decimals",
            reason: format!("{decimals} does not fit in uint8"),
        })?;
        let name = self.read_string("name", NAME).await?;
        let symbol = self.read_string("symbol", SYMBOL).await?;
        Ok(PoolMetadata {
            decimals,
            name,
            symbol,
            underlying_asset: self.staked_token.clone(),
        })
    }
}

/// Decode a `string` return value.
///
/// Older tokens return `bytes32` for name and symbol; a single word is read
/// as a NUL-padded string.
pub fn decode_abi_string(ret: &str) -> Result<String, String> {
    let digits = ret.strip_prefix("0x").unwrap_or(ret);
    let bytes = hex::decode(digits).map_err(|e| e.to_string())?;

    if bytes.len() == WORD {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(WORD);
        return String::from_utf8(bytes[..end].to_vec()).map_err(|e| e.to_string());
    }

    let offset = read_word_usize(&bytes, 0)?;
    let len = read_word_usize(&bytes, offset)?;
    let start = offset + WORD;
    let data = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or_else(|| format!("string of {len} bytes at {offset} overruns return data"))?;
    String::from_utf8(data.to_vec()).map_err(|e| e.to_string())
}

/// Read the ABI word at byte `at` as a length or offset.
fn read_word_usize(bytes: &[u8], at: usize) -> Result<usize, String> {
    let word = at
        .checked_add(WORD)
        .and_then(|end| bytes.get(at..end))
        .ok_or_else(|| format!("no word at byte {at}"))?;
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|&b| b != 0) {
        return Err(format!("word at byte {at} is too large"));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(buf)).map_err(|e| e.to_string())
}
