//! Scripted oracle for engine and indexer tests.

use super::{OracleError, PoolMetadata, Totals, TotalsOracle};
use crate::address::Address;
use crate::events::BlockRef;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Mutex;

/// Returns whatever totals the test last set.
pub(crate) struct ScriptedOracle {
    totals: Mutex<Totals>,
    fail: Mutex<bool>,
}

impl ScriptedOracle {
    pub(crate) fn new() -> Self {
        Self {
            totals: Mutex::new(Totals {
                total_supply: Decimal::ZERO,
                staked_asset: Decimal::ZERO,
            }),
            fail: Mutex::new(false),
        }
    }

    pub(crate) fn set(&self, total_supply: &str, staked_asset: &str) {
        self.set_decimal(
            total_supply.parse().unwrap(),
            staked_asset.parse().unwrap(),
        );
    }

    pub(crate) fn set_decimal(&self, total_supply: Decimal, staked_asset: Decimal) {
        *self.totals.lock().unwrap() = Totals {
            total_supply,
            staked_asset,
        };
    }

    pub(crate) fn fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl TotalsOracle for ScriptedOracle {
    async fn current_totals(&self, _block: BlockRef) -> Result<Totals, OracleError> {
        if *self.fail.lock().unwrap() {
            return Err(OracleError::Unavailable("scripted outage".to_string()));
        }
        Ok(*self.totals.lock().unwrap())
    }

    async fn static_metadata(&self) -> Result<PoolMetadata, OracleError> {
        Ok(PoolMetadata {
            decimals: 18,
            name: "Staked Share".to_string(),
            symbol: "sSHR".to_string(),
            underlying_asset: Address::parse("0x00000000000000000000000000000000000000a5")
                .unwrap(),
        })
    }
}
