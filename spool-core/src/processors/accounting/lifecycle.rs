//! Get-or-create lookups for the records an event touches.
//!
//! New records are built in memory only; they reach the store with the rest
//! of the event's change set.

use super::{AccountingEngine, AccountingError};
use crate::address::Address;
use crate::entities::daily_bucket::day_index;
use crate::entities::{DailyBucket, Holder, Pool};
use crate::oracle::TotalsOracle;
use crate::store::{EntityStore, Loaded};
use tracing::info;

impl AccountingEngine {
    /// The singleton pool, created with oracle metadata on first use.
    pub(super) async fn get_pool(&self, timestamp: i64) -> Result<Loaded<Pool>, AccountingError> {
        let id = &self.config.pool_id;
        if let Some(pool) = self.store.load_pool(id).await? {
            return Ok(Loaded::existing(pool));
        }
        let metadata = self.oracle.static_metadata().await?;
        info!(
            pool = %id,
            symbol = %metadata.symbol,
            decimals = metadata.decimals,
            "Creating pool"
        );
        Ok(Loaded::created(Pool::new(id.clone(), metadata, timestamp)))
    }

    pub(super) async fn get_holder(
        &self,
        address: &Address,
        timestamp: i64,
    ) -> Result<Loaded<Holder>, AccountingError> {
        Ok(match self.store.load_holder(address).await? {
            Some(holder) => Loaded::existing(holder),
            None => Loaded::created(Holder::new(address.clone(), timestamp)),
        })
    }

    /// The bucket of the UTC day containing `timestamp`.
    pub(super) async fn get_daily_bucket(
        &self,
        timestamp: i64,
    ) -> Result<Loaded<DailyBucket>, AccountingError> {
        let day = day_index(timestamp);
        Ok(match self.store.load_daily_bucket(day).await? {
            Some(bucket) => Loaded::existing(bucket),
            None => Loaded::created(DailyBucket::new(day)),
        })
    }
}
