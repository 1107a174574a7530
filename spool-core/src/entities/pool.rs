use crate::address::Address;
use crate::age;
use crate::framework::DatabaseProcessor;
use crate::oracle::Totals;
use kanau::processor::Processor;
use rust_decimal::Decimal;

/// The singleton pool record.
///
/// `total_supply` and `staked_asset` mirror the ledger as of the last event;
/// the `shares_*` counters and age fields are derived from the event stream.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Pool {
    pub id: Address,
    #[sqlx(try_from = "i16")]
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
    pub underlying_asset: Address,
    pub total_supply: Decimal,
    pub staked_asset: Decimal,
    pub asset_harvested: Decimal,
    pub shares_minted: Decimal,
    pub shares_burned: Decimal,
    pub share_age: Decimal,
    pub share_age_destroyed: Decimal,
    pub ratio: Decimal,
    pub updated_at: i64,
}

/// Static token metadata read once when the pool record is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
    pub underlying_asset: Address,
}

/// Result of refreshing the pool's ratio from ledger totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioRefresh {
    Updated(Decimal),
    /// Total supply was zero; the previous ratio was kept.
    Retained(Decimal),
}

impl Pool {
    pub fn new(id: Address, metadata: PoolMetadata, timestamp: i64) -> Self {
        Self {
            id,
            decimals: metadata.decimals,
            name: metadata.name,
            symbol: metadata.symbol,
            underlying_asset: metadata.underlying_asset,
            total_supply: Decimal::ZERO,
            staked_asset: Decimal::ZERO,
            asset_harvested: Decimal::ZERO,
            shares_minted: Decimal::ZERO,
            shares_burned: Decimal::ZERO,
            share_age: Decimal::ZERO,
            share_age_destroyed: Decimal::ZERO,
            ratio: Decimal::ZERO,
            updated_at: timestamp,
        }
    }

    /// Shares in circulation according to the event stream.
    pub fn circulating(&self) -> Decimal {
        self.shares_minted - self.shares_burned
    }

    /// Overwrite supply and staked asset with ledger totals and recompute the ratio.
    pub fn refresh_totals(&mut self, totals: Totals) -> RatioRefresh {
        self.total_supply = totals.total_supply;
        self.staked_asset = totals.staked_asset;
        match age::share_ratio(self.staked_asset, self.total_supply) {
            Some(ratio) => {
                self.ratio = ratio;
                RatioRefresh::Updated(ratio)
            }
            None => RatioRefresh::Retained(self.ratio),
        }
    }

    /// Insert or update this pool inside a transaction.
    pub async fn upsert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO pools (
                id, decimals, name, symbol, underlying_asset,
                total_supply, staked_asset, asset_harvested,
                shares_minted, shares_burned,
                share_age, share_age_destroyed, ratio, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                total_supply = EXCLUDED.total_supply,
                staked_asset = EXCLUDED.staked_asset,
                asset_harvested = EXCLUDED.asset_harvested,
                shares_minted = EXCLUDED.shares_minted,
                shares_burned = EXCLUDED.shares_burned,
                share_age = EXCLUDED.share_age,
                share_age_destroyed = EXCLUDED.share_age_destroyed,
                ratio = EXCLUDED.ratio,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&self.id)
        .bind(i16::from(self.decimals))
        .bind(&self.name)
        .bind(&self.symbol)
        .bind(&self.underlying_asset)
        .bind(self.total_supply)
        .bind(self.staked_asset)
        .bind(self.asset_harvested)
        .bind(self.shares_minted)
        .bind(self.shares_burned)
        .bind(self.share_age)
        .bind(self.share_age_destroyed)
        .bind(self.ratio)
        .bind(self.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Get the pool record by id.
pub struct GetPool {
    pub id: Address,
}

impl Processor<GetPool> for DatabaseProcessor {
    type Output = Option<Pool>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPool")]
    async fn process(&self, query: GetPool) -> Result<Option<Pool>, sqlx::Error> {
        let pool = sqlx::query_as::<_, Pool>(
            r#"
            SELECT
                id, decimals, name, symbol, underlying_asset,
                total_supply, staked_asset, asset_harvested,
                shares_minted, shares_burned,
                share_age, share_age_destroyed, ratio, updated_at
            FROM pools
            WHERE id = $1
            "#,
        )
        .bind(&query.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> PoolMetadata {
        PoolMetadata {
            decimals: 18,
            name: "Staked Share".to_string(),
            symbol: "sSHR".to_string(),
            underlying_asset: Address::parse("0x00000000000000000000000000000000000000a5").unwrap(),
        }
    }

    fn pool() -> Pool {
        let id = Address::parse("0x00000000000000000000000000000000000000b0").unwrap();
        Pool::new(id, metadata(), 1_000)
    }

    #[test]
    fn test_new_pool_is_zeroed() {
        let pool = pool();
        assert_eq!(pool.decimals, 18);
        assert_eq!(pool.symbol, "sSHR");
        assert!(pool.total_supply.is_zero());
        assert!(pool.share_age.is_zero());
        assert!(pool.ratio.is_zero());
        assert_eq!(pool.updated_at, 1_000);
    }

    #[test]
    fn test_refresh_totals_updates_ratio() {
        let mut pool = pool();
        let refresh = pool.refresh_totals(Totals {
            total_supply: Decimal::from(200),
            staked_asset: Decimal::from(300),
        });
        assert_eq!(refresh, RatioRefresh::Updated("1.5".parse().unwrap()));
        assert_eq!(pool.ratio, "1.5".parse::<Decimal>().unwrap());
        assert_eq!(pool.total_supply, Decimal::from(200));
    }

    #[test]
    fn test_refresh_totals_keeps_ratio_without_supply() {
        let mut pool = pool();
        pool.ratio = Decimal::from(2);
        let refresh = pool.refresh_totals(Totals {
            total_supply: Decimal::ZERO,
            staked_asset: Decimal::from(7),
        });
        assert_eq!(refresh, RatioRefresh::Retained(Decimal::from(2)));
        assert_eq!(pool.ratio, Decimal::from(2));
        assert_eq!(pool.staked_asset, Decimal::from(7));
    }
}
