use crate::amount::SECONDS_PER_DAY;
use crate::entities::{Pool, Timeframe};
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;

/// Pool activity rolled up per UTC day.
///
/// `share_supply`, `share_age` and `ratio` are snapshots overwritten by every
/// mint or burn of the day. The remaining amounts accumulate from zero.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DailyBucket {
    /// Days since the unix epoch; the bucket key.
    pub day: i64,
    /// Unix seconds of the start of the day.
    pub date: i64,
    pub timeframe: Timeframe,
    pub staked_asset: Decimal,
    pub asset_harvested: Decimal,
    pub share_age: Decimal,
    pub share_age_destroyed: Decimal,
    pub shares_minted: Decimal,
    pub shares_burned: Decimal,
    pub share_supply: Decimal,
    pub ratio: Decimal,
}

/// UTC day index of a unix timestamp.
pub fn day_index(timestamp: i64) -> i64 {
    timestamp.div_euclid(SECONDS_PER_DAY)
}

impl DailyBucket {
    pub fn new(day: i64) -> Self {
        Self {
            day,
            date: day * SECONDS_PER_DAY,
            timeframe: Timeframe::Day,
            staked_asset: Decimal::ZERO,
            asset_harvested: Decimal::ZERO,
            share_age: Decimal::ZERO,
            share_age_destroyed: Decimal::ZERO,
            shares_minted: Decimal::ZERO,
            shares_burned: Decimal::ZERO,
            share_supply: Decimal::ZERO,
            ratio: Decimal::ZERO,
        }
    }

    /// Copy the pool's point-in-time values into the bucket.
    pub fn snapshot(&mut self, pool: &Pool) {
        self.share_supply = pool.total_supply;
        self.share_age = pool.share_age;
        self.ratio = pool.ratio;
    }

    /// Insert or update this bucket inside a transaction.
    pub async fn upsert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO daily_buckets (
                day, date, timeframe,
                staked_asset, asset_harvested,
                share_age, share_age_destroyed,
                shares_minted, shares_burned,
                share_supply, ratio
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (day) DO UPDATE SET
                staked_asset = EXCLUDED.staked_asset,
                asset_harvested = EXCLUDED.asset_harvested,
                share_age = EXCLUDED.share_age,
                share_age_destroyed = EXCLUDED.share_age_destroyed,
                shares_minted = EXCLUDED.shares_minted,
                shares_burned = EXCLUDED.shares_burned,
                share_supply = EXCLUDED.share_supply,
                ratio = EXCLUDED.ratio
            "#,
        )
        .bind(self.day)
        .bind(self.date)
        .bind(self.timeframe)
        .bind(self.staked_asset)
        .bind(self.asset_harvested)
        .bind(self.share_age)
        .bind(self.share_age_destroyed)
        .bind(self.shares_minted)
        .bind(self.shares_burned)
        .bind(self.share_supply)
        .bind(self.ratio)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

const BUCKET_COLUMNS: &str = r#"
    day, date, timeframe,
    staked_asset, asset_harvested,
    share_age, share_age_destroyed,
    shares_minted, shares_burned,
    share_supply, ratio
"#;

#[derive(Debug, Clone)]
/// Get the bucket of a single day.
pub struct GetDailyBucket {
    pub day: i64,
}

impl Processor<GetDailyBucket> for DatabaseProcessor {
    type Output = Option<DailyBucket>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetDailyBucket")]
    async fn process(&self, query: GetDailyBucket) -> Result<Option<DailyBucket>, sqlx::Error> {
        let sql = format!("SELECT {BUCKET_COLUMNS} FROM daily_buckets WHERE day = $1");
        let bucket = sqlx::query_as::<_, DailyBucket>(&sql)
            .bind(query.day)
            .fetch_optional(&self.pool)
            .await?;
        Ok(bucket)
    }
}

#[derive(Debug, Clone)]
/// List buckets in an inclusive day range, oldest first.
///
/// Days without events have no bucket and are absent from the result.
pub struct ListDailyBuckets {
    pub from_day: i64,
    pub to_day: i64,
}

impl Processor<ListDailyBuckets> for DatabaseProcessor {
    type Output = Vec<DailyBucket>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListDailyBuckets")]
    async fn process(&self, query: ListDailyBuckets) -> Result<Vec<DailyBucket>, sqlx::Error> {
        let sql = format!(
            "SELECT {BUCKET_COLUMNS} FROM daily_buckets \
             WHERE day BETWEEN $1 AND $2 \
             ORDER BY day ASC"
        );
        let buckets = sqlx::query_as::<_, DailyBucket>(&sql)
            .bind(query.from_day)
            .bind(query.to_day)
            .fetch_all(&self.pool)
            .await?;
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_index() {
        assert_eq!(day_index(0), 0);
        assert_eq!(day_index(86_399), 0);
        assert_eq!(day_index(86_400), 1);
        assert_eq!(day_index(1_700_000_000), 19_675);
        assert_eq!(day_index(-1), -1);
    }

    #[test]
    fn test_new_bucket_starts_at_midnight() {
        let bucket = DailyBucket::new(19_675);
        assert_eq!(bucket.date, 19_675 * 86_400);
        assert_eq!(bucket.timeframe, Timeframe::Day);
        assert!(bucket.shares_minted.is_zero());
        assert!(bucket.ratio.is_zero());
    }
}
