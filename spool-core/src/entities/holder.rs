use crate::address::Address;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use rust_decimal::Decimal;

/// Per-address position, flows and share-age.
///
/// Holders are never deleted. `pool_id` is set while the balance is positive
/// and cleared when it returns to zero.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Holder {
    pub id: Address,
    pub pool_id: Option<Address>,
    pub share_balance: Decimal,
    pub shares_minted: Decimal,
    pub shares_burned: Decimal,
    pub staked_asset: Decimal,
    pub asset_harvested: Decimal,
    pub share_out: Decimal,
    pub asset_out: Decimal,
    pub share_in: Decimal,
    pub asset_in: Decimal,
    pub share_age: Decimal,
    pub share_age_destroyed: Decimal,
    pub share_offset: Decimal,
    pub asset_offset: Decimal,
    pub updated_at: i64,
}

/// Change in pool membership caused by a balance update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Entered,
    Left,
    Unchanged,
}

impl Holder {
    pub fn new(id: Address, timestamp: i64) -> Self {
        Self {
            id,
            pool_id: None,
            share_balance: Decimal::ZERO,
            shares_minted: Decimal::ZERO,
            shares_burned: Decimal::ZERO,
            staked_asset: Decimal::ZERO,
            asset_harvested: Decimal::ZERO,
            share_out: Decimal::ZERO,
            asset_out: Decimal::ZERO,
            share_in: Decimal::ZERO,
            asset_in: Decimal::ZERO,
            share_age: Decimal::ZERO,
            share_age_destroyed: Decimal::ZERO,
            share_offset: Decimal::ZERO,
            asset_offset: Decimal::ZERO,
            updated_at: timestamp,
        }
    }

    pub fn is_member(&self) -> bool {
        self.pool_id.is_some()
    }

    /// Point `pool_id` at the pool iff the balance is positive.
    pub fn sync_membership(&mut self, pool_id: &Address) -> Membership {
        let holds = self.share_balance > Decimal::ZERO;
        match (holds, self.pool_id.is_some()) {
            (true, false) => {
                self.pool_id = Some(pool_id.clone());
                Membership::Entered
            }
            (false, true) => {
                self.pool_id = None;
                Membership::Left
            }
            _ => Membership::Unchanged,
        }
    }

    /// Insert or update this holder inside a transaction.
    pub async fn upsert_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO holders (
                id, pool_id, share_balance, shares_minted, shares_burned,
                staked_asset, asset_harvested,
                share_out, asset_out, share_in, asset_in,
                share_age, share_age_destroyed, share_offset, asset_offset,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE SET
                pool_id = EXCLUDED.pool_id,
                share_balance = EXCLUDED.share_balance,
                shares_minted = EXCLUDED.shares_minted,
                shares_burned = EXCLUDED.shares_burned,
                staked_asset = EXCLUDED.staked_asset,
                asset_harvested = EXCLUDED.asset_harvested,
                share_out = EXCLUDED.share_out,
                asset_out = EXCLUDED.asset_out,
                share_in = EXCLUDED.share_in,
                asset_in = EXCLUDED.asset_in,
                share_age = EXCLUDED.share_age,
                share_age_destroyed = EXCLUDED.share_age_destroyed,
                share_offset = EXCLUDED.share_offset,
                asset_offset = EXCLUDED.asset_offset,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&self.id)
        .bind(&self.pool_id)
        .bind(self.share_balance)
        .bind(self.shares_minted)
        .bind(self.shares_burned)
        .bind(self.staked_asset)
        .bind(self.asset_harvested)
        .bind(self.share_out)
        .bind(self.asset_out)
        .bind(self.share_in)
        .bind(self.asset_in)
        .bind(self.share_age)
        .bind(self.share_age_destroyed)
        .bind(self.share_offset)
        .bind(self.asset_offset)
        .bind(self.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

const HOLDER_COLUMNS: &str = r#"
    id, pool_id, share_balance, shares_minted, shares_burned,
    staked_asset, asset_harvested,
    share_out, asset_out, share_in, asset_in,
    share_age, share_age_destroyed, share_offset, asset_offset,
    updated_at
"#;

#[derive(Debug, Clone)]
/// Get a holder by address.
pub struct GetHolder {
    pub address: Address,
}

impl Processor<GetHolder> for DatabaseProcessor {
    type Output = Option<Holder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetHolder")]
    async fn process(&self, query: GetHolder) -> Result<Option<Holder>, sqlx::Error> {
        let sql = format!("SELECT {HOLDER_COLUMNS} FROM holders WHERE id = $1");
        let holder = sqlx::query_as::<_, Holder>(&sql)
            .bind(&query.address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(holder)
    }
}

#[derive(Debug, Clone)]
/// List holders ordered by balance, largest first.
///
/// With `members_only`, holders whose balance returned to zero are skipped.
pub struct ListHolders {
    pub members_only: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListHolders> for DatabaseProcessor {
    type Output = Vec<Holder>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListHolders")]
    async fn process(&self, query: ListHolders) -> Result<Vec<Holder>, sqlx::Error> {
        let sql = format!(
            "SELECT {HOLDER_COLUMNS} FROM holders \
             WHERE ($1 = false OR pool_id IS NOT NULL) \
             ORDER BY share_balance DESC, id ASC \
             LIMIT $2 OFFSET $3"
        );
        let holders = sqlx::query_as::<_, Holder>(&sql)
            .bind(query.members_only)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(holders)
    }
}
