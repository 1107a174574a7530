//! Postgres-backed store.

use super::{ChangeSet, EntityStore, StoreError, ensure_advances};
use crate::address::Address;
use crate::entities::daily_bucket::{GetDailyBucket, ListDailyBuckets};
use crate::entities::holder::{GetHolder, ListHolders};
use crate::entities::pool::GetPool;
use crate::entities::sync_checkpoint::{self, GetSyncCheckpoint};
use crate::entities::{DailyBucket, Entity, Holder, Pool};
use crate::events::EventPosition;
use crate::framework::DatabaseProcessor;
use async_trait::async_trait;
use kanau::processor::Processor;
use sqlx::PgPool;

pub struct PgStore {
    db: DatabaseProcessor,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            db: DatabaseProcessor::new(pool),
        }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn load_pool(&self, id: &Address) -> Result<Option<Pool>, StoreError> {
        Ok(self.db.process(GetPool { id: id.clone() }).await?)
    }

    async fn load_holder(&self, address: &Address) -> Result<Option<Holder>, StoreError> {
        Ok(self
            .db
            .process(GetHolder {
                address: address.clone(),
            })
            .await?)
    }

    async fn load_daily_bucket(&self, day: i64) -> Result<Option<DailyBucket>, StoreError> {
        Ok(self.db.process(GetDailyBucket { day }).await?)
    }

    #[tracing::instrument(skip_all, err, name = "SQL:Commit")]
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        if let Some(position) = changes.checkpoint {
            ensure_advances(sync_checkpoint::load_for_update_tx(&mut tx).await?, position)?;
        }
        for entity in &changes.entities {
            match entity {
                Entity::Pool(pool) => pool.upsert_tx(&mut tx).await?,
                Entity::Holder(holder) => holder.upsert_tx(&mut tx).await?,
                Entity::DailyBucket(bucket) => bucket.upsert_tx(&mut tx).await?,
            }
        }
        if let Some(position) = changes.checkpoint {
            sync_checkpoint::save_tx(&mut tx, position).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn checkpoint(&self) -> Result<Option<EventPosition>, StoreError> {
        Ok(self.db.process(GetSyncCheckpoint).await?)
    }

    async fn list_holders(&self, query: ListHolders) -> Result<Vec<Holder>, StoreError> {
        Ok(self.db.process(query).await?)
    }

    async fn list_daily_buckets(
        &self,
        from_day: i64,
        to_day: i64,
    ) -> Result<Vec<DailyBucket>, StoreError> {
        Ok(self
            .db
            .process(ListDailyBuckets { from_day, to_day })
            .await?)
    }
}
