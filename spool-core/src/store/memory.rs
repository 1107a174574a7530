//! In-process store for tests and embedding hosts.

use super::{ChangeSet, EntityStore, StoreError, ensure_advances};
use crate::address::Address;
use crate::entities::holder::ListHolders;
use crate::entities::{DailyBucket, Entity, Holder, Pool};
use crate::events::EventPosition;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    pools: HashMap<Address, Pool>,
    holders: HashMap<Address, Holder>,
    buckets: BTreeMap<i64, DailyBucket>,
    checkpoint: Option<EventPosition>,
}

/// `EntityStore` kept in memory behind a single lock.
///
/// A commit validates the checkpoint and applies the whole change set under
/// one write guard, so readers never observe half an event.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every holder ever created, in address order.
    pub async fn all_holders(&self) -> Vec<Holder> {
        let state = self.state.read().await;
        let mut holders: Vec<Holder> = state.holders.values().cloned().collect();
        holders.sort_by(|a, b| a.id.cmp(&b.id));
        holders
    }

    pub async fn all_daily_buckets(&self) -> Vec<DailyBucket> {
        self.state.read().await.buckets.values().cloned().collect()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load_pool(&self, id: &Address) -> Result<Option<Pool>, StoreError> {
        Ok(self.state.read().await.pools.get(id).cloned())
    }

    async fn load_holder(&self, address: &Address) -> Result<Option<Holder>, StoreError> {
        Ok(self.state.read().await.holders.get(address).cloned())
    }

    async fn load_daily_bucket(&self, day: i64) -> Result<Option<DailyBucket>, StoreError> {
        Ok(self.state.read().await.buckets.get(&day).cloned())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(position) = changes.checkpoint {
            ensure_advances(state.checkpoint, position)?;
            state.checkpoint = Some(position);
        }
        for entity in changes.entities {
            match entity {
                Entity::Pool(pool) => {
                    state.pools.insert(pool.id.clone(), pool);
                }
                Entity::Holder(holder) => {
                    state.holders.insert(holder.id.clone(), holder);
                }
                Entity::DailyBucket(bucket) => {
                    state.buckets.insert(bucket.day, bucket);
                }
            }
        }
        Ok(())
    }

    async fn checkpoint(&self) -> Result<Option<EventPosition>, StoreError> {
        Ok(self.state.read().await.checkpoint)
    }

    async fn list_holders(&self, query: ListHolders) -> Result<Vec<Holder>, StoreError> {
        let state = self.state.read().await;
        let mut holders: Vec<&Holder> = state
            .holders
            .values()
            .filter(|h| !query.members_only || h.is_member())
            .collect();
        holders.sort_by(|a, b| {
            b.share_balance
                .cmp(&a.share_balance)
                .then_with(|| a.id.cmp(&b.id))
        });
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(holders
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_daily_buckets(
        &self,
        from_day: i64,
        to_day: i64,
    ) -> Result<Vec<DailyBucket>, StoreError> {
        if from_day > to_day {
            return Ok(Vec::new());
        }
        let state = self.state.read().await;
        Ok(state
            .buckets
            .range(from_day..=to_day)
            .map(|(_, bucket)| bucket.clone())
            .collect())
    }
}
