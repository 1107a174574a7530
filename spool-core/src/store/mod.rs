//! Persistence of pool, holder and bucket records.
//!
//! The engine reads records one at a time and writes every record it touched
//! for an event, together with the event's position, as one [`ChangeSet`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::address::Address;
use crate::entities::holder::ListHolders;
use crate::entities::{DailyBucket, Entity, Holder, Pool};
use crate::events::EventPosition;
use async_trait::async_trait;
use smallvec::SmallVec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The change set would move the checkpoint backwards or re-commit it.
    #[error("checkpoint {attempted} is not after the committed checkpoint {current}")]
    CheckpointRegression {
        current: EventPosition,
        attempted: EventPosition,
    },
}

/// A record returned by a get-or-create lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub entity: T,
    /// The record did not exist and was built by its constructor.
    pub created: bool,
}

impl<T> Loaded<T> {
    pub fn existing(entity: T) -> Self {
        Self {
            entity,
            created: false,
        }
    }

    pub fn created(entity: T) -> Self {
        Self {
            entity,
            created: true,
        }
    }
}

/// Records and checkpoint written atomically.
///
/// Later entries for the same key overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub entities: SmallVec<[Entity; 4]>,
    pub checkpoint: Option<EventPosition>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A change set that only advances the checkpoint.
    pub fn checkpoint_only(position: EventPosition) -> Self {
        Self {
            entities: SmallVec::new(),
            checkpoint: Some(position),
        }
    }

    pub fn push(&mut self, entity: impl Into<Entity>) {
        self.entities.push(entity.into());
    }

    pub fn with_checkpoint(mut self, position: EventPosition) -> Self {
        self.checkpoint = Some(position);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.checkpoint.is_none()
    }
}

/// Check that `attempted` moves strictly past `current`.
pub(crate) fn ensure_advances(
    current: Option<EventPosition>,
    attempted: EventPosition,
) -> Result<(), StoreError> {
    match current {
        Some(current) if attempted <= current => {
            Err(StoreError::CheckpointRegression { current, attempted })
        }
        _ => Ok(()),
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load_pool(&self, id: &Address) -> Result<Option<Pool>, StoreError>;

    async fn load_holder(&self, address: &Address) -> Result<Option<Holder>, StoreError>;

    async fn load_daily_bucket(&self, day: i64) -> Result<Option<DailyBucket>, StoreError>;

    /// Upsert every entity and move the checkpoint, all or nothing.
    async fn commit(&self, changes: ChangeSet) -> Result<(), StoreError>;

    /// Position of the last committed event, if any.
    async fn checkpoint(&self) -> Result<Option<EventPosition>, StoreError>;

    async fn save_checkpoint(&self, position: EventPosition) -> Result<(), StoreError> {
        self.commit(ChangeSet::checkpoint_only(position)).await
    }

    async fn list_holders(&self, query: ListHolders) -> Result<Vec<Holder>, StoreError>;

    /// Buckets with `from_day <= day <= to_day`, oldest first.
    async fn list_daily_buckets(
        &self,
        from_day: i64,
        to_day: i64,
    ) -> Result<Vec<DailyBucket>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(block_number: u64, log_index: u32) -> EventPosition {
        EventPosition {
            block_number,
            log_index,
        }
    }

    #[test]
    fn test_ensure_advances() {
        assert!(ensure_advances(None, pos(0, 0)).is_ok());
        assert!(ensure_advances(Some(pos(4, 2)), pos(4, 3)).is_ok());
        assert!(ensure_advances(Some(pos(4, 2)), pos(5, 0)).is_ok());
        assert!(matches!(
            ensure_advances(Some(pos(4, 2)), pos(4, 2)),
            Err(StoreError::CheckpointRegression { .. })
        ));
        assert!(ensure_advances(Some(pos(4, 2)), pos(3, 9)).is_err());
    }

    #[test]
    fn test_change_set() {
        let mut changes = ChangeSet::new();
        assert!(changes.is_empty());
        changes.push(DailyBucket::new(3));
        let changes = changes.with_checkpoint(pos(1, 0));
        assert_eq!(changes.entities.len(), 1);
        assert_eq!(changes.checkpoint, Some(pos(1, 0)));
        assert!(!ChangeSet::checkpoint_only(pos(1, 0)).is_empty());
    }
}
