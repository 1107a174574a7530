pub mod daily_bucket;
pub mod holder;
pub mod pool;
pub mod sync_checkpoint;

pub use daily_bucket::DailyBucket;
pub use holder::{Holder, Membership};
pub use pool::{Pool, PoolMetadata, RatioRefresh};

use spool_sdk::objects::Timeframe as SdkTimeframe;

/// History rollup granularity for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `spool_sdk::objects::Timeframe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "timeframe")]
pub enum Timeframe {
    Day,
}

impl From<Timeframe> for SdkTimeframe {
    fn from(value: Timeframe) -> Self {
        match value {
            Timeframe::Day => SdkTimeframe::Day,
        }
    }
}

impl From<SdkTimeframe> for Timeframe {
    fn from(value: SdkTimeframe) -> Self {
        match value {
            SdkTimeframe::Day => Timeframe::Day,
        }
    }
}

/// The kinds of record the accounting engine persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Pool,
    Holder,
    DailyBucket,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Pool => write!(f, "pool"),
            EntityKind::Holder => write!(f, "holder"),
            EntityKind::DailyBucket => write!(f, "daily_bucket"),
        }
    }
}

/// A record to upsert, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Pool(Pool),
    Holder(Holder),
    DailyBucket(DailyBucket),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Pool(_) => EntityKind::Pool,
            Entity::Holder(_) => EntityKind::Holder,
            Entity::DailyBucket(_) => EntityKind::DailyBucket,
        }
    }
}

impl From<Pool> for Entity {
    fn from(value: Pool) -> Self {
        Entity::Pool(value)
    }
}

impl From<Holder> for Entity {
    fn from(value: Holder) -> Self {
        Entity::Holder(value)
    }
}

impl From<DailyBucket> for Entity {
    fn from(value: DailyBucket) -> Self {
        Entity::DailyBucket(value)
    }
}
