pub mod history;
pub mod holder;
pub mod pool;

pub use history::{DailyBucketResponse, HistoryQuery};
pub use holder::{HolderResponse, ListHoldersQuery, clamp_pagination};
pub use pool::PoolResponse;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Rollup granularity of a history bucket.
pub enum Timeframe {
    Day,
}
