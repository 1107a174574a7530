//! Event processors.
//!
//! - `AccountingEngine`: applies each `TransferEvent` to pool, holders and buckets
//! - `LogSync`: reads confirmed `Transfer` logs from a JSON-RPC node
//! - `TransferIndexer`: drives `LogSync` into the engine with checkpointing

pub mod accounting;
pub mod indexer;
pub mod log_sync;

pub use accounting::{AccountingEngine, AccountingError};
pub use indexer::{IndexerError, TickReport, TransferIndexer};
pub use log_sync::{LogSync, SyncError, TransferSource};
