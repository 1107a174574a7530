//! Ledger events consumed by the accounting engine.
//!
//! Events arrive in chain order and carry everything the engine needs;
//! entity state is always re-read from the store.

pub mod types;

pub use types::{
    BlockRef, EventPosition, SkipReason, TransferEvent, TransferKind, TransferOutcome,
};
