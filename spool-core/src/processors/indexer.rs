//! TransferIndexer runner.
//!
//! The TransferIndexer is responsible for:
//! - Reading the committed checkpoint from the store
//! - Fetching the next confirmed block window from a [`TransferSource`]
//! - Feeding events after the checkpoint to the accounting engine in order
//! - Advancing the checkpoint past skipped events and finished windows
//!
//! Applied events carry their own position into the engine's commit, so a
//! crash between two events resumes right after the last one written.

use super::accounting::{AccountingEngine, AccountingError};
use super::log_sync::{SyncError, TransferSource};
use crate::config::ChainConfig;
use crate::events::{EventPosition, TransferOutcome};
use crate::store::{EntityStore, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("accounting error: {0}")]
    Accounting(#[from] AccountingError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub from_block: u64,
    pub to_block: u64,
    pub safe_head: u64,
    pub applied: u32,
    pub skipped: u32,
}

impl TickReport {
    pub fn caught_up(&self) -> bool {
        self.to_block >= self.safe_head
    }
}

pub struct TransferIndexer<S: TransferSource> {
    source: S,
    engine: Arc<AccountingEngine>,
    start_block: u64,
    batch_size: u64,
    poll_interval: Duration,
}

impl<S: TransferSource + 'static> TransferIndexer<S> {
    pub fn new(source: S, engine: Arc<AccountingEngine>, chain: &ChainConfig) -> Self {
        Self {
            source,
            engine,
            start_block: chain.start_block,
            batch_size: chain.batch_size.max(1),
            poll_interval: chain.poll_interval,
        }
    }

    /// First block that may still hold unprocessed events.
    fn next_block(&self, checkpoint: Option<EventPosition>) -> u64 {
        match checkpoint {
            None => self.start_block,
            Some(p) if p.log_index == u32::MAX => p.block_number + 1,
            Some(p) => p.block_number,
        }
    }

    /// Process one block window. `None` when there is nothing new to read.
    pub async fn tick(&self) -> Result<Option<TickReport>, IndexerError> {
        let store = self.engine.store();
        let checkpoint = store.checkpoint().await?;
        let from_block = self.next_block(checkpoint);
        let safe_head = self.source.safe_head().await?;
        if from_block > safe_head {
            return Ok(None);
        }
        let to_block = safe_head.min(from_block.saturating_add(self.batch_size - 1));

        let events = self.source.fetch(from_block, to_block).await?;
        let mut report = TickReport {
            from_block,
            to_block,
            safe_head,
            applied: 0,
            skipped: 0,
        };
        for event in events {
            let position = event.position();
            if checkpoint.is_some_and(|c| position <= c) {
                continue;
            }
            match self.engine.on_transfer(event).await? {
                TransferOutcome::Applied(_) => report.applied += 1,
                TransferOutcome::Skipped(reason) => {
                    debug!(position = %position, reason = ?reason, "Advancing past skipped event");
                    store.save_checkpoint(position).await?;
                    report.skipped += 1;
                }
            }
        }
        store
            .save_checkpoint(EventPosition::end_of_block(to_block))
            .await?;
        debug!(
            from_block,
            to_block,
            applied = report.applied,
            skipped = report.skipped,
            "Indexed block window"
        );
        Ok(Some(report))
    }

    /// Run until shutdown is signaled.
    ///
    /// Windows are read back to back while behind the safe head, then once
    /// per poll interval. A failed tick is logged and retried on the next
    /// interval from the committed checkpoint.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            start_block = self.start_block,
            batch_size = self.batch_size,
            "TransferIndexer started"
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("TransferIndexer shutting down");
                        break;
                    }
                }

                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(Some(report)) if !report.caught_up() => {
                            info!(
                                to_block = report.to_block,
                                safe_head = report.safe_head,
                                "Catching up"
                            );
                            interval.reset_immediately();
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!(error = %e, "Indexing tick failed");
                        }
                    }
                }
            }
        }

        info!("TransferIndexer shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::config::AccountingConfig;
    use crate::events::{BlockRef, TransferEvent};
    use crate::oracle::testing::ScriptedOracle;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    const UNIT: u128 = 1_000_000_000_000_000_000;

    struct ScriptedSource {
        events: Vec<TransferEvent>,
        safe_head: u64,
        fetched: Mutex<Vec<(u64, u64)>>,
    }

    #[async_trait]
    impl TransferSource for ScriptedSource {
        async fn safe_head(&self) -> Result<u64, SyncError> {
            Ok(self.safe_head)
        }

        async fn fetch(
            &self,
            from_block: u64,
            to_block: u64,
        ) -> Result<Vec<TransferEvent>, SyncError> {
            self.fetched.lock().unwrap().push((from_block, to_block));
            Ok(self
                .events
                .iter()
                .filter(|e| (from_block..=to_block).contains(&e.block.number))
                .cloned()
                .collect())
        }
    }

    fn addr(tail: &str) -> Address {
        Address::parse(&format!("0x{tail:0>40}")).unwrap()
    }

    fn event(block: u64, log_index: u32, from: Address, to: Address, value: u128) -> TransferEvent {
        TransferEvent {
            from,
            to,
            value,
            block: BlockRef {
                number: block,
                timestamp: 1_700_000_000 + block as i64 * 12,
            },
            tx_hash: format!("0x{block:x}{log_index:x}"),
            log_index,
        }
    }

    fn chain(batch_size: u64) -> ChainConfig {
        ChainConfig {
            rpc_url: "http://localhost:8545".parse().unwrap(),
            share_token: addr("b0"),
            staked_token: addr("a5"),
            start_block: 10,
            confirmations: 0,
            batch_size,
            poll_interval: Duration::from_secs(1),
        }
    }

    fn setup(
        events: Vec<TransferEvent>,
        safe_head: u64,
        batch_size: u64,
    ) -> (
        TransferIndexer<ScriptedSource>,
        Arc<MemoryStore>,
        Arc<ScriptedOracle>,
    ) {
        let store = Arc::new(MemoryStore::new());
        let oracle = Arc::new(ScriptedOracle::new());
        oracle.set("1000", "1000");
        let engine = Arc::new(AccountingEngine::new(
            store.clone(),
            oracle.clone(),
            AccountingConfig::new(addr("b0")),
        ));
        let source = ScriptedSource {
            events,
            safe_head,
            fetched: Mutex::new(Vec::new()),
        };
        (
            TransferIndexer::new(source, engine, &chain(batch_size)),
            store,
            oracle,
        )
    }

    #[tokio::test]
    async fn test_windows_advance_checkpoint() {
        let a = addr("a1");
        let events = vec![
            event(10, 0, Address::ZERO, a.clone(), 5 * UNIT),
            event(10, 1, Address::ZERO, a.clone(), 0),
            event(13, 4, a.clone(), addr("a2"), 2 * UNIT),
        ];
        let (indexer, store, _) = setup(events, 14, 3);

        let report = indexer.tick().await.unwrap().unwrap();
        assert_eq!((report.from_block, report.to_block), (10, 12));
        assert_eq!((report.applied, report.skipped), (1, 1));
        assert!(!report.caught_up());
        assert_eq!(
            store.checkpoint().await.unwrap(),
            Some(EventPosition::end_of_block(12))
        );

        let report = indexer.tick().await.unwrap().unwrap();
        assert_eq!((report.from_block, report.to_block), (13, 14));
        assert_eq!(report.applied, 1);
        assert!(report.caught_up());

        assert!(indexer.tick().await.unwrap().is_none());
        let holder = store.load_holder(&addr("a2")).await.unwrap().unwrap();
        assert_eq!(holder.share_balance, Decimal::from(2));
    }

    #[tokio::test]
    async fn test_failed_event_resumes_after_last_commit() {
        let a = addr("a1");
        let events = vec![
            event(10, 0, Address::ZERO, a.clone(), 5 * UNIT),
            event(11, 0, a.clone(), addr("a2"), UNIT),
        ];
        let (indexer, store, oracle) = setup(events, 11, 10);

        // Commit the first event, then fail the oracle for the second.
        let first = indexer.source.events[0].clone();
        indexer.engine.on_transfer(first.clone()).await.unwrap();
        oracle.fail(true);
        assert!(indexer.tick().await.is_err());
        assert_eq!(store.checkpoint().await.unwrap(), Some(first.position()));

        oracle.fail(false);
        let report = indexer.tick().await.unwrap().unwrap();
        assert_eq!(report.from_block, 10);
        assert_eq!(report.applied, 1);
        let holder = store.load_holder(&a).await.unwrap().unwrap();
        assert_eq!(holder.share_balance, Decimal::from(4));
        assert_eq!(
            store.checkpoint().await.unwrap(),
            Some(EventPosition::end_of_block(11))
        );
    }

    #[tokio::test]
    async fn test_nothing_before_start_block() {
        let (indexer, store, _) = setup(Vec::new(), 9, 10);
        assert!(indexer.tick().await.unwrap().is_none());
        assert_eq!(store.checkpoint().await.unwrap(), None);
        assert!(indexer.source.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (indexer, store, _) = setup(
            vec![event(10, 0, Address::ZERO, addr("a1"), UNIT)],
            10,
            10,
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(indexer.run(shutdown_rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(
            store.checkpoint().await.unwrap(),
            Some(EventPosition::end_of_block(10))
        );
    }
}
