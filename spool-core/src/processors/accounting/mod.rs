//! Accounting engine.
//!
//! The engine turns each share-token transfer into updates of the pool, the
//! holders involved and the day's bucket:
//! - Mints (from the sentinel) add shares, cost basis and age to the recipient
//! - Burns (to the sentinel) remove shares and age and record harvested asset
//! - Holder-to-holder transfers move age from sender to recipient and adjust
//!   the recipient's cost basis
//!
//! Every event refreshes the pool ratio from the [`TotalsOracle`] before any
//! branch runs, and all records touched by the event are committed together
//! with the event's position.

mod branches;
mod lifecycle;


use crate::address::Address;
use crate::age::AgeError;
use crate::amount::{self, AmountError};
use crate::config::AccountingConfig;
use crate::entities::{Membership, RatioRefresh};
use crate::events::{SkipReason, TransferEvent, TransferKind, TransferOutcome};
use crate::oracle::{OracleError, TotalsOracle};
use crate::store::{ChangeSet, EntityStore, StoreError};
use branches::Step;
use kanau::processor::Processor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AccountingError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("amount error: {0}")]
    Amount(#[from] AmountError),

    #[error("invariant violated by {tx_hash}: {source}")]
    Invariant {
        tx_hash: String,
        #[source]
        source: AgeError,
    },
}

pub struct AccountingEngine {
    store: Arc<dyn EntityStore>,
    oracle: Arc<dyn TotalsOracle>,
    config: AccountingConfig,
}

impl AccountingEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        oracle: Arc<dyn TotalsOracle>,
        config: AccountingConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    pub fn config(&self) -> &AccountingConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Apply one transfer and commit its effects with its position.
    ///
    /// Nothing is written when an error is returned, so the event can be
    /// retried as a whole. Skipped events write nothing either; the caller
    /// decides whether to advance the checkpoint past them.
    pub async fn on_transfer(
        &self,
        event: TransferEvent,
    ) -> Result<TransferOutcome, AccountingError> {
        let value = amount::from_raw(event.value, self.config.value_scale)?;
        if value.is_zero() {
            warn!(
                value = event.value,
                tx = %event.tx_hash,
                "Transfer of zero value, skipping"
            );
            return Ok(TransferOutcome::Skipped(SkipReason::ZeroValue));
        }
        let Some(kind) = event.classify(&self.config.sentinel) else {
            warn!(
                tx = %event.tx_hash,
                log_index = event.log_index,
                "Transfer between sentinel addresses, skipping"
            );
            return Ok(TransferOutcome::Skipped(SkipReason::Degenerate));
        };

        let timestamp = event.block.timestamp;
        let mut pool = self.get_pool(timestamp).await?.entity;
        let totals = self.oracle.current_totals(event.block).await?;
        match pool.refresh_totals(totals) {
            RatioRefresh::Updated(ratio) => {
                debug!(pool = %pool.id, ratio = %ratio, "Refreshed ratio");
            }
            RatioRefresh::Retained(ratio) => {
                debug!(pool = %pool.id, ratio = %ratio, "Total supply is zero, keeping ratio");
            }
        }
        let step = Step {
            value,
            what: value * pool.ratio,
            timestamp,
            policy: self.config.invariant_policy,
        };
        let invariant = |source: AgeError| AccountingError::Invariant {
            tx_hash: event.tx_hash.clone(),
            source,
        };

        // The pool goes first: holders reference it.
        let mut changes = ChangeSet::new();
        match kind {
            TransferKind::Mint => {
                let mut holder = self.get_holder(&event.to, timestamp).await?.entity;
                let mut bucket = self.get_daily_bucket(timestamp).await?.entity;
                let membership = branches::apply_mint(&mut pool, &mut holder, &mut bucket, &step)
                    .map_err(invariant)?;
                info!(
                    holder = %holder.id,
                    value = %step.value,
                    asset = %step.what,
                    tx = %event.tx_hash,
                    "Minted shares"
                );
                log_membership(&holder.id, membership);
                changes.push(pool);
                changes.push(holder);
                changes.push(bucket);
            }
            TransferKind::Burn => {
                let mut holder = self.get_holder(&event.from, timestamp).await?.entity;
                let mut bucket = self.get_daily_bucket(timestamp).await?.entity;
                let debit = branches::apply_burn(&mut pool, &mut holder, &mut bucket, &step)
                    .map_err(invariant)?;
                info!(
                    holder = %holder.id,
                    value = %step.value,
                    asset = %step.what,
                    age_destroyed = %debit.destroyed,
                    tx = %event.tx_hash,
                    "Burned shares"
                );
                log_membership(&holder.id, debit.membership);
                changes.push(pool);
                changes.push(holder);
                changes.push(bucket);
            }
            TransferKind::Transfer => {
                let mut sender = self.get_holder(&event.from, timestamp).await?.entity;
                let debit = branches::apply_transfer_out(&mut sender, &pool.id, &step)
                    .map_err(invariant)?;
                log_membership(&sender.id, debit.membership);

                // A self-transfer continues on the sender's record.
                let mut recipient = if event.to == event.from {
                    None
                } else {
                    Some(self.get_holder(&event.to, timestamp).await?.entity)
                };
                let target = recipient.as_mut().unwrap_or(&mut sender);
                let credit =
                    branches::apply_transfer_in(target, &pool.id, debit.destroyed, &step)
                        .map_err(invariant)?;
                log_membership(&target.id, credit.membership);
                if let Some(basis) = credit.basis {
                    debug!(holder = %target.id, basis = %basis, "Recipient cost basis moved");
                }
                info!(
                    from = %event.from,
                    to = %event.to,
                    value = %step.value,
                    age_moved = %debit.destroyed,
                    tx = %event.tx_hash,
                    "Transferred shares"
                );
                changes.push(pool);
                changes.push(sender);
                if let Some(recipient) = recipient {
                    changes.push(recipient);
                }
            }
        }

        self.store
            .commit(changes.with_checkpoint(event.position()))
            .await?;
        Ok(TransferOutcome::Applied(kind))
    }
}

fn log_membership(holder: &Address, membership: Membership) {
    match membership {
        Membership::Entered => info!(holder = %holder, "Holder entered the pool"),
        Membership::Left => info!(holder = %holder, "Holder left the pool"),
        Membership::Unchanged => {}
    }
}

impl Processor<TransferEvent> for AccountingEngine {
    type Output = TransferOutcome;
    type Error = AccountingError;
    #[tracing::instrument(skip_all, err, fields(tx = %event.tx_hash, log_index = event.log_index))]
    async fn process(&self, event: TransferEvent) -> Result<TransferOutcome, AccountingError> {
        self.on_transfer(event).await
    }
}
