//! Per-branch entity updates.
//!
//! These functions only touch the records passed in. Loading, ratio refresh
//! and committing happen in the engine.

use crate::address::Address;
use crate::age::{self, AgeError};
use crate::config::InvariantPolicy;
use crate::entities::{DailyBucket, Holder, Membership, Pool};
use rust_decimal::Decimal;
use tracing::{debug, error};

/// One event's amounts and clock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step {
    /// Shares moved, in decimal units.
    pub value: Decimal,
    /// Staked asset equivalent of `value` at the refreshed ratio.
    pub what: Decimal,
    pub timestamp: i64,
    pub policy: InvariantPolicy,
}

/// Sender-side result of a decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Debit {
    pub membership: Membership,
    pub destroyed: Decimal,
}

/// Recipient-side result of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Credit {
    pub membership: Membership,
    /// Cost basis added to `staked_asset`, if the offset moved.
    pub basis: Option<Decimal>,
}

impl Step {
    fn recover(&self, err: AgeError, subject: &Address) -> Result<(), AgeError> {
        match self.policy {
            InvariantPolicy::Strict => Err(err),
            InvariantPolicy::Clamp => {
                error!(subject = %subject, error = %err, "Invariant violated, clamping");
                Ok(())
            }
        }
    }

    fn elapsed_days(&self, last: i64, subject: &Address) -> Result<Decimal, AgeError> {
        match age::elapsed_days(last, self.timestamp) {
            Ok(days) => Ok(days),
            Err(err) => self.recover(err, subject).map(|_| Decimal::ZERO),
        }
    }

    /// Age leaving with `value`; clamps to all of `share_age`.
    fn destroyed_age(
        &self,
        share_age: Decimal,
        balance: Decimal,
        subject: &Address,
    ) -> Result<Decimal, AgeError> {
        match age::destroyed_age(share_age, balance, self.value) {
            Ok(destroyed) => Ok(destroyed),
            Err(err) => self.recover(err, subject).map(|_| share_age),
        }
    }
}

fn accrue_holder(holder: &mut Holder, step: &Step) -> Result<(), AgeError> {
    let days = step.elapsed_days(holder.updated_at, &holder.id)?;
    holder.share_age = age::accrue(holder.share_age, holder.share_balance, days);
    holder.updated_at = holder.updated_at.max(step.timestamp);
    Ok(())
}

/// Accrue pool age on the circulating supply derived from the event stream.
fn accrue_pool(pool: &mut Pool, step: &Step) -> Result<(), AgeError> {
    let days = step.elapsed_days(pool.updated_at, &pool.id)?;
    let circulating = pool.circulating().max(Decimal::ZERO);
    pool.share_age = age::accrue(pool.share_age, circulating, days);
    pool.updated_at = pool.updated_at.max(step.timestamp);
    Ok(())
}

/// Remove `step.value` and its age from a holder.
fn debit_holder(holder: &mut Holder, pool_id: &Address, step: &Step) -> Result<Debit, AgeError> {
    accrue_holder(holder, step)?;
    let destroyed = step.destroyed_age(holder.share_age, holder.share_balance, &holder.id)?;
    holder.share_age -= destroyed;
    // Only reachable when an overdraft was clamped.
    holder.share_balance = (holder.share_balance - step.value).max(Decimal::ZERO);
    let membership = holder.sync_membership(pool_id);
    Ok(Debit {
        membership,
        destroyed,
    })
}

pub(crate) fn apply_mint(
    pool: &mut Pool,
    holder: &mut Holder,
    bucket: &mut DailyBucket,
    step: &Step,
) -> Result<Membership, AgeError> {
    accrue_holder(holder, step)?;
    holder.shares_minted += step.value;
    holder.staked_asset += step.what;
    holder.share_balance += step.value;
    let membership = holder.sync_membership(&pool.id);

    accrue_pool(pool, step)?;
    pool.shares_minted += step.value;
    pool.staked_asset += step.what;

    bucket.snapshot(pool);
    bucket.shares_minted += step.value;
    bucket.staked_asset += step.what;

    Ok(membership)
}

pub(crate) fn apply_burn(
    pool: &mut Pool,
    holder: &mut Holder,
    bucket: &mut DailyBucket,
    step: &Step,
) -> Result<Debit, AgeError> {
    holder.shares_burned += step.value;
    holder.asset_harvested += step.what;
    let debit = debit_holder(holder, &pool.id, step)?;
    holder.share_age_destroyed += debit.destroyed;

    accrue_pool(pool, step)?;
    let remaining = pool.share_age - debit.destroyed;
    if remaining < Decimal::ZERO {
        debug!(pool = %pool.id, remaining = %remaining, "Pool age rounded below zero");
    }
    pool.share_age = remaining.max(Decimal::ZERO);
    pool.share_age_destroyed += debit.destroyed;
    pool.shares_burned += step.value;
    pool.asset_harvested += step.what;

    bucket.snapshot(pool);
    bucket.shares_burned += step.value;
    bucket.share_age_destroyed += debit.destroyed;
    bucket.asset_harvested += step.what;

    Ok(debit)
}

/// Sender side of a holder-to-holder transfer.
///
/// The returned `destroyed` age is what the recipient receives.
pub(crate) fn apply_transfer_out(
    holder: &mut Holder,
    pool_id: &Address,
    step: &Step,
) -> Result<Debit, AgeError> {
    let debit = debit_holder(holder, pool_id, step)?;
    holder.share_out += step.value;
    holder.asset_out += step.what;
    Ok(debit)
}

/// Recipient side of a holder-to-holder transfer.
pub(crate) fn apply_transfer_in(
    holder: &mut Holder,
    pool_id: &Address,
    transplanted_age: Decimal,
    step: &Step,
) -> Result<Credit, AgeError> {
    accrue_holder(holder, step)?;
    holder.share_age += transplanted_age;
    holder.share_balance += step.value;
    holder.share_in += step.value;
    holder.asset_in += step.what;
    let membership = holder.sync_membership(pool_id);

    let difference = holder.share_in - holder.share_out - holder.share_offset;
    let basis = if difference > Decimal::ZERO {
        let asset = holder.asset_in - holder.asset_out - holder.asset_offset;
        holder.staked_asset += asset;
        holder.share_offset += difference;
        holder.asset_offset += asset;
        Some(asset)
    } else {
        None
    };

    Ok(Credit { membership, basis })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::PoolMetadata;

    const DAY: i64 = 86_400;

    fn addr(tail: &str) -> Address {
        Address::parse(&format!("0x{tail:0>40}")).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn pool() -> Pool {
        let metadata = PoolMetadata {
            decimals: 18,
            name: "Share".to_string(),
            symbol: "SHR".to_string(),
            underlying_asset: addr("a5"),
        };
        let mut pool = Pool::new(addr("b0"), metadata, 0);
        pool.ratio = Decimal::ONE;
        pool
    }

    fn step(value: &str, what: &str, timestamp: i64, policy: InvariantPolicy) -> Step {
        Step {
            value: dec(value),
            what: dec(what),
            timestamp,
            policy,
        }
    }

    fn minted(pool: &mut Pool, holder: &str, value: &str) -> Holder {
        let mut holder = Holder::new(addr(holder), 0);
        let mut bucket = DailyBucket::new(0);
        apply_mint(
            pool,
            &mut holder,
            &mut bucket,
            &step(value, value, 0, InvariantPolicy::Strict),
        )
        .unwrap();
        holder
    }

    #[test]
    fn test_mint_enters_and_accrues_on_prior_balance() {
        let mut pool = pool();
        let mut holder = minted(&mut pool, "a1", "100");
        assert!(holder.is_member());

        let mut bucket = DailyBucket::new(2);
        let membership = apply_mint(
            &mut pool,
            &mut holder,
            &mut bucket,
            &step("50", "75", 2 * DAY, InvariantPolicy::Strict),
        )
        .unwrap();
        assert_eq!(membership, Membership::Unchanged);
        assert_eq!(holder.share_age, dec("200"));
        assert_eq!(holder.share_balance, dec("150"));
        assert_eq!(holder.staked_asset, dec("175"));
        assert_eq!(pool.share_age, dec("200"));
        assert_eq!(pool.shares_minted, dec("150"));
        assert_eq!(bucket.shares_minted, dec("50"));
        assert_eq!(bucket.staked_asset, dec("75"));
        assert_eq!(bucket.share_age, dec("200"));
    }

    #[test]
    fn test_partial_burn_keeps_average_age() {
        let mut pool = pool();
        let mut holder = minted(&mut pool, "a1", "100");
        let mut bucket = DailyBucket::new(10);
        let debit = apply_burn(
            &mut pool,
            &mut holder,
            &mut bucket,
            &step("25", "25", 10 * DAY, InvariantPolicy::Strict),
        )
        .unwrap();
        assert_eq!(debit.destroyed, dec("250"));
        assert_eq!(debit.membership, Membership::Unchanged);
        assert_eq!(holder.share_age, dec("750"));
        assert_eq!(holder.share_age_destroyed, dec("250"));
        assert_eq!(holder.share_balance, dec("75"));
        assert_eq!(pool.share_age, dec("750"));
        assert_eq!(pool.share_age_destroyed, dec("250"));
        assert_eq!(bucket.share_age_destroyed, dec("250"));
        assert_eq!(bucket.asset_harvested, dec("25"));
    }

    #[test]
    fn test_full_exit_destroys_all_age() {
        let mut pool = pool();
        let mut holder = minted(&mut pool, "a1", "3");
        let mut bucket = DailyBucket::new(0);
        let debit = apply_burn(
            &mut pool,
            &mut holder,
            &mut bucket,
            &step("3", "3", 7 * DAY / 3, InvariantPolicy::Strict),
        )
        .unwrap();
        assert_eq!(debit.membership, Membership::Left);
        assert_eq!(holder.share_age, Decimal::ZERO);
        assert_eq!(holder.share_balance, Decimal::ZERO);
        assert!(!holder.is_member());
    }

    #[test]
    fn test_transfer_transplants_age_and_sets_offset() {
        let mut pool = pool();
        let mut sender = minted(&mut pool, "a1", "100");
        let mut recipient = Holder::new(addr("a2"), 30 * DAY);
        let s = step("40", "60", 30 * DAY, InvariantPolicy::Strict);

        let debit = apply_transfer_out(&mut sender, &pool.id, &s).unwrap();
        let credit = apply_transfer_in(&mut recipient, &pool.id, debit.destroyed, &s).unwrap();

        assert_eq!(debit.destroyed, dec("1200"));
        assert_eq!(sender.share_age, dec("1800"));
        assert_eq!(sender.share_out, dec("40"));
        assert_eq!(sender.asset_out, dec("60"));
        assert_eq!(recipient.share_age, dec("1200"));
        assert_eq!(credit.membership, Membership::Entered);
        assert_eq!(credit.basis, Some(dec("60")));
        assert_eq!(recipient.staked_asset, dec("60"));
        assert_eq!(recipient.share_offset, dec("40"));
        assert_eq!(recipient.asset_offset, dec("60"));
    }

    #[test]
    fn test_offset_only_moves_on_net_inflow() {
        let pool = pool();
        let mut holder = Holder::new(addr("a1"), 0);
        holder.share_balance = dec("10");
        holder.pool_id = Some(pool.id.clone());
        holder.share_out = dec("20");
        let credit = apply_transfer_in(
            &mut holder,
            &pool.id,
            Decimal::ZERO,
            &step("5", "5", 0, InvariantPolicy::Strict),
        )
        .unwrap();
        assert_eq!(credit.basis, None);
        assert!(holder.share_offset.is_zero());
        assert!(holder.staked_asset.is_zero());
    }

    #[test]
    fn test_strict_rejects_overdraft() {
        let mut pool = pool();
        let mut holder = minted(&mut pool, "a1", "10");
        let result = apply_transfer_out(
            &mut holder,
            &pool.id,
            &step("11", "11", DAY, InvariantPolicy::Strict),
        );
        assert!(matches!(result, Err(AgeError::Overdrawn { .. })));
    }

    #[test]
    fn test_clamp_overdraft_empties_holder() {
        let mut pool = pool();
        let mut holder = minted(&mut pool, "a1", "10");
        let debit = apply_transfer_out(
            &mut holder,
            &pool.id,
            &step("11", "11", DAY, InvariantPolicy::Clamp),
        )
        .unwrap();
        assert_eq!(debit.destroyed, dec("10"));
        assert_eq!(holder.share_balance, Decimal::ZERO);
        assert_eq!(holder.share_age, Decimal::ZERO);
        assert_eq!(debit.membership, Membership::Left);
    }

    #[test]
    fn test_clock_regression() {
        let mut pool = pool();
        let mut holder = minted(&mut pool, "a1", "10");
        holder.updated_at = 5 * DAY;

        let mut strict = holder.clone();
        let result = apply_transfer_out(
            &mut strict,
            &pool.id,
            &step("1", "1", DAY, InvariantPolicy::Strict),
        );
        assert!(matches!(result, Err(AgeError::ClockRegression { .. })));

        apply_transfer_out(
            &mut holder,
            &pool.id,
            &step("1", "1", DAY, InvariantPolicy::Clamp),
        )
        .unwrap();
        assert_eq!(holder.updated_at, 5 * DAY);
        assert_eq!(holder.share_balance, dec("9"));
    }
}
