//! Share-age arithmetic.
//!
//! Share-age is balance held over time, measured in balance-days. An entity
//! with balance `B` and accumulated age `A` last touched at `t0` has, at
//! `t1`, age `A + B * (t1 - t0) / 86400`. When part of the balance leaves,
//! the age leaving with it is the average age per unit times the units
//! removed, which keeps the average age of what remains unchanged.
//!
//! Every routine that could divide by zero says so in its return type.

use crate::amount::SECONDS_PER_DAY;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgeError {
    /// Age destruction was requested on an entity that holds nothing.
    #[error("cannot remove {delta} from an empty balance")]
    EmptyBalance { delta: Decimal },

    /// More was removed than the entity holds.
    #[error("cannot remove {delta} from a balance of {balance}")]
    Overdrawn { balance: Decimal, delta: Decimal },

    /// The event is older than the entity's last update.
    #[error("event at {now} precedes last update at {last}")]
    ClockRegression { last: i64, now: i64 },
}

/// Days elapsed between two unix timestamps.
pub fn elapsed_days(last: i64, now: i64) -> Result<Decimal, AgeError> {
    if now < last {
        return Err(AgeError::ClockRegression { last, now });
    }
    Ok(Decimal::from(now - last) / Decimal::from(SECONDS_PER_DAY))
}

/// Age after holding `balance` for `days`.
pub fn accrue(age: Decimal, balance: Decimal, days: Decimal) -> Decimal {
    age + days * balance
}

/// Age leaving an entity whose balance drops by `delta`.
///
/// `age` must already include accrual up to the moment of removal. Removing
/// the whole balance destroys all of `age` without dividing. The result never
/// exceeds `age`, so subtracting it cannot make age negative.
pub fn destroyed_age(age: Decimal, balance: Decimal, delta: Decimal) -> Result<Decimal, AgeError> {
    if delta <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    if balance <= Decimal::ZERO {
        return Err(AgeError::EmptyBalance { delta });
    }
    if delta > balance {
        return Err(AgeError::Overdrawn { balance, delta });
    }
    if delta == balance {
        return Ok(age);
    }
    Ok((age / balance * delta).min(age))
}

/// Conversion ratio of staked asset per share.
///
/// `None` when there is no supply; callers keep their previous ratio.
pub fn share_ratio(staked_asset: Decimal, total_supply: Decimal) -> Option<Decimal> {
    if total_supply.is_zero() {
        return None;
    }
    Some(staked_asset / total_supply)
}
