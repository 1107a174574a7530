//! Accounting engine configuration.

use crate::address::Address;
use crate::amount::DEFAULT_VALUE_SCALE;
use serde::{Deserialize, Serialize};

/// What the engine does when a balance invariant does not hold.
///
/// Violations can only come from an event stream that disagrees with the
/// ledger (missed events, a start block after the first mint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvariantPolicy {
    /// Fail the event with `AccountingError::Invariant`.
    Strict,
    /// Log the violation and clamp to the nearest valid value.
    #[default]
    Clamp,
}

/// Accounting engine configuration.
#[derive(Debug, Clone)]
pub struct AccountingConfig {
    /// Id of the singleton pool; the share-token contract address.
    pub pool_id: Address,
    /// Counterparty address that marks mints (as sender) and burns (as recipient).
    pub sentinel: Address,
    /// Decimal scale of raw transfer values.
    pub value_scale: u32,
    pub invariant_policy: InvariantPolicy,
}

impl AccountingConfig {
    /// Create a config with the zero-address sentinel and the default scale.
    pub fn new(pool_id: Address) -> Self {
        Self {
            pool_id,
            sentinel: Address::ZERO,
            value_scale: DEFAULT_VALUE_SCALE,
            invariant_policy: InvariantPolicy::default(),
        }
    }

    pub fn with_invariant_policy(mut self, policy: InvariantPolicy) -> Self {
        self.invariant_policy = policy;
        self
    }

    pub fn with_value_scale(mut self, scale: u32) -> Self {
        self.value_scale = scale;
        self
    }
}
