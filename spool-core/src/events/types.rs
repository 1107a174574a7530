//! Event type definitions.

use crate::address::Address;

/// Block an event was included in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub number: u64,
    /// Unix seconds.
    pub timestamp: i64,
}

/// Total order of events on the chain.
///
/// Derived `Ord` compares block number first, then log index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventPosition {
    pub block_number: u64,
    pub log_index: u32,
}

impl EventPosition {
    /// A position after every log of `block_number`.
    pub fn end_of_block(block_number: u64) -> Self {
        Self {
            block_number,
            log_index: u32::MAX,
        }
    }
}

impl std::fmt::Display for EventPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.block_number, self.log_index)
    }
}

/// A share-token `Transfer(from, to, value)` log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    /// Raw integer amount, before scaling.
    pub value: u128,
    pub block: BlockRef,
    pub tx_hash: String,
    pub log_index: u32,
}

/// How a transfer moves shares relative to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferKind {
    Mint,
    Burn,
    Transfer,
}

impl std::fmt::Display for TransferKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferKind::Mint => write!(f, "mint"),
            TransferKind::Burn => write!(f, "burn"),
            TransferKind::Transfer => write!(f, "transfer"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    ZeroValue,
    /// Both sides are the sentinel address.
    Degenerate,
}

/// What the engine did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferOutcome {
    Applied(TransferKind),
    Skipped(SkipReason),
}

impl TransferOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, TransferOutcome::Applied(_))
    }
}

impl TransferEvent {
    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block.number,
            log_index: self.log_index,
        }
    }

    /// Classify against the sentinel address; `None` if both sides are the sentinel.
    pub fn classify(&self, sentinel: &Address) -> Option<TransferKind> {
        match (&self.from == sentinel, &self.to == sentinel) {
            (true, true) => None,
            (true, false) => Some(TransferKind::Mint),
            (false, true) => Some(TransferKind::Burn),
            (false, false) => Some(TransferKind::Transfer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(tail: &str) -> Address {
        Address::parse(&format!("0x{tail:0>40}")).unwrap()
    }

    fn event(from: Address, to: Address) -> TransferEvent {
        TransferEvent {
            from,
            to,
            value: 1,
            block: BlockRef {
                number: 10,
                timestamp: 0,
            },
            tx_hash: "0x01".to_string(),
            log_index: 3,
        }
    }

    #[test]
    fn test_classify() {
        let zero = Address::ZERO;
        assert_eq!(
            event(zero.clone(), addr("a1")).classify(&zero),
            Some(TransferKind::Mint)
        );
        assert_eq!(
            event(addr("a1"), zero.clone()).classify(&zero),
            Some(TransferKind::Burn)
        );
        assert_eq!(
            event(addr("a1"), addr("a2")).classify(&zero),
            Some(TransferKind::Transfer)
        );
        assert_eq!(event(zero.clone(), zero.clone()).classify(&zero), None);
    }

    #[test]
    fn test_position_ordering() {
        let a = EventPosition {
            block_number: 5,
            log_index: 9,
        };
        let b = EventPosition {
            block_number: 6,
            log_index: 0,
        };
        assert!(a < b);
        assert!(a < EventPosition::end_of_block(5));
        assert!(EventPosition::end_of_block(5) < b);
        assert_eq!(event(addr("a1"), addr("a2")).position().to_string(), "10:3");
    }
}
