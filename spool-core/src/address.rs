//! Account addresses on the share ledger.
//!
//! Addresses are kept in their canonical textual form: `0x` followed by 40
//! lowercase hex digits. Every constructor normalizes, so two `Address`
//! values compare equal iff they name the same account.

use compact_str::CompactString;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of hex digits in a 20-byte address.
const ADDRESS_HEX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must have 40 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("address contains non-hex characters")]
    InvalidHex,
}

/// A 20-byte account address in canonical lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type, serde::Serialize)]
#[sqlx(transparent)]
pub struct Address(CompactString);

impl Address {
    /// The all-zero address used as the mint/burn sentinel.
    pub const ZERO: Address = Address(CompactString::const_new(
        "0x0000000000000000000000000000000000000000",
    ));

    /// Parse an address, accepting any hex case.
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;
        if digits.len() != ADDRESS_HEX_LEN {
            return Err(AddressError::InvalidLength(digits.len()));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AddressError::InvalidHex);
        }
        let mut canonical = CompactString::with_capacity(2 + ADDRESS_HEX_LEN);
        canonical.push_str("0x");
        canonical.push_str(&digits.to_ascii_lowercase());
        Ok(Self(canonical))
    }

    /// Decode an address from a 32-byte indexed log topic.
    ///
    /// The address occupies the low 20 bytes; the high 12 bytes must be zero.
    pub fn from_topic(topic: &str) -> Result<Self, AddressError> {
        let digits = topic
            .strip_prefix("0x")
            .ok_or(AddressError::MissingPrefix)?;
        if digits.len() != 64 {
            return Err(AddressError::InvalidLength(digits.len()));
        }
        let (padding, tail) = digits.split_at(64 - ADDRESS_HEX_LEN);
        if padding.bytes().any(|b| b != b'0') {
            return Err(AddressError::InvalidHex);
        }
        Self::parse(&format!("0x{tail}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// The address left-padded to a 32-byte ABI word, without `0x`.
    pub fn to_abi_word(&self) -> String {
        format!("{:0>64}", &self.as_str()[2..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0.into_string()
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}
