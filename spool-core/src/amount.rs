//! Conversion of raw on-chain integer amounts into decimal units.
//!
//! Ledger amounts arrive as unsigned integers scaled by `10^scale`. Every
//! derived quantity in this crate is a [`Decimal`], so the conversion is
//! exact as long as the raw value fits in Decimal's 96-bit mantissa.

use rust_decimal::Decimal;
use thiserror::Error;

/// Scale of share and staked-asset amounts on the ledger.
pub const DEFAULT_VALUE_SCALE: u32 = 18;

/// Largest scale a [`Decimal`] can carry.
pub const MAX_VALUE_SCALE: u32 = 28;

/// Seconds in one UTC day; the unit of share-age.
pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid raw amount: {0:?}")]
    Parse(String),

    #[error("raw amount {raw} at scale {scale} does not fit in a decimal")]
    OutOfRange { raw: String, scale: u32 },

    #[error("value scale {0} exceeds the maximum of {MAX_VALUE_SCALE}")]
    ScaleTooLarge(u32),
}

/// Convert a raw integer amount into decimal units.
pub fn from_raw(raw: u128, scale: u32) -> Result<Decimal, AmountError> {
    if scale > MAX_VALUE_SCALE {
        return Err(AmountError::ScaleTooLarge(scale));
    }
    let out_of_range = || AmountError::OutOfRange {
        raw: raw.to_string(),
        scale,
    };
    let signed = i128::try_from(raw).map_err(|_| out_of_range())?;
    Decimal::try_from_i128_with_scale(signed, scale)
        .map(|d| d.normalize())
        .map_err(|_| out_of_range())
}

/// Parse a base-10 raw amount such as `"1000000000000000000"`.
pub fn parse_raw(raw: &str) -> Result<u128, AmountError> {
    raw.trim()
        .parse::<u128>()
        .map_err(|_| AmountError::Parse(raw.to_string()))
}

/// Parse a `0x`-prefixed hex quantity (an ABI word or an RPC quantity).
///
/// Leading zero digits are ignored, so full 32-byte words are accepted as
/// long as the value itself fits in 128 bits.
pub fn parse_hex_quantity(hex: &str) -> Result<u128, AmountError> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| AmountError::Parse(hex.to_string()))?;
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return if digits.is_empty() {
            Err(AmountError::Parse(hex.to_string()))
        } else {
            Ok(0)
        };
    }
    if significant.len() > 32 {
        return Err(AmountError::OutOfRange {
            raw: hex.to_string(),
            scale: 0,
        });
    }
    u128::from_str_radix(significant, 16).map_err(|_| AmountError::Parse(hex.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_raw_scales_down() {
        let one = from_raw(1_000_000_000_000_000_000, DEFAULT_VALUE_SCALE).unwrap();
        assert_eq!(one, Decimal::ONE);

        let fractional = from_raw(1_500_000_000_000_000_000, DEFAULT_VALUE_SCALE).unwrap();
        assert_eq!(fractional, Decimal::from_str("1.5").unwrap());

        let dust = from_raw(1, DEFAULT_VALUE_SCALE).unwrap();
        assert_eq!(dust, Decimal::from_str("0.000000000000000001").unwrap());
    }

    #[test]
    fn test_from_raw_zero_is_zero() {
        assert!(from_raw(0, DEFAULT_VALUE_SCALE).unwrap().is_zero());
    }

    #[test]
    fn test_from_raw_rejects_oversized_values() {
        assert!(matches!(
            from_raw(u128::MAX, DEFAULT_VALUE_SCALE),
            Err(AmountError::OutOfRange { .. })
        ));
        assert_eq!(from_raw(1, 29), Err(AmountError::ScaleTooLarge(29)));
    }

    #[test]
    fn test_parse_raw() {
        assert_eq!(parse_raw("42").unwrap(), 42);
        assert!(parse_raw("-1").is_err());
        assert!(parse_raw("1e18").is_err());
    }

    #[test]
    fn test_parse_hex_quantity() {
        assert_eq!(parse_hex_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_hex_quantity("0x1b").unwrap(), 27);
        let word = "0x0000000000000000000000000000000000000000000000000de0b6b3a7640000";
        assert_eq!(parse_hex_quantity(word).unwrap(), 1_000_000_000_000_000_000);
        assert!(parse_hex_quantity("0x").is_err());
        assert!(parse_hex_quantity("12").is_err());
        let huge = "0x0100000000000000000000000000000000";
        assert!(matches!(
            parse_hex_quantity(huge),
            Err(AmountError::OutOfRange { .. })
        ));
    }
}
