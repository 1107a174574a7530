use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Position, flows and share-age of a single address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderResponse {
    pub address: String,
    /// Pool id while the holder has a positive balance.
    pub pool: Option<String>,
    pub share_balance: Decimal,
    pub shares_minted: Decimal,
    pub shares_burned: Decimal,
    pub staked_asset: Decimal,
    pub asset_harvested: Decimal,
    pub share_out: Decimal,
    pub asset_out: Decimal,
    pub share_in: Decimal,
    pub asset_in: Decimal,
    pub share_age: Decimal,
    pub share_age_destroyed: Decimal,
    pub share_offset: Decimal,
    pub asset_offset: Decimal,
    pub updated_at: i64,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for listing holders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListHoldersQuery {
    /// Only return holders with a positive balance.
    #[serde(default)]
    pub members_only: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

impl Default for ListHoldersQuery {
    fn default() -> Self {
        Self {
            members_only: false,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_pagination() {
        assert_eq!(clamp_pagination(0, -5), (1, 0));
        assert_eq!(clamp_pagination(20, 40), (20, 40));
        assert_eq!(clamp_pagination(10_000, 1_000_000), (100, 100_000));
    }

    #[test]
    fn test_holder_response_keeps_decimal_precision() {
        let response = HolderResponse {
            address: "0x00000000000000000000000000000000000000aa".to_string(),
            pool: None,
            share_balance: "0.000000000000000001".parse().unwrap(),
            shares_minted: Decimal::ZERO,
            shares_burned: Decimal::ZERO,
            staked_asset: Decimal::ZERO,
            asset_harvested: Decimal::ZERO,
            share_out: Decimal::ZERO,
            asset_out: Decimal::ZERO,
            share_in: Decimal::ZERO,
            asset_in: Decimal::ZERO,
            share_age: Decimal::ZERO,
            share_age_destroyed: Decimal::ZERO,
            share_offset: Decimal::ZERO,
            asset_offset: Decimal::ZERO,
            updated_at: 0,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["share_balance"], "0.000000000000000001");
        assert!(json["pool"].is_null());

        let back: HolderResponse = serde_json::from_value(json).unwrap();
        assert_eq!(back, response);
    }
}
