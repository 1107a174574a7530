use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool-wide totals and share-age metrics.
///
/// Decimal fields serialize as strings to keep full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolResponse {
    pub id: String,
    pub decimals: u8,
    pub name: String,
    pub symbol: String,
    pub underlying_asset: String,
    pub total_supply: Decimal,
    pub staked_asset: Decimal,
    pub asset_harvested: Decimal,
    pub shares_minted: Decimal,
    pub shares_burned: Decimal,
    pub share_age: Decimal,
    pub share_age_destroyed: Decimal,
    pub ratio: Decimal,
    /// Unix seconds of the last mint or burn.
    pub updated_at: i64,
}
