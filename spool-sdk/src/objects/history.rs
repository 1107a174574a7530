use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Timeframe;

/// Seconds in one UTC day.
const DAY_SECONDS: i64 = 86_400;
/// Default history window when `from` is omitted.
const DEFAULT_WINDOW_DAYS: i64 = 30;
/// Longest history window served in one request.
const MAX_WINDOW_DAYS: i64 = 366;

/// One UTC day of pool activity.
///
/// `share_supply`, `share_age` and `ratio` are the values after the day's last
/// mint or burn; the other amounts are totals for the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucketResponse {
    /// Days since the unix epoch.
    pub day: i64,
    /// Unix seconds of the start of the day.
    pub date: i64,
    pub timeframe: Timeframe,
    pub staked_asset: Decimal,
    pub asset_harvested: Decimal,
    pub share_age: Decimal,
    pub share_age_destroyed: Decimal,
    pub shares_minted: Decimal,
    pub shares_burned: Decimal,
    pub share_supply: Decimal,
    pub ratio: Decimal,
}

/// Query parameters for the history endpoint, in unix seconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl HistoryQuery {
    /// Resolve the requested window into an inclusive range of day indexes.
    ///
    /// `to` defaults to `now`, `from` to 30 days before `to`, and the window
    /// is cut to at most 366 days counting back from `to`.
    pub fn day_range(&self, now: i64) -> (i64, i64) {
        let to_day = self.to.unwrap_or(now).div_euclid(DAY_SECONDS);
        let from_day = self
            .from
            .map(|from| from.div_euclid(DAY_SECONDS))
            .unwrap_or(to_day - (DEFAULT_WINDOW_DAYS - 1));
        let from_day = from_day.max(to_day - (MAX_WINDOW_DAYS - 1));
        (from_day, to_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000; // day 19675

    #[test]
    fn test_default_window_is_thirty_days() {
        let (from, to) = HistoryQuery::default().day_range(NOW);
        assert_eq!(to, 19675);
        assert_eq!(to - from + 1, 30);
    }

    #[test]
    fn test_explicit_window() {
        let query = HistoryQuery {
            from: Some(0),
            to: Some(DAY_SECONDS * 10 + 5),
        };
        assert_eq!(query.day_range(NOW), (0, 10));
    }

    #[test]
    fn test_window_is_capped() {
        let query = HistoryQuery {
            from: Some(0),
            to: None,
        };
        let (from, to) = query.day_range(NOW);
        assert_eq!(to - from + 1, MAX_WINDOW_DAYS);
    }

    #[test]
    fn test_inverted_window_is_empty() {
        let query = HistoryQuery {
            from: Some(DAY_SECONDS * 20),
            to: Some(DAY_SECONDS * 10),
        };
        let (from, to) = query.day_range(NOW);
        assert!(from > to);
    }
}
