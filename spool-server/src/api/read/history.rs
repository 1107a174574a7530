use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use spool_sdk::objects::HistoryQuery;
use time::OffsetDateTime;

use crate::state::AppState;

use super::{ReadApiError, bucket_to_response};

/// `GET /history`: daily buckets in ascending day order.
///
/// Days without a mint or burn have no bucket and are absent from the result.
pub async fn history(
    state: State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ReadApiError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let (from_day, to_day) = query.day_range(now);
    if from_day > to_day {
        return Ok(Json(Vec::new()));
    }

    let buckets = state.store.list_daily_buckets(from_day, to_day).await?;
    let response: Vec<_> = buckets.into_iter().map(bucket_to_response).collect();
    Ok(Json(response))
}
