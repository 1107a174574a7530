use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use spool_core::entities::holder::ListHolders;
use spool_sdk::objects::{ListHoldersQuery, clamp_pagination};

use crate::state::AppState;

use super::{ReadApiError, holder_to_response};

/// `GET /holders`: holders ordered by balance, largest first.
pub async fn list_holders(
    state: State<AppState>,
    Query(query): Query<ListHoldersQuery>,
) -> Result<impl IntoResponse, ReadApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let holders = state
        .store
        .list_holders(ListHolders {
            members_only: query.members_only,
            limit,
            offset,
        })
        .await?;

    let response: Vec<_> = holders.into_iter().map(holder_to_response).collect();
    Ok(Json(response))
}
