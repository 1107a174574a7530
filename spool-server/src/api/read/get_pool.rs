use axum::{Json, extract::State, response::IntoResponse};

use crate::state::AppState;

use super::{ReadApiError, pool_to_response};

/// `GET /pool`: the pool, or 404 before the first event has been indexed.
pub async fn get_pool(state: State<AppState>) -> Result<impl IntoResponse, ReadApiError> {
    let pool = state
        .store
        .load_pool(&state.pool_id)
        .await?
        .ok_or(ReadApiError::PoolNotFound)?;
    Ok(Json(pool_to_response(pool)))
}
