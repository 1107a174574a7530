use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use spool_core::address::Address;

use crate::state::AppState;

use super::{ReadApiError, holder_to_response};

/// `GET /holders/{address}`: a single holder. The address may use any hex case.
pub async fn get_holder(
    state: State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ReadApiError> {
    let address = Address::parse(&address).map_err(ReadApiError::InvalidAddress)?;
    let holder = state
        .store
        .load_holder(&address)
        .await?
        .ok_or(ReadApiError::HolderNotFound)?;
    Ok(Json(holder_to_response(holder)))
}
