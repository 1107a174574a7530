//! Read API handlers.
//!
//! Unauthenticated, read-only views of the derived entities. Decimal fields
//! are serialized as strings.
//!
//! # Endpoints
//!
//! - `GET /pool`               – pool totals, ratio and share-age
//! - `GET /holders`            – holders by balance (paginated)
//! - `GET /holders/{address}`  – a single holder
//! - `GET /history`            – daily buckets for a time window

use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use spool_core::address::AddressError;
use spool_core::entities::{DailyBucket, Holder, Pool};
use spool_core::store::StoreError;
use spool_sdk::objects::{DailyBucketResponse, HolderResponse, PoolResponse};

use crate::state::AppState;

mod get_holder;
mod get_pool;
mod history;
mod list_holders;

/// Build the Read API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pool", get(get_pool::get_pool))
        .route("/holders", get(list_holders::list_holders))
        .route("/holders/{address}", get(get_holder::get_holder))
        .route("/history", get(history::history))
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

/// Errors that can occur in Read API handlers.
#[derive(Debug)]
pub(crate) enum ReadApiError {
    Store(StoreError),
    PoolNotFound,
    HolderNotFound,
    InvalidAddress(AddressError),
}

impl From<StoreError> for ReadApiError {
    fn from(e: StoreError) -> Self {
        ReadApiError::Store(e)
    }
}

impl IntoResponse for ReadApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ReadApiError::Store(e) => {
                tracing::error!(error = %e, "Read API store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            ReadApiError::PoolNotFound => {
                (StatusCode::NOT_FOUND, "pool has not been created yet").into_response()
            }
            ReadApiError::HolderNotFound => {
                (StatusCode::NOT_FOUND, "holder not found").into_response()
            }
            ReadApiError::InvalidAddress(e) => {
                (StatusCode::BAD_REQUEST, format!("invalid address: {e}")).into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Entity → response conversions
// ---------------------------------------------------------------------------

pub(crate) fn pool_to_response(pool: Pool) -> PoolResponse {
    PoolResponse {
        id: pool.id.to_string(),
        decimals: pool.decimals,
        name: pool.name,
        symbol: pool.symbol,
        underlying_asset: pool.underlying_asset.to_string(),
        total_supply: pool.total_supply,
        staked_asset: pool.staked_asset,
        asset_harvested: pool.asset_harvested,
        shares_minted: pool.shares_minted,
        shares_burned: pool.shares_burned,
        share_age: pool.share_age,
        share_age_destroyed: pool.share_age_destroyed,
        ratio: pool.ratio,
        updated_at: pool.updated_at,
    }
}

pub(crate) fn holder_to_response(holder: Holder) -> HolderResponse {
    HolderResponse {
        address: holder.id.to_string(),
        pool: holder.pool_id.map(|id| id.to_string()),
        share_balance: holder.share_balance,
        shares_minted: holder.shares_minted,
        shares_burned: holder.shares_burned,
        staked_asset: holder.staked_asset,
        asset_harvested: holder.asset_harvested,
        share_out: holder.share_out,
        asset_out: holder.asset_out,
        share_in: holder.share_in,
        asset_in: holder.asset_in,
        share_age: holder.share_age,
        share_age_destroyed: holder.share_age_destroyed,
        share_offset: holder.share_offset,
        asset_offset: holder.asset_offset,
        updated_at: holder.updated_at,
    }
}

pub(crate) fn bucket_to_response(bucket: DailyBucket) -> DailyBucketResponse {
    DailyBucketResponse {
        day: bucket.day,
        date: bucket.date,
        timeframe: bucket.timeframe.into(),
        staked_asset: bucket.staked_asset,
        asset_harvested: bucket.asset_harvested,
        share_age: bucket.share_age,
        share_age_destroyed: bucket.share_age_destroyed,
        shares_minted: bucket.shares_minted,
        shares_burned: bucket.shares_burned,
        share_supply: bucket.share_supply,
        ratio: bucket.ratio,
    }
}
