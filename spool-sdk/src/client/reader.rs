//! Read API client (analytics consumer → indexer server).

use reqwest::{Client, StatusCode};
use url::Url;

use super::{ClientError, parse_response};
use crate::objects::{
    DailyBucketResponse, HistoryQuery, HolderResponse, ListHoldersQuery, PoolResponse,
};

/// Typed HTTP client for the indexer **Read API**.
#[derive(Debug, Clone)]
pub struct ReaderClient {
    http: Client,
    base_url: Url,
}

impl ReaderClient {
    /// Create a new `ReaderClient` for the server at `base_url`.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /api/v1/pool` – pool totals, or `None` before the first event.
    pub async fn pool(&self) -> Result<Option<PoolResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/pool")?;
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_response(resp).await.map(Some)
    }

    /// `GET /api/v1/holders/{address}` – a single holder, or `None` if the
    /// address never held shares.
    pub async fn holder(&self, address: &str) -> Result<Option<HolderResponse>, ClientError> {
        let url = self
            .base_url
            .join(&format!("/api/v1/holders/{address}"))?;
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        parse_response(resp).await.map(Some)
    }

    /// `GET /api/v1/holders` – holders ordered by balance, largest first.
    pub async fn list_holders(
        &self,
        query: &ListHoldersQuery,
    ) -> Result<Vec<HolderResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/holders")?;
        let resp = self.http.get(url).query(query).send().await?;
        parse_response(resp).await
    }

    /// `GET /api/v1/history` – daily buckets in ascending day order.
    pub async fn history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<DailyBucketResponse>, ClientError> {
        let url = self.base_url.join("/api/v1/history")?;
        let resp = self.http.get(url).query(query).send().await?;
        parse_response(resp).await
    }
}
