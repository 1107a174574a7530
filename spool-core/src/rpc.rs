//! Minimal EVM JSON-RPC client.

use crate::address::Address;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("{method} returned no result")]
    MissingResult { method: &'static str },

    #[error("cannot decode {method} result: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, serde::Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, serde::Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC over HTTP POST, one request per call.
#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: Value,
    ) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response: RpcResponse = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if let Some(error) = response.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }
        let result = response
            .result
            .filter(|v| !v.is_null())
            .ok_or(RpcError::MissingResult { method })?;
        serde_json::from_value(result).map_err(|source| RpcError::Decode { method, source })
    }

    /// `eth_call` of raw calldata against `to` at a fixed block.
    pub async fn eth_call(
        &self,
        to: &Address,
        data: &str,
        block: Option<u64>,
    ) -> Result<String, RpcError> {
        let tag = block.map(block_tag).unwrap_or_else(|| "latest".to_string());
        self.call(
            "eth_call",
            json!([{ "to": to.as_str(), "data": data }, tag]),
        )
        .await
    }
}

/// Hex quantity form of a block number.
pub fn block_tag(number: u64) -> String {
    format!("0x{number:x}")
}
