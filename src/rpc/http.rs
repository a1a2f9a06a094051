//! JSON-RPC boundary over HTTP

use super::errors::{BoundaryError, RawBoundaryError};
use super::{BoundaryResult, NetworkBoundary};
use crate::config::RpcConfig;
use crate::types::{Blockhash, CorrelationId, FreshnessToken};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize, Debug)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// [`NetworkBoundary`] backed by a single JSON-RPC endpoint
///
/// Reads (`getLatestBlockhash`, `getMinimumBalanceForRentExemption`,
/// `getTransaction`) work against any Solana RPC node. Submission forwards
/// this crate's own wire bytes and needs an endpoint that decodes them.
#[derive(Debug)]
pub struct JsonRpcBoundary {
    client: reqwest::Client,
    url: String,
    commitment: String,
    token_validity: Duration,
    request_id: AtomicU64,
}

impl JsonRpcBoundary {
    /// The client has a default timeout of 30 seconds
    pub fn new(url: impl Into<String>) -> BoundaryResult<Self> {
        Self::new_with_timeout(url, Duration::from_secs(30))
    }

    pub fn new_with_timeout(url: impl Into<String>, timeout: Duration) -> BoundaryResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BoundaryError::transport(format!("build rpc client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            commitment: "confirmed".to_string(),
            token_validity: Duration::from_secs(60),
            request_id: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &RpcConfig) -> BoundaryResult<Self> {
        Ok(Self::new_with_timeout(&config.url, Duration::from_secs(config.timeout_secs))?
            .with_commitment(&config.commitment)
            .with_token_validity(Duration::from_secs(config.blockhash_validity_secs)))
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    /// How long a fetched blockhash is treated as fresh
    pub fn with_token_validity(mut self, validity: Duration) -> Self {
        self.token_validity = validity;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> BoundaryResult<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(request.to_string())
            .send()
            .await
            .map_err(|e| BoundaryError::transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                BoundaryError::Transport(
                    RawBoundaryError::from_message(format!(
                        "HTTP status {}, body unreadable: {}",
                        status, e
                    ))
                    .with_code(i64::from(status.as_u16())),
                )
            })?;
            return Err(BoundaryError::Transport(http_failure_payload(
                status.as_u16(),
                body,
            )));
        }

        let mut body: Value = response
            .json()
            .await
            .map_err(|e| BoundaryError::transport(format!("invalid response body: {}", e)))?;

        if body["error"].is_object() {
            return Err(match serde_json::from_value::<RpcErrorObject>(body["error"].clone()) {
                Ok(obj) => BoundaryError::Rejection(rejection_payload(obj)),
                Err(err) => BoundaryError::transport(format!(
                    "Failed to deserialize RPC error response: {} [{}]",
                    body["error"], err
                )),
            });
        }

        debug!(method, id, "RPC call succeeded");
        Ok(body["result"].take())
    }
}

fn rejection_payload(obj: RpcErrorObject) -> RawBoundaryError {
    let mut raw = RawBoundaryError::from_message(obj.message).with_code(obj.code);
    if let Some(data) = obj.data {
        if let Some(sig) = data.get("signature").and_then(Value::as_str) {
            raw = raw.with_signature(sig);
        }
        raw = raw.with_data(data);
    }
    raw
}

/// Non-2xx reply: the body is kept as the message, and as `data` when it is JSON
fn http_failure_payload(status: u16, body: String) -> RawBoundaryError {
    let data = serde_json::from_str::<Value>(&body).ok();
    let message = if body.trim().is_empty() {
        format!("HTTP status {}", status)
    } else {
        body
    };

    let mut raw = RawBoundaryError::from_message(message).with_code(i64::from(status));
    if let Some(data) = data {
        if let Some(sig) = data["error"]["data"]["signature"]
            .as_str()
            .filter(|s| !s.is_empty())
        {
            raw = raw.with_signature(sig);
        }
        raw = raw.with_data(data);
    }
    raw
}

fn unexpected(method: &str, value: &Value) -> BoundaryError {
    BoundaryError::transport(format!("unexpected {} result: {}", method, value))
}

#[async_trait]
impl NetworkBoundary for JsonRpcBoundary {
    async fn get_freshness_token(&self) -> BoundaryResult<FreshnessToken> {
        let result = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment }]),
            )
            .await?;

        let value = &result["value"];
        let blockhash: Blockhash = value["blockhash"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| unexpected("getLatestBlockhash", &result))?;
        let last_valid = value["lastValidBlockHeight"]
            .as_u64()
            .ok_or_else(|| unexpected("getLatestBlockhash", &result))?;

        Ok(FreshnessToken::new(blockhash, last_valid).with_validity(self.token_validity))
    }

    async fn get_minimum_reserve(&self, data_len: usize) -> BoundaryResult<u64> {
        let result = self
            .call("getMinimumBalanceForRentExemption", json!([data_len]))
            .await?;
        result
            .as_u64()
            .ok_or_else(|| unexpected("getMinimumBalanceForRentExemption", &result))
    }

    /// Sends `wire` base64-encoded through `sendTransaction`
    ///
    /// The bytes are passed through as given. They are this crate's wire
    /// layout (see `tx_builder/output.rs`) over the canonical message of
    /// `tx_builder/message.rs`, not the Solana transaction encoding, so the
    /// endpoint must be a boundary that understands that layout. A stock
    /// Solana node rejects them.
    async fn submit_transaction(&self, wire: &[u8]) -> BoundaryResult<CorrelationId> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(wire);
        let result = self
            .call(
                "sendTransaction",
                json!([encoded, { "encoding": "base64", "preflightCommitment": self.commitment }]),
            )
            .await?;
        result
            .as_str()
            .map(CorrelationId::from)
            .ok_or_else(|| unexpected("sendTransaction", &result))
    }

    async fn get_transaction_log(
        &self,
        correlation: &CorrelationId,
    ) -> BoundaryResult<Option<Vec<String>>> {
        let result = self
            .call(
                "getTransaction",
                json!([
                    correlation.as_str(),
                    { "encoding": "json", "maxSupportedTransactionVersion": 0 }
                ]),
            )
            .await?;

        if result.is_null() {
            return Ok(None);
        }
        match &result["meta"]["logMessages"] {
            Value::Array(lines) => Ok(Some(
                lines
                    .iter()
                    .filter_map(|l| l.as_str().map(str::to_string))
                    .collect(),
            )),
            Value::Null => Ok(None),
            other => {
                warn!(%correlation, "logMessages is not an array: {}", other);
                Ok(None)
            }
        }
    }
}
