//! Soroban RPC client
//!
//! Only the two JSON-RPC methods the harness needs: `getTransaction` for
//! finality polling and `getHealth` for `status`.

use crate::config::FinalityConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Status reported by `getTransaction`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Success,
    Failed,
    NotFound,
}

impl TxStatus {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "SUCCESS" => Ok(TxStatus::Success),
            "FAILED" => Ok(TxStatus::Failed),
            "NOT_FOUND" => Ok(TxStatus::NotFound),
            other => Err(Error::Rpc(format!("unknown transaction status {}", other))),
        }
    }
}

/// Result of waiting for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finality {
    Confirmed,
    Failed,
    /// Poll budget exhausted without a final status
    Pending,
}

#[async_trait]
pub trait TransactionTracker: Send + Sync {
    async fn transaction_status(&self, hash: &str) -> Result<TxStatus>;
}

/// Poll `tracker` until the transaction is final or the attempts run out
///
/// RPC errors during the poll count as a not-yet-final attempt.
pub async fn await_finality(
    tracker: &dyn TransactionTracker,
    hash: &str,
    config: &FinalityConfig,
) -> Finality {
    for attempt in 1..=config.attempts {
        match tracker.transaction_status(hash).await {
            Ok(TxStatus::Success) => {
                tracing::debug!(hash, attempt, "Transaction confirmed");
                return Finality::Confirmed;
            }
            Ok(TxStatus::Failed) => return Finality::Failed,
            Ok(TxStatus::NotFound) => {}
            Err(e) => tracing::debug!(hash, attempt, error = %e, "getTransaction failed"),
        }
        if attempt < config.attempts {
            tokio::time::sleep(Duration::from_millis(config.interval_ms)).await;
        }
    }
    Finality::Pending
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct TransactionInfo {
    status: String,
}

/// `getHealth` result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub latest_ledger: Option<u64>,
    #[serde(default)]
    pub oldest_ledger: Option<u64>,
}

pub struct RpcClient {
    client: Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let mut body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
        });
        if !params.is_null() {
            body["params"] = params;
        }

        let response = self.client.post(&self.url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Rpc(format!("{} returned HTTP {}", method, response.status())));
        }

        let parsed: RpcResponse<T> = response.json().await?;
        if let Some(error) = parsed.error {
            return Err(Error::Rpc(format!("{} failed ({}): {}", method, error.code, error.message)));
        }
        parsed
            .result
            .ok_or_else(|| Error::Rpc(format!("{} returned no result", method)))
    }

    pub async fn get_health(&self) -> Result<Health> {
        self.call("getHealth", Value::Null).await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<TxStatus> {
        let info: TransactionInfo = self.call("getTransaction", json!({ "hash": hash })).await?;
        TxStatus::parse(&info.status)
    }
}

#[async_trait]
impl TransactionTracker for RpcClient {
    async fn transaction_status(&self, hash: &str) -> Result<TxStatus> {
        self.get_transaction(hash).await
    }
}
