//! JSON-RPC transport implementation of the ledger boundary.
//!
//! Thin adapter between the [`LedgerClient`] trait and a full node's
//! JSON-RPC API. Connection and timeout failures map to the transient
//! error variants; RPC-level error objects map to definitive rejections.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Value, json};
use std::time::Duration;

use super::records::decode_tag;
use super::{CoinPage, LedgerClient, LedgerError, ObjectInfo, SubmitResponse};
use crate::types::{Address, ChangeKind, ChangeRecord, ObjectId, ObjectRef, SignedPayload};

/// Polling interval while waiting for a transaction to be indexed
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Give up waiting for confirmation after this many polls
const CONFIRM_POLL_LIMIT: u32 = 60;

/// Live ledger client over JSON-RPC
pub struct JsonRpcLedger {
    http: reqwest::Client,
    endpoint: String,
    package_id: String,
}

impl JsonRpcLedger {
    pub fn new(endpoint: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            package_id: package_id.into(),
        }
    }

    /// Issue one JSON-RPC call and unwrap the `result` field
    async fn call(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let value: Value = response.json().await.map_err(map_transport_error)?;

        if let Some(error) = value.get("error") {
            return Err(LedgerError::Rejected(error.to_string()));
        }
        value
            .get("result")
            .cloned()
            .ok_or_else(|| LedgerError::Decode(format!("{method}: missing result field")))
    }

    fn decode_changes(&self, result: &Value) -> Vec<ChangeRecord> {
        let Some(raw_changes) = result.get("objectChanges").and_then(Value::as_array) else {
            return Vec::new();
        };
        raw_changes
            .iter()
            .filter_map(|raw| self.decode_change(raw))
            .collect()
    }

    fn decode_change(&self, raw: &Value) -> Option<ChangeRecord> {
        let kind = match raw.get("type").and_then(Value::as_str)? {
            "created" => ChangeKind::Created,
            "mutated" => ChangeKind::Mutated,
            "deleted" => ChangeKind::Deleted,
            _ => return None,
        };
        let object_type = raw.get("objectType").and_then(Value::as_str)?;
        let id = raw.get("objectId").and_then(Value::as_str)?;
        Some(ChangeRecord {
            kind,
            tag: decode_tag(&self.package_id, object_type),
            object: ObjectRef {
                id: ObjectId(id.to_string()),
                version: parse_version(raw.get("version")),
                digest: raw
                    .get("digest")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
        })
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn get_object(&self, id: &ObjectId) -> Result<ObjectInfo, LedgerError> {
        let result = self
            .call(
                "ledger_getObject",
                json!([id.0, {"showPreviousTransaction": true}]),
            )
            .await?;
        let data = result
            .get("data")
            .ok_or_else(|| LedgerError::NotFound(id.clone()))?;
        Ok(ObjectInfo {
            reference: ObjectRef {
                id: id.clone(),
                version: parse_version(data.get("version")),
                digest: data
                    .get("digest")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            previous_transaction: data
                .get("previousTransaction")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    async fn get_transaction(&self, digest: &str) -> Result<Vec<ChangeRecord>, LedgerError> {
        let result = self
            .call(
                "ledger_getTransaction",
                json!([digest, {"showObjectChanges": true}]),
            )
            .await?;
        Ok(self.decode_changes(&result))
    }

    async fn list_owned_coins(
        &self,
        owner: &Address,
        cursor: Option<String>,
        limit: usize,
    ) -> Result<CoinPage, LedgerError> {
        let result = self
            .call("ledger_getCoins", json!([owner.0, cursor, limit]))
            .await?;
        let coins = result
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| LedgerError::Decode("getCoins: missing data".into()))?
            .iter()
            .filter_map(|coin| {
                Some(ObjectRef {
                    id: ObjectId(coin.get("coinObjectId")?.as_str()?.to_string()),
                    version: parse_version(coin.get("version")),
                    digest: coin
                        .get("digest")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect();
        Ok(CoinPage {
            coins,
            next_cursor: result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string),
            has_next_page: result
                .get("hasNextPage")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    async fn wait_for_confirmation(&self, digest: &str) -> Result<(), LedgerError> {
        // Newly submitted transactions may not be indexed yet; poll until the
        // lookup stops being rejected.
        for _ in 0..CONFIRM_POLL_LIMIT {
            match self.call("ledger_getTransaction", json!([digest])).await {
                Ok(_) => return Ok(()),
                Err(LedgerError::Rejected(_)) => {
                    tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
                }
                Err(e) => return Err(e),
            }
        }
        Err(LedgerError::Timeout(format!(
            "transaction {digest} not confirmed"
        )))
    }

    async fn submit(&self, payload: &SignedPayload) -> Result<SubmitResponse, LedgerError> {
        let result = self
            .call(
                "ledger_executeTransaction",
                json!([
                    BASE64.encode(&payload.tx_bytes),
                    [BASE64.encode(&payload.signature)],
                    {"showObjectChanges": true},
                    "WaitForLocalExecution",
                ]),
            )
            .await?;
        let digest = result
            .get("digest")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::Decode("execute: missing digest".into()))?
            .to_string();
        let changes = self.decode_changes(&result);
        Ok(SubmitResponse { digest, changes })
    }
}

/// Versions arrive as either JSON numbers or decimal strings
fn parse_version(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn map_transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Timeout(e.to_string())
    } else {
        LedgerError::Transport(e.to_string())
    }
}
