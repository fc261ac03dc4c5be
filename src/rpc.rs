//! Remote ledger RPC collaborator
//!
//! The discovery engine talks to the remote source through the
//! [`SlotSource`] trait; [`HttpSlotSource`] is the production
//! implementation speaking JSON-RPC (`getSlot` / `getBlock`) over reqwest.
//!
//! Absence is not an error here: a skipped slot, a not-yet-finalized slot
//! and a transport failure all surface as `None` from [`SlotSource::block`],
//! and the discovery loop skips past them. Only `latest_slot` propagates
//! transport failures, since without it no exploration can be framed.

use crate::error::TrackerError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::time::Duration;

/// One parsed block as served by the remote source.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockPayload {
    #[serde(rename = "blockTime")]
    pub block_time: i64,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

/// One raw transaction record inside a block.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTransaction {
    pub transaction: RawTransactionBody,
    #[serde(default)]
    pub meta: Option<RawMeta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTransactionBody {
    #[serde(default)]
    pub signatures: Vec<String>,
    #[serde(default)]
    pub message: RawMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    pub instructions: Vec<RawInstruction>,
}

/// One instruction as decoded by the `jsonParsed` encoding. `parsed` is an
/// opaque value: a map with a `type` field when the RPC recognizes the
/// program, an arbitrary string otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstruction {
    #[serde(default)]
    pub parsed: Option<Value>,
    #[serde(rename = "programId", default)]
    pub program_id: Option<String>,
}

impl RawInstruction {
    /// The parsed instruction type, when the RPC decoded one.
    pub fn parsed_type(&self) -> Option<&str> {
        self.parsed
            .as_ref()?
            .as_object()?
            .get("type")?
            .as_str()
    }
}

/// Block-level metadata for a transaction.
///
/// `err` distinguishes "present and null" (success) from "absent"
/// (undetermined outcome), hence the nested `Option`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMeta {
    #[serde(default, deserialize_with = "nested_option")]
    pub err: Option<Option<Value>>,
    #[serde(rename = "logMessages", default)]
    pub log_messages: Option<Vec<String>>,
}

fn nested_option<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

/// The remote source as seen by the discovery engine.
#[async_trait]
pub trait SlotSource: Send + Sync {
    /// Current highest validated slot number on the remote source.
    async fn latest_slot(&self) -> Result<u64, TrackerError>;

    /// Full parsed block for a slot, or `None` if the remote source has no
    /// data for it (skipped slot, not yet finalized, or transport failure).
    async fn block(&self, slot_number: u64) -> Option<BlockPayload>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    #[serde(default)]
    result: Option<T>,
}

/// JSON-RPC implementation of [`SlotSource`].
pub struct HttpSlotSource {
    client: reqwest::Client,
    rpc_url: String,
}

impl HttpSlotSource {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }
}

#[async_trait]
impl SlotSource for HttpSlotSource {
    async fn latest_slot(&self) -> Result<u64, TrackerError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getSlot",
        });

        let response = self.client.post(&self.rpc_url).json(&payload).send().await?;
        let envelope: RpcEnvelope<u64> = response.json().await?;
        envelope
            .result
            .ok_or_else(|| TrackerError::Remote("getSlot returned no result".to_string()))
    }

    async fn block(&self, slot_number: u64) -> Option<BlockPayload> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBlock",
            "params": [
                slot_number,
                {
                    "encoding": "jsonParsed",
                    "transactionDetails": "full",
                    "rewards": false,
                    "maxSupportedTransactionVersion": 0,
                }
            ],
        });

        let response = match self.client.post(&self.rpc_url).json(&payload).send().await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("getBlock({}) transport failure: {}", slot_number, e);
                return None;
            }
        };

        if !response.status().is_success() {
            log::debug!("getBlock({}) returned HTTP {}", slot_number, response.status());
            return None;
        }

        match response.json::<RpcEnvelope<BlockPayload>>().await {
            Ok(envelope) => envelope.result,
            Err(e) => {
                log::warn!("getBlock({}) undecodable payload: {}", slot_number, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_field_absent_vs_null() {
        let with_null: RawMeta = serde_json::from_str(r#"{"err": null}"#).unwrap();
        assert_eq!(with_null.err, Some(None));

        let with_value: RawMeta = serde_json::from_str(r#"{"err": {"InstructionError": []}}"#).unwrap();
        assert!(matches!(with_value.err, Some(Some(_))));

        let absent: RawMeta = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(absent.err, None);
    }

    #[test]
    fn test_parsed_type_extraction() {
        let ins: RawInstruction = serde_json::from_str(
            r#"{"parsed": {"type": "transfer", "info": {}}, "programId": "Prog"}"#,
        )
        .unwrap();
        assert_eq!(ins.parsed_type(), Some("transfer"));

        // String-valued parsed field carries no type.
        let opaque: RawInstruction =
            serde_json::from_str(r#"{"parsed": "base58data", "programId": "Prog"}"#).unwrap();
        assert_eq!(opaque.parsed_type(), None);
    }

    #[test]
    fn test_block_payload_decode() {
        let raw = r#"{
            "blockTime": 1723400000,
            "transactions": [
                {
                    "transaction": {
                        "signatures": ["sig1"],
                        "message": {"instructions": [{"programId": "P1"}]}
                    },
                    "meta": {"err": null, "logMessages": ["Program log: Instruction: Swap"]}
                }
            ]
        }"#;
        let block: BlockPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(block.block_time, 1723400000);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].transaction.signatures[0], "sig1");
    }
}
