//! Log records as pushed by `eth_subscribe("logs")` and the filters that
//! request them.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// One event log. Produced by the node, consumed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    /// Set by the node when a reorg retracts a previously delivered log.
    #[serde(default)]
    pub removed: bool,
}

impl RawLog {
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(parse_quantity)
    }

    pub fn log_index(&self) -> Option<u64> {
        self.log_index.as_deref().and_then(parse_quantity)
    }
}

/// Parse a JSON-RPC hex quantity (`"0x1b4"`).
pub fn parse_quantity(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

/// A static `logs` filter, registered once and re-sent after every reconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSubscription {
    /// Human label used in logs, e.g. `"pancake"`.
    pub label: String,
    pub address: Address,
    /// Accepted `topics[0]` values; several are OR-ed.
    pub topics: Vec<B256>,
}

impl LogSubscription {
    pub fn new(label: impl Into<String>, address: Address, topics: Vec<B256>) -> Self {
        Self {
            label: label.into(),
            address,
            topics,
        }
    }

    /// `eth_subscribe` params: `["logs", {address, topics}]`.
    pub fn params(&self) -> Vec<Value> {
        let topic0 = match self.topics.as_slice() {
            [single] => json!(single),
            many => json!(many),
        };
        vec![
            Value::from("logs"),
            json!({ "address": self.address, "topics": [topic0] }),
        ]
    }
}
