//! Test doubles for the pipeline's collaborators, plus log builders.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chainwatch_abi::{encode_call, encode_params, AbiValue};
use chainwatch_pipeline::config::{FlapSettings, FourSettings, PancakeSettings};
use chainwatch_pipeline::{
    DispatchError, MarketData, MarketDataError, MarketInfo, Notification, Notifier, TokenMeta,
};
use chainwatch_rpc::{RawLog, RpcCaller, TransportError};
use serde_json::{json, Value};

// ─── RPC ─────────────────────────────────────────────────────────────────────

type Responder = Box<dyn FnMut(&str, &[Value]) -> Result<Value, TransportError> + Send>;

/// Answers calls through a closure and records every `(method, params)`.
pub struct ScriptedRpc {
    respond: Responder,
    pub calls: Vec<(String, Vec<Value>)>,
}

impl ScriptedRpc {
    pub fn new(
        respond: impl FnMut(&str, &[Value]) -> Result<Value, TransportError> + Send + 'static,
    ) -> Self {
        Self {
            respond: Box::new(respond),
            calls: vec![],
        }
    }

    /// Fails every call; for handlers that should not need the node.
    pub fn offline() -> Self {
        Self::new(|_, _| Err(TransportError::Timeout { ms: 10_000 }))
    }

    pub fn methods(&self) -> Vec<&str> {
        self.calls.iter().map(|(m, _)| m.as_str()).collect()
    }
}

#[async_trait]
impl RpcCaller for ScriptedRpc {
    async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let reply = (self.respond)(method, &params);
        self.calls.push((method.to_string(), params));
        reply
    }
}

pub fn hex_value(bytes: &[u8]) -> Value {
    Value::from(format!("0x{}", hex::encode(bytes)))
}

/// Answers `eth_call` for `name()` / `symbol()` from a table keyed by the
/// lowercase `to` address.
pub fn erc20_responder(
    tokens: HashMap<Address, (&'static str, &'static str)>,
) -> impl FnMut(&str, &[Value]) -> Result<Value, TransportError> + Send + 'static {
    move |method, params| {
        assert_eq!(method, "eth_call");
        let to: Address = serde_json::from_value(params[0]["to"].clone()).unwrap();
        let (name, symbol) = tokens.get(&to).copied().unwrap_or(("", ""));
        let value = match params[0]["data"].as_str().unwrap() {
            "0x06fdde03" => name,
            "0x95d89b41" => symbol,
            other => panic!("unexpected calldata {other}"),
        };
        Ok(hex_value(&encode_params(&[AbiValue::String(value.into())])))
    }
}

// ─── Market data ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StubMarket {
    pub info: HashMap<Address, MarketInfo>,
    pub meta: HashMap<Address, TokenMeta>,
    pub fail: bool,
}

impl StubMarket {
    pub fn with_cap(mut self, token: Address, market_cap: f64) -> Self {
        self.info.insert(
            token,
            MarketInfo {
                market_cap,
                ..Default::default()
            },
        );
        self
    }

    pub fn with_meta(mut self, token: Address, name: &str, symbol: &str) -> Self {
        self.meta.insert(
            token,
            TokenMeta {
                name: name.into(),
                symbol: symbol.into(),
            },
        );
        self
    }
}

#[async_trait]
impl MarketData for StubMarket {
    async fn market_info(&self, token: Address) -> Result<Option<MarketInfo>, MarketDataError> {
        if self.fail {
            return Err(MarketDataError::Status(503));
        }
        Ok(self.info.get(&token).cloned())
    }

    async fn token_meta(&self, token: Address) -> Result<Option<TokenMeta>, MarketDataError> {
        if self.fail {
            return Err(MarketDataError::Status(503));
        }
        Ok(self.meta.get(&token).cloned())
    }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

#[derive(Default, Clone)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), DispatchError> {
        if self.fail {
            return Err(DispatchError::Api {
                status: 429,
                body: "Too Many Requests".into(),
            });
        }
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ─── Logs ────────────────────────────────────────────────────────────────────

fn uint(v: u64, bits: u16) -> AbiValue {
    AbiValue::Uint(U256::from(v), bits)
}

fn raw_log(address: Address, topics: Vec<B256>, data: Vec<u8>, tx: B256) -> RawLog {
    RawLog {
        address,
        topics,
        data: Bytes::from(data),
        transaction_hash: Some(tx),
        block_number: Some("0x2a".into()),
        log_index: Some("0x3".into()),
        removed: false,
    }
}

pub fn flap_log(settings: &FlapSettings, token: Address, creator: Address, tx: B256) -> RawLog {
    let data = encode_params(&[
        uint(1_700_000_000, 256),
        AbiValue::Address(creator),
        uint(7, 256),
        AbiValue::Address(token),
        AbiValue::String("Save Cats".into()),
        AbiValue::String("CATS".into()),
        AbiValue::String("ipfs://meta".into()),
    ]);
    raw_log(settings.contract, vec![settings.topic], data, tx)
}

/// Launch-call input with a single struct argument.
pub fn flap_input(beneficiary: Address, tax_rate: u64) -> Vec<u8> {
    encode_call(
        [0x12, 0x34, 0x56, 0x78],
        &[AbiValue::Tuple(vec![
            AbiValue::String("Save Cats".into()),
            AbiValue::String("CATS".into()),
            AbiValue::String("ipfs://meta".into()),
            uint(1, 8),
            AbiValue::FixedBytes(B256::repeat_byte(0x5a), 32),
            uint(tax_rate, 16),
            uint(1, 8),
            AbiValue::Address(Address::ZERO),
            uint(0, 256),
            AbiValue::Address(beneficiary),
            AbiValue::Bytes(vec![]),
        ])],
    )
}

/// Node answering `eth_getTransactionByHash` with `input`.
pub fn tx_responder(
    input: Option<Vec<u8>>,
) -> impl FnMut(&str, &[Value]) -> Result<Value, TransportError> + Send + 'static {
    move |method, params| {
        assert_eq!(method, "eth_getTransactionByHash");
        Ok(match &input {
            Some(input) => json!({ "hash": params[0], "input": hex_value(input) }),
            None => Value::Null,
        })
    }
}

pub fn four_create_log(settings: &FourSettings, token: Address, creator: Address) -> RawLog {
    let data = encode_params(&[
        AbiValue::Address(creator),
        AbiValue::Address(token),
        uint(99, 256),
        AbiValue::String("Moon Dog".into()),
        AbiValue::String("MDOG".into()),
        uint(1_000_000_000, 256),
        uint(1_700_000_000, 256),
        uint(0, 256),
    ]);
    raw_log(settings.contract, vec![settings.create_topic], data, B256::repeat_byte(0x41))
}

pub fn four_liquidity_log(settings: &FourSettings, base: Address) -> RawLog {
    let data = encode_params(&[
        AbiValue::Address(base),
        uint(800_000_000, 256),
        AbiValue::Address(Address::ZERO),
        uint(18_000_000_000_000_000, 256),
    ]);
    raw_log(settings.contract, vec![settings.liquidity_topic], data, B256::repeat_byte(0x42))
}

pub fn pair_created_log(
    settings: &PancakeSettings,
    token0: Address,
    token1: Address,
    pair: Address,
) -> RawLog {
    let data = encode_params(&[AbiValue::Address(pair), uint(1_234, 256)]);
    raw_log(
        settings.factory,
        vec![settings.topic, token0.into_word(), token1.into_word()],
        data,
        B256::repeat_byte(0x0c),
    )
}
