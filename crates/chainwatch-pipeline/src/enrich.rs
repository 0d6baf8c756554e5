//! Enrichment calls issued on the event's own connection.

use alloy_primitives::{Address, Bytes, B256};
use chainwatch_abi::{decode_string_result, encode_call, function_selector};
use chainwatch_rpc::{RpcCaller, TransportError};
use serde_json::{json, Value};

use crate::error::PipelineError;

/// `input` of the transaction with this hash, `None` when the node does
/// not know it.
pub async fn transaction_input(
    rpc: &mut dyn RpcCaller,
    tx_hash: B256,
) -> Result<Option<Bytes>, PipelineError> {
    let tx = rpc
        .call("eth_getTransactionByHash", vec![json!(tx_hash)])
        .await?;
    match tx.get("input") {
        None | Some(Value::Null) => Ok(None),
        Some(input) => serde_json::from_value(input.clone())
            .map(Some)
            .map_err(|e| PipelineError::Enrichment(format!("bad transaction input: {e}"))),
    }
}

/// `eth_call` against `latest`.
pub async fn eth_call(
    rpc: &mut dyn RpcCaller,
    to: Address,
    data: &[u8],
) -> Result<Bytes, TransportError> {
    let params = vec![
        json!({ "to": to, "data": Bytes::copy_from_slice(data) }),
        json!("latest"),
    ];
    let result = rpc.call("eth_call", params).await?;
    Ok(serde_json::from_value(result)?)
}

/// ERC-20 `name()` and `symbol()`; each is empty when its call or decode
/// fails.
pub async fn erc20_name_symbol(rpc: &mut dyn RpcCaller, token: Address) -> (String, String) {
    let name = erc20_string(rpc, token, "name()").await;
    let symbol = erc20_string(rpc, token, "symbol()").await;
    (name, symbol)
}

async fn erc20_string(rpc: &mut dyn RpcCaller, token: Address, signature: &str) -> String {
    let calldata = encode_call(function_selector(signature), &[]);
    let raw = match eth_call(rpc, token, &calldata).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(token = %token, call = signature, error = %e, "eth_call failed");
            return String::new();
        }
    };
    if raw.is_empty() {
        return String::new();
    }
    decode_string_result(&raw).unwrap_or_else(|e| {
        tracing::warn!(token = %token, call = signature, error = %e, "undecodable string result");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chainwatch_abi::{encode_params, AbiValue};
    use std::collections::VecDeque;

    struct Scripted {
        replies: VecDeque<Result<Value, TransportError>>,
        seen: Vec<(String, Vec<Value>)>,
    }

    #[async_trait]
    impl RpcCaller for Scripted {
        async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
            self.seen.push((method.to_string(), params));
            self.replies
                .pop_front()
                .unwrap_or(Err(TransportError::Timeout { ms: 10_000 }))
        }
    }

    fn scripted(replies: Vec<Result<Value, TransportError>>) -> Scripted {
        Scripted {
            replies: replies.into(),
            seen: vec![],
        }
    }

    fn hex_value(bytes: &[u8]) -> Value {
        Value::from(format!("0x{}", hex::encode(bytes)))
    }

    #[tokio::test]
    async fn name_symbol_via_eth_call() {
        let name = encode_params(&[AbiValue::String("Pancake".into())]);
        let mut sym = [0u8; 32];
        sym[..4].copy_from_slice(b"CAKE");
        let mut rpc = scripted(vec![Ok(hex_value(&name)), Ok(hex_value(&sym))]);

        let token = Address::repeat_byte(0x0e);
        let (n, s) = erc20_name_symbol(&mut rpc, token).await;
        assert_eq!((n.as_str(), s.as_str()), ("Pancake", "CAKE"));

        assert_eq!(rpc.seen[0].0, "eth_call");
        assert_eq!(rpc.seen[0].1[0]["data"], "0x06fdde03");
        assert_eq!(rpc.seen[1].1[0]["data"], "0x95d89b41");
        assert_eq!(rpc.seen[0].1[1], "latest");
    }

    #[tokio::test]
    async fn name_symbol_fall_back_to_empty() {
        let mut rpc = scripted(vec![Ok(Value::from("0x")), Err(TransportError::Timeout { ms: 1 })]);
        let (n, s) = erc20_name_symbol(&mut rpc, Address::ZERO).await;
        assert!(n.is_empty() && s.is_empty());
    }

    #[tokio::test]
    async fn transaction_input_lookup() {
        let mut rpc = scripted(vec![
            Ok(json!({"hash": "0x01", "input": "0xdeadbeef"})),
            Ok(Value::Null),
        ]);
        let input = transaction_input(&mut rpc, B256::repeat_byte(1)).await.unwrap();
        assert_eq!(input.unwrap().as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            rpc.seen[0].1[0],
            json!(format!("0x{}", "01".repeat(32)))
        );

        let missing = transaction_input(&mut rpc, B256::repeat_byte(2)).await.unwrap();
        assert!(missing.is_none());
    }
}
