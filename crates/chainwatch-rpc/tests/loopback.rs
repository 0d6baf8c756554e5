//! Real WebSocket round trips against a local server.

use std::time::Duration;

use alloy_primitives::B256;
use chainwatch_rpc::{Connector, LogSubscription, TransportError, WsConfig, WsConnector};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

fn push(tx_byte: u8) -> String {
    json!({
        "jsonrpc": "2.0",
        "method": "eth_subscription",
        "params": {
            "subscription": "0x9ce59a13059e417087c02d3236a0b1cc",
            "result": {
                "address": "0xe2ce6ab80874fa9fa2aae65d277dd6b8e65c9de0",
                "topics": ["0x504e7f360b2e5fe33cbaaae4c593bc55305328341bf79009e43e0e3b7f699603"],
                "data": "0x",
                "transactionHash": format!("0x{}", format!("{tx_byte:02x}").repeat(32)),
                "removed": false
            }
        }
    })
    .to_string()
}

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    (listener, url)
}

#[tokio::test]
async fn subscribe_stream_and_call_over_a_socket() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();

        // eth_subscribe → ack, then one push.
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected subscribe")
        };
        let req: Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(req["method"], "eth_subscribe");
        ws.send(Message::Text(
            json!({"jsonrpc":"2.0","id":req["id"],"result":"0x9ce59a13059e417087c02d3236a0b1cc"})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();
        ws.send(Message::Text(push(1).into())).await.unwrap();

        // The call is answered only after another push slips in.
        let Some(Ok(Message::Text(text))) = ws.next().await else {
            panic!("expected call")
        };
        let req: Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(req["method"], "eth_getTransactionByHash");
        ws.send(Message::Text(push(2).into())).await.unwrap();
        ws.send(Message::Text(
            json!({"jsonrpc":"2.0","id":req["id"],"result":{"input":"0xabcdef"}})
                .to_string()
                .into(),
        ))
        .await
        .unwrap();

        ws.close(None).await.ok();
    });

    let connector = WsConnector::new(url, WsConfig::default());
    let mut conn = connector.connect().await.unwrap();
    let sub = LogSubscription::new(
        "flap",
        "0xe2cE6ab80874Fa9Fa2aAE65D277Dd6B8e65C9De0".parse().unwrap(),
        vec!["0x504e7f360b2e5fe33cbaaae4c593bc55305328341bf79009e43e0e3b7f699603"
            .parse()
            .unwrap()],
    );
    conn.subscribe(&sub).await.unwrap();

    let first = conn.next_log().await.unwrap();
    assert_eq!(first.transaction_hash, Some(B256::repeat_byte(1)));

    let tx = conn
        .call("eth_getTransactionByHash", vec![json!(first.transaction_hash)])
        .await
        .unwrap();
    assert_eq!(tx["input"], "0xabcdef");

    let second = conn.next_log().await.unwrap();
    assert_eq!(second.transaction_hash, Some(B256::repeat_byte(2)));

    let closed = conn.next_log().await.unwrap_err();
    assert!(closed.is_fatal());
    server.await.unwrap();
}

#[tokio::test]
async fn silent_peer_fails_keepalive() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        // Never read, so pings go unanswered.
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(ws);
    });

    let config = WsConfig {
        ping_interval: Duration::from_millis(50),
        pong_timeout: Duration::from_millis(100),
        call_timeout: Duration::from_secs(2),
    };
    let mut conn = WsConnector::new(url, config).connect().await.unwrap();

    let err = conn.next_log().await.unwrap_err();
    assert!(matches!(err, TransportError::WebSocket(ref m) if m.contains("pong")), "{err}");
    assert!(conn.is_closed());
    server.abort();
}

#[tokio::test]
async fn slow_consumer_of_a_live_peer_keeps_the_connection() {
    let (listener, url) = bind().await;
    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        let (mut sink, mut stream) = ws.split();
        // Reading answers pings; the pongs go out with the next write.
        let reader = tokio::spawn(async move { while let Some(Ok(_)) = stream.next().await {} });
        for i in 0..80u8 {
            if sink.send(Message::Text(push(i).into())).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        reader.abort();
    });

    let config = WsConfig {
        ping_interval: Duration::from_millis(100),
        pong_timeout: Duration::from_millis(100),
        call_timeout: Duration::from_secs(2),
    };
    let mut conn = WsConnector::new(url, config).connect().await.unwrap();

    // Each log takes longer to handle than the pong timeout.
    for expected in 0..8u8 {
        let log = conn.next_log().await.unwrap();
        assert_eq!(log.transaction_hash, Some(B256::repeat_byte(expected)));
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
    assert!(!conn.is_closed());
    server.abort();
}

#[tokio::test]
async fn refused_connect_is_a_websocket_error() {
    let (listener, url) = bind().await;
    drop(listener);
    let err = WsConnector::new(url, WsConfig::default())
        .connect()
        .await
        .err()
        .unwrap();
    assert!(err.is_fatal());
}
