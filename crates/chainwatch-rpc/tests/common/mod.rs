//! In-memory frame I/O: the test plays the node through channels.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chainwatch_rpc::{FrameIo, TransportError};
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub struct ChannelIo {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: Arc<Mutex<Vec<String>>>,
}

/// The node's side of a [`ChannelIo`]. Dropping it closes the connection.
pub struct NodeEnd {
    pub tx: mpsc::UnboundedSender<String>,
    pub sent: Arc<Mutex<Vec<String>>>,
}

pub fn channel_io() -> (ChannelIo, NodeEnd) {
    let (tx, inbound) = mpsc::unbounded_channel();
    let sent = Arc::new(Mutex::new(Vec::new()));
    (
        ChannelIo {
            inbound,
            outbound: Arc::clone(&sent),
        },
        NodeEnd { tx, sent },
    )
}

impl NodeEnd {
    pub fn push(&self, frame: Value) {
        self.tx.send(frame.to_string()).unwrap();
    }

    /// Requests the client has written so far, parsed.
    pub fn requests(&self) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|s| serde_json::from_str(s).unwrap())
            .collect()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl FrameIo for ChannelIo {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound.lock().unwrap().push(text);
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.inbound.recv().await)
    }
}

pub fn log_push(subscription: &str, tx_byte: u8) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "eth_subscription",
        "params": {
            "subscription": subscription,
            "result": {
                "address": "0xca143ce32fe78f1f7019d7d551a6402fc5350c73",
                "topics": ["0x0d3648bd0f6ba80134a33ba9275ac585d9d315f0ad8355cddefde31afa28d0e9"],
                "data": "0x",
                "transactionHash": format!("0x{}", hex_byte(tx_byte).repeat(32)),
                "logIndex": "0x0",
                "removed": false
            }
        }
    })
}

fn hex_byte(b: u8) -> String {
    format!("{b:02x}")
}
