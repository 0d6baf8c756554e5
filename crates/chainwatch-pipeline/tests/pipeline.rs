//! Routing, per-event isolation and counters; plus one full pass from a
//! subscription push to a delivered notification over a real `Connection`.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use chainwatch_pipeline::config::{FlapSettings, PancakeSettings};
use chainwatch_pipeline::{FlapWatcher, MetricsSnapshot, PancakeWatcher, Pipeline};
use chainwatch_rpc::{Connection, Connector, FrameIo, Supervisor, TransportError};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use common::*;

const TOKEN: &str = "0x7a1e0b0c9d8e7f6a5b4c3d2e1f0a9b8c7d6e5f40";
const CREATOR: &str = "0x1111111111111111111111111111111111111111";
const BENEFICIARY: &str = "0x2222222222222222222222222222222222222222";

fn addr(s: &str) -> Address {
    s.parse().unwrap()
}

fn pipeline(notifier: &RecordingNotifier) -> Pipeline {
    Pipeline::new(Arc::new(StubMarket::default()), Arc::new(notifier.clone()))
        .with_handler(Arc::new(FlapWatcher::new(&FlapSettings::default())))
        .with_handler(Arc::new(PancakeWatcher::new(&PancakeSettings::default())))
}

#[tokio::test]
async fn routes_by_address_and_topic() {
    let notifier = RecordingNotifier::default();
    let mut pipeline = pipeline(&notifier);
    let flap = FlapSettings::default();
    let mut rpc = ScriptedRpc::new(tx_responder(Some(flap_input(addr(BENEFICIARY), 300))));

    let log = flap_log(&flap, addr(TOKEN), addr(CREATOR), B256::repeat_byte(9));
    pipeline.process(&log, &mut rpc).await;

    // Right topic, wrong contract.
    let mut stray = log.clone();
    stray.address = Address::repeat_byte(0xee);
    pipeline.process(&stray, &mut rpc).await;

    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(
        pipeline.metrics(),
        MetricsSnapshot {
            received: 2,
            unmatched: 1,
            notified: 1,
            ..Default::default()
        }
    );
}

#[tokio::test]
async fn one_bad_event_does_not_affect_the_next() {
    let notifier = RecordingNotifier::default();
    let mut pipeline = pipeline(&notifier);
    let flap = FlapSettings::default();
    let mut rpc = ScriptedRpc::new(tx_responder(Some(flap_input(addr(BENEFICIARY), 300))));

    let mut broken = flap_log(&flap, addr(TOKEN), addr(CREATOR), B256::repeat_byte(1));
    broken.data = broken.data[..64].to_vec().into();
    pipeline.process(&broken, &mut rpc).await;

    let self_funded = flap_log(&flap, addr(TOKEN), addr(CREATOR), B256::repeat_byte(2));
    let mut self_rpc = ScriptedRpc::new(tx_responder(Some(flap_input(addr(CREATOR), 300))));
    pipeline.process(&self_funded, &mut self_rpc).await;

    let good = flap_log(&flap, addr(TOKEN), addr(CREATOR), B256::repeat_byte(3));
    pipeline.process(&good, &mut rpc).await;

    let mut offline = ScriptedRpc::offline();
    let unreachable = flap_log(&flap, addr(TOKEN), addr(CREATOR), B256::repeat_byte(4));
    pipeline.process(&unreachable, &mut offline).await;

    let m = pipeline.metrics();
    assert_eq!(m.received, 4);
    assert_eq!(m.decode_errors, 1);
    assert_eq!(m.suppressed, 1);
    assert_eq!(m.notified, 1);
    assert_eq!(m.enrichment_errors, 1);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn dispatch_failure_is_counted_not_raised() {
    let notifier = RecordingNotifier {
        fail: true,
        ..Default::default()
    };
    let mut pipeline = pipeline(&notifier);
    let mut rpc = ScriptedRpc::new(tx_responder(Some(flap_input(addr(BENEFICIARY), 300))));
    let log = flap_log(&FlapSettings::default(), addr(TOKEN), addr(CREATOR), B256::repeat_byte(1));

    pipeline.process(&log, &mut rpc).await;

    let m = pipeline.metrics();
    assert_eq!(m.dispatch_failures, 1);
    assert_eq!(m.notified, 0);
}

#[tokio::test]
async fn dedup_drops_replayed_logs_only_when_enabled() {
    let log = flap_log(&FlapSettings::default(), addr(TOKEN), addr(CREATOR), B256::repeat_byte(1));

    let notifier = RecordingNotifier::default();
    let mut plain = pipeline(&notifier);
    let mut rpc = ScriptedRpc::new(tx_responder(Some(flap_input(addr(BENEFICIARY), 300))));
    plain.process(&log, &mut rpc).await;
    plain.process(&log, &mut rpc).await;
    assert_eq!(notifier.sent().len(), 2);

    let notifier = RecordingNotifier::default();
    let mut deduped = pipeline(&notifier).with_dedup(16);
    deduped.process(&log, &mut rpc).await;
    deduped.process(&log, &mut rpc).await;
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(deduped.metrics().duplicates, 1);
}

#[test]
fn subscriptions_follow_registration_order() {
    let subs = pipeline(&RecordingNotifier::default()).subscriptions();
    let labels: Vec<&str> = subs.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["flap", "pancake"]);
}

// ─── End to end ──────────────────────────────────────────────────────────────

/// Frame I/O whose far end is a task playing the node.
struct NodeIo {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl FrameIo for NodeIo {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.outbound.send(text).map_err(|_| TransportError::Closed)
    }

    async fn recv_text(&mut self) -> Result<Option<String>, TransportError> {
        Ok(self.inbound.recv().await)
    }
}

struct OneShotConnector(Mutex<Option<NodeIo>>);

#[async_trait]
impl Connector for OneShotConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        match self.0.lock().unwrap().take() {
            Some(io) => Ok(Connection::new(Box::new(io), Duration::from_secs(10))),
            None => Err(TransportError::WebSocket("connection refused".into())),
        }
    }
}

/// Acks the subscription, pushes one flap log, then serves the transaction
/// lookup the flap watcher makes while handling it.
async fn play_node(mut requests: mpsc::UnboundedReceiver<String>, frames: mpsc::UnboundedSender<String>) {
    let flap = FlapSettings::default();
    let tx = B256::repeat_byte(0x77);
    let log = flap_log(&flap, addr(TOKEN), addr(CREATOR), tx);

    while let Some(text) = requests.recv().await {
        let req: Value = serde_json::from_str(&text).unwrap();
        let reply = match req["method"].as_str().unwrap() {
            "eth_subscribe" => {
                let ack = json!({"jsonrpc": "2.0", "id": req["id"], "result": "0xfeed"});
                frames.send(ack.to_string()).unwrap();
                json!({
                    "jsonrpc": "2.0",
                    "method": "eth_subscription",
                    "params": {"subscription": "0xfeed", "result": log}
                })
            }
            "eth_getTransactionByHash" => json!({
                "jsonrpc": "2.0",
                "id": req["id"],
                "result": {"hash": tx, "input": hex_value(&flap_input(addr(BENEFICIARY), 150))}
            }),
            other => panic!("unexpected request {other}"),
        };
        frames.send(reply.to_string()).unwrap();
    }
}

#[tokio::test]
async fn push_to_notification_over_connection() {
    let (frame_tx, frame_rx) = mpsc::unbounded_channel();
    let (req_tx, req_rx) = mpsc::unbounded_channel();
    tokio::spawn(play_node(req_rx, frame_tx));

    let notifier = RecordingNotifier::default();
    let mut pipeline = Pipeline::new(Arc::new(StubMarket::default()), Arc::new(notifier.clone()))
        .with_handler(Arc::new(FlapWatcher::new(&FlapSettings::default())));
    let connector = OneShotConnector(Mutex::new(Some(NodeIo {
        inbound: frame_rx,
        outbound: req_tx,
    })));
    let mut supervisor = Supervisor::new(connector, pipeline.subscriptions(), Duration::from_secs(5));

    let delivered = async {
        while notifier.sent().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::select! {
            _ = supervisor.run(&mut pipeline) => unreachable!("supervisor never returns"),
            _ = delivered => {}
        }
    })
    .await
    .expect("notification within 5s");

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("1.50% + 1%"));
    assert!(sent[0].text.contains(&addr(BENEFICIARY).to_string()));
    assert_eq!(pipeline.metrics().notified, 1);
}
