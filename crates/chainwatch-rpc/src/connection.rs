//! One logical connection: pushes and call responses demultiplexed by id.
//!
//! A single task owns the [`Connection`]. While it awaits a call response,
//! any push that arrives first is parked in an arrival-ordered backlog and
//! handed out by the next [`Connection::next_log`]; only the response that
//! carries the call's id resolves the call.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::{self, Instant};

use crate::error::TransportError;
use crate::frame::{Frame, SubscriptionPush};
use crate::log::{LogSubscription, RawLog};
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::ws::FrameIo;

/// Synchronous request/response over an established connection.
///
/// Implemented by [`Connection`]; enrichment code depends on this trait so it
/// can run against a scripted caller in tests.
#[async_trait]
pub trait RpcCaller: Send {
    async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, TransportError>;
}

pub struct Connection {
    io: Box<dyn FrameIo>,
    next_id: u64,
    backlog: VecDeque<SubscriptionPush>,
    /// Outstanding `eth_subscribe` ids → subscription label.
    pending_subscribes: HashMap<u64, String>,
    call_timeout: Duration,
    closed: bool,
}

impl Connection {
    pub fn new(io: Box<dyn FrameIo>, call_timeout: Duration) -> Self {
        Self {
            io,
            next_id: 1,
            backlog: VecDeque::new(),
            pending_subscribes: HashMap::new(),
            call_timeout,
            closed: false,
        }
    }

    /// `true` once the socket has failed or been closed by the peer.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Pushes received during calls that have not been consumed yet.
    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn track<T>(&mut self, result: Result<T, TransportError>) -> Result<T, TransportError> {
        if let Err(e) = &result {
            if e.is_fatal() {
                self.closed = true;
            }
        }
        result
    }

    /// Write one request to the socket.
    pub async fn send(&mut self, req: &JsonRpcRequest) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let text = serde_json::to_string(req)?;
        let sent = self.io.send_text(text).await;
        self.track(sent)
    }

    /// Issue `eth_subscribe` without waiting for the acknowledgement; the ack
    /// is logged when it turns up in the frame stream.
    pub async fn subscribe(&mut self, sub: &LogSubscription) -> Result<u64, TransportError> {
        let id = self.alloc_id();
        let req = JsonRpcRequest::new(id, "eth_subscribe", sub.params());
        self.send(&req).await?;
        self.pending_subscribes.insert(id, sub.label.clone());
        tracing::debug!(id, label = %sub.label, address = %sub.address, "eth_subscribe sent");
        Ok(id)
    }

    /// Next classified frame straight off the socket. Malformed frames are
    /// logged and skipped.
    pub async fn receive_next(&mut self) -> Result<Frame, TransportError> {
        loop {
            if self.closed {
                return Err(TransportError::Closed);
            }
            let received = self.io.recv_text().await;
            let text = match self.track(received)? {
                Some(text) => text,
                None => {
                    self.closed = true;
                    return Err(TransportError::Closed);
                }
            };
            match Frame::parse(&text) {
                Ok(frame) => return Ok(frame),
                Err(e) => {
                    tracing::warn!(error = %e, len = text.len(), "dropping malformed frame")
                }
            }
        }
    }

    /// Next subscription push: the backlog first, then the socket.
    pub async fn next_push(&mut self) -> Result<SubscriptionPush, TransportError> {
        if let Some(push) = self.backlog.pop_front() {
            return Ok(push);
        }
        loop {
            match self.receive_next().await? {
                Frame::Push(push) => return Ok(push),
                Frame::Response(resp) => self.on_uncorrelated_response(resp),
                Frame::Other(value) => tracing::debug!(frame = %value, "ignoring frame"),
            }
        }
    }

    /// Next live log. Retracted (`removed`) logs and pushes that are not logs
    /// are skipped.
    pub async fn next_log(&mut self) -> Result<RawLog, TransportError> {
        loop {
            let push = self.next_push().await?;
            match serde_json::from_value::<RawLog>(push.result) {
                Ok(log) if log.removed => {
                    tracing::debug!(tx_hash = ?log.transaction_hash, "skipping removed log");
                }
                Ok(log) => return Ok(log),
                Err(e) => tracing::warn!(
                    subscription = %push.subscription,
                    error = %e,
                    "push is not a log"
                ),
            }
        }
    }

    /// Send `method(params)` and wait for the response with the same id.
    ///
    /// Pushes seen meanwhile go to the backlog; responses to other ids are
    /// treated as subscribe acks or dropped.
    pub async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let id = self.alloc_id();
        self.send(&JsonRpcRequest::new(id, method, params)).await?;
        let deadline = Instant::now() + self.call_timeout;

        loop {
            let frame = match time::timeout_at(deadline, self.receive_next()).await {
                Ok(frame) => frame?,
                Err(_) => {
                    tracing::warn!(id, method, "call timed out");
                    return Err(TransportError::Timeout {
                        ms: self.call_timeout.as_millis() as u64,
                    });
                }
            };
            match frame {
                Frame::Response(resp) if resp.id.as_number() == Some(id) => {
                    return resp.into_result().map_err(TransportError::Rpc);
                }
                Frame::Response(resp) => self.on_uncorrelated_response(resp),
                Frame::Push(push) => {
                    tracing::debug!(id, backlog = self.backlog.len() + 1, "buffering push during call");
                    self.backlog.push_back(push);
                }
                Frame::Other(value) => tracing::debug!(frame = %value, "ignoring frame"),
            }
        }
    }

    fn on_uncorrelated_response(&mut self, resp: JsonRpcResponse) {
        let label = resp
            .id
            .as_number()
            .and_then(|id| self.pending_subscribes.remove(&id));
        match (label, resp.into_result()) {
            (Some(label), Ok(sub_id)) => {
                tracing::info!(label = %label, subscription = %sub_id, "subscription confirmed")
            }
            (Some(label), Err(err)) => {
                tracing::warn!(label = %label, error = %err, "subscription rejected")
            }
            (None, _) => tracing::debug!("dropping response with no waiting caller"),
        }
    }
}

#[async_trait]
impl RpcCaller for Connection {
    async fn call(&mut self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        Connection::call(self, method, params).await
    }
}
