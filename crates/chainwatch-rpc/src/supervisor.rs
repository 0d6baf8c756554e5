//! Reconnect supervisor.
//!
//! `Disconnected → Connecting → Subscribed → Streaming`, and back to
//! `Disconnected` on any transport failure. Every registered subscription is
//! re-sent on each new connection before the first push is read. Retries are
//! unbounded with a fixed delay.

use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::connection::Connection;
use crate::error::TransportError;
use crate::log::{LogSubscription, RawLog};
use crate::ws::Connector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Disconnected,
    Connecting,
    Subscribed,
    Streaming,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Subscribed => "subscribed",
            Self::Streaming => "streaming",
        };
        f.write_str(s)
    }
}

/// Receives each live log together with the connection it arrived on, so
/// handlers can issue enrichment calls on the same socket.
#[async_trait]
pub trait LogSink: Send {
    async fn on_log(&mut self, log: RawLog, conn: &mut Connection);
}

pub struct Supervisor<C> {
    connector: C,
    subscriptions: Vec<LogSubscription>,
    reconnect_delay: Duration,
    state: watch::Sender<SupervisorState>,
    reconnects: Arc<AtomicU64>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: C, subscriptions: Vec<LogSubscription>, reconnect_delay: Duration) -> Self {
        let (state, _) = watch::channel(SupervisorState::Disconnected);
        Self {
            connector,
            subscriptions,
            reconnect_delay,
            state,
            reconnects: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn subscriptions(&self) -> &[LogSubscription] {
        &self.subscriptions
    }

    /// Watch the state machine.
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Shared counter of reconnect cycles.
    pub fn reconnects(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.reconnects)
    }

    fn set_state(&self, next: SupervisorState) {
        self.state.send_replace(next);
        tracing::debug!(state = %next, "supervisor state");
    }

    /// Run for the lifetime of the process.
    pub async fn run<S: LogSink>(&mut self, sink: &mut S) {
        loop {
            let err = match self.session(sink).await {
                Ok(never) => match never {},
                Err(e) => e,
            };
            self.set_state(SupervisorState::Disconnected);
            let attempt = self.reconnects.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::warn!(
                error = %err,
                attempt,
                delay_ms = self.reconnect_delay.as_millis() as u64,
                "connection lost, reconnecting"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// One connection lifetime. Only returns on failure.
    async fn session<S: LogSink>(&mut self, sink: &mut S) -> Result<Infallible, TransportError> {
        self.set_state(SupervisorState::Connecting);
        let mut conn = self.connector.connect().await?;

        for sub in &self.subscriptions {
            conn.subscribe(sub).await?;
        }
        self.set_state(SupervisorState::Subscribed);
        tracing::info!(count = self.subscriptions.len(), "subscriptions sent");

        self.set_state(SupervisorState::Streaming);
        // A closed connection still yields its backlog before `Closed`.
        loop {
            let log = conn.next_log().await?;
            sink.on_log(log, &mut conn).await;
        }
    }
}
