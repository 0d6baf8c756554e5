//! Text-frame I/O over a WebSocket, with ping/pong keepalive.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::connection::Connection;
use crate::error::TransportError;

/// The socket seam beneath a [`Connection`].
///
/// `recv_text` yields the next text payload, `Ok(None)` once the peer has
/// closed the stream. Control frames never surface here.
#[async_trait]
pub trait FrameIo: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;
    async fn recv_text(&mut self) -> Result<Option<String>, TransportError>;
}

/// Opens fresh connections for the [`Supervisor`](crate::Supervisor).
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Connection, TransportError>;
}

/// Timing knobs of a WebSocket connection.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub ping_interval: Duration,
    pub pong_timeout: Duration,
    /// Upper bound on the handshake and on each synchronous call.
    pub call_timeout: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(20),
            pong_timeout: Duration::from_secs(10),
            call_timeout: Duration::from_secs(10),
        }
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsFrameIo {
    socket: Socket,
    ping: Interval,
    pong_timeout: Duration,
    awaiting_pong: Option<Instant>,
}

enum Event {
    Inbound(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    PingDue,
    PongOverdue,
}

impl WsFrameIo {
    pub fn new(socket: Socket, ping_interval: Duration, pong_timeout: Duration) -> Self {
        let mut ping = time::interval_at(Instant::now() + ping_interval, ping_interval);
        ping.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            socket,
            ping,
            pong_timeout,
            awaiting_pong: None,
        }
    }

    async fn next_event(&mut self) -> Event {
        let pong_deadline = self.awaiting_pong.map(|sent| sent + self.pong_timeout);
        let overdue = async move {
            match pong_deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        // Buffered frames, a late pong included, are read before the
        // pong deadline is checked.
        tokio::select! {
            biased;
            msg = self.socket.next() => Event::Inbound(msg),
            _ = self.ping.tick() => Event::PingDue,
            _ = overdue => Event::PongOverdue,
        }
    }
}

fn ws_err(e: tokio_tungstenite::tungstenite::Error) -> TransportError {
    TransportError::WebSocket(e.to_string())
}

#[async_trait]
impl FrameIo for WsFrameIo {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.socket.send(Message::Text(text.into())).await.map_err(ws_err)
    }

    async fn recv_text(&mut self) -> Result<Option<String>, TransportError> {
        loop {
            match self.next_event().await {
                Event::Inbound(None) => return Ok(None),
                Event::Inbound(Some(Err(e))) => return Err(ws_err(e)),
                Event::Inbound(Some(Ok(msg))) => match msg {
                    Message::Text(text) => return Ok(Some(text.as_str().to_owned())),
                    Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => tracing::debug!(len = bytes.len(), "ignoring non-UTF-8 binary frame"),
                    },
                    Message::Ping(payload) => {
                        self.socket.send(Message::Pong(payload)).await.map_err(ws_err)?;
                    }
                    Message::Pong(_) => self.awaiting_pong = None,
                    Message::Close(frame) => {
                        tracing::info!(?frame, "server closed the WebSocket");
                        return Ok(None);
                    }
                    _ => {}
                },
                Event::PingDue => {
                    if self.awaiting_pong.is_none() {
                        self.socket
                            .send(Message::Ping(Vec::new().into()))
                            .await
                            .map_err(ws_err)?;
                        self.awaiting_pong = Some(Instant::now());
                    }
                }
                Event::PongOverdue => {
                    return Err(TransportError::WebSocket(format!(
                        "no pong within {}ms",
                        self.pong_timeout.as_millis()
                    )));
                }
            }
        }
    }
}

/// Dials a `ws://` / `wss://` endpoint.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    config: WsConfig,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, config: WsConfig) -> Self {
        Self {
            url: url.into(),
            config,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Connection, TransportError> {
        tracing::info!(url = %self.url, "connecting via WebSocket");
        let handshake = time::timeout(self.config.call_timeout, connect_async(self.url.as_str()));
        let (socket, _) = match handshake.await {
            Ok(result) => result.map_err(ws_err)?,
            Err(_) => {
                return Err(TransportError::WebSocket(format!(
                    "handshake timed out after {}ms",
                    self.config.call_timeout.as_millis()
                )))
            }
        };
        tracing::info!(url = %self.url, "WebSocket connected");

        let io = WsFrameIo::new(socket, self.config.ping_interval, self.config.pong_timeout);
        Ok(Connection::new(Box::new(io), self.config.call_timeout))
    }
}
