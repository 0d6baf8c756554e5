//! chainwatch-rpc: one WebSocket, two kinds of traffic.
//!
//! # Overview
//!
//! - [`Connection`]: sends requests, classifies inbound frames, and resolves
//!   each [`call`](Connection::call) by request id while parking any
//!   subscription pushes that arrive first
//! - [`WsConnector`] / [`WsFrameIo`]: tokio-tungstenite socket with
//!   ping/pong keepalive
//! - [`Supervisor`]: fixed-delay reconnect loop that re-subscribes every
//!   [`LogSubscription`] on each new connection
//! - [`RpcCaller`]: the call seam used by enrichment code

pub mod connection;
pub mod error;
pub mod frame;
pub mod log;
pub mod request;
pub mod supervisor;
pub mod ws;

pub use connection::{Connection, RpcCaller};
pub use error::TransportError;
pub use frame::{Frame, SubscriptionPush};
pub use log::{parse_quantity, LogSubscription, RawLog};
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId};
pub use supervisor::{LogSink, Supervisor, SupervisorState};
pub use ws::{Connector, FrameIo, WsConfig, WsConnector, WsFrameIo};
