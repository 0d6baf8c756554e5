//! Transport-level error types.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors raised by a [`Connection`](crate::Connection) or its frame I/O.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect, send or receive failed on the socket, or keepalive expired.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,

    /// The node answered a call with an error object.
    #[error("RPC error: {0}")]
    Rpc(JsonRpcError),

    /// No matching response arrived within the call window.
    #[error("call timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// A frame or result could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// `true` when the connection is unusable and must be re-established.
    ///
    /// Everything else is local to one call: the caller falls back and the
    /// stream keeps going.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::WebSocket(_) | Self::Closed)
    }
}
