//! Classification of inbound text frames.
//!
//! The node multiplexes two kinds of frame on one socket:
//!
//! - **push**: `{"method":"eth_subscription","params":{"subscription":..,"result":..}}`,
//!   no id, uncorrelated with any request;
//! - **response**: `{"id":..,"result":..}` or `{"id":..,"error":..}`.
//!
//! Presence of a non-null id together with `result`/`error` is what makes a
//! frame a response; nothing else is trusted.

use serde::Deserialize;
use serde_json::Value;

use crate::request::JsonRpcResponse;

/// Payload of a subscription push.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionPush {
    pub subscription: String,
    pub result: Value,
}

#[derive(Debug, Clone)]
pub enum Frame {
    Push(SubscriptionPush),
    Response(JsonRpcResponse),
    /// Anything else: notifications for other methods, malformed envelopes.
    Other(Value),
}

impl Frame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;

        let has_id = value.get("id").is_some_and(|id| !id.is_null());
        if has_id && (value.get("result").is_some() || value.get("error").is_some()) {
            return serde_json::from_value(value).map(Frame::Response);
        }

        let is_push = !has_id
            && value
                .get("params")
                .and_then(|p| p.get("subscription"))
                .is_some();
        if is_push {
            if let Some(params) = value.get("params").cloned() {
                if let Ok(push) = serde_json::from_value(params) {
                    return Ok(Frame::Push(push));
                }
            }
        }
        Ok(Frame::Other(value))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Push(_) => "push",
            Frame::Response(_) => "response",
            Frame::Other(_) => "other",
        }
    }
}
