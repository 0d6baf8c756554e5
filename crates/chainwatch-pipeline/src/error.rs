//! Error types for the event pipeline.

use std::path::PathBuf;

use chainwatch_abi::DecodeError;
use chainwatch_rpc::TransportError;
use thiserror::Error;

/// Why a single event could not be evaluated. Never escapes the per-event
/// boundary: the pipeline logs it and moves on.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("enrichment call failed: {0}")]
    Transport(#[from] TransportError),

    /// A value the filter chain cannot do without is unavailable.
    #[error("enrichment failed: {0}")]
    Enrichment(String),
}

impl PipelineError {
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Notification delivery failed. Logged only.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("messaging API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("no target channel configured")]
    NoChannel,
}

/// External market-data lookup failed. Callers fall back to placeholders.
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
