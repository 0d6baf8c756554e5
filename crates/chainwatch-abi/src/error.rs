//! Error types for the ABI codec.

use thiserror::Error;

/// Errors that can occur while decoding ABI-encoded bytes.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A read of `needed` bytes at `offset` would run past the end of the input.
    #[error("out of bounds: need {needed} bytes at offset {offset}, input is {len} bytes")]
    OutOfBounds {
        offset: usize,
        needed: usize,
        len: usize,
    },

    /// The input is shorter than the static head of the tuple being decoded.
    #[error("input too short: head needs {needed} bytes, got {len}")]
    Truncated { needed: usize, len: usize },

    /// An offset or length word does not fit in the address space.
    #[error("offset or length word too large: {value}")]
    InvalidOffset { value: String },

    /// A `uintN` slot carries bits above `N`.
    #[error("value does not fit in uint{bits}")]
    UintOverflow { bits: u16 },

    /// An `address` slot has non-zero bytes above the low 20.
    #[error("address word has non-zero padding")]
    DirtyAddress,

    /// A `bool` slot holds something other than 0 or 1.
    #[error("invalid bool word")]
    InvalidBool,

    /// A `string` payload is not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    /// An indexed parameter has no corresponding topic.
    #[error("missing topic {index} for indexed field '{field}'")]
    MissingTopic { index: usize, field: String },

    /// Call input is shorter than its 4-byte selector.
    #[error("call input too short for selector: {len} bytes")]
    MissingSelector { len: usize },

    /// A type string could not be parsed.
    #[error("cannot parse type '{input}': {reason}")]
    TypeParse { input: String, reason: String },

    /// A record accessor found a value of a different type.
    #[error("field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        got: String,
    },

    /// A record accessor was asked for a field the record does not have.
    #[error("missing field: {field}")]
    MissingField { field: String },

    /// Decoding a named field failed.
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },

    /// Hex input could not be parsed.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl DecodeError {
    pub(crate) fn in_field(self, field: &str) -> Self {
        Self::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }
}
