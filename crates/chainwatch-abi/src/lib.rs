//! chainwatch-abi: head/tail ABI codec for EVM event logs and call inputs.
//!
//! # Overview
//!
//! The codec is pure: no I/O, no state. It covers the subset of the
//! Solidity ABI that event watchers need:
//!
//! - [`TypeTag`]: `address`, `bool`, `uintN`, `bytesN`, `bytes`, `string`
//!   and (nested) tuples, parsed from Solidity type strings
//! - [`Schema`]: an ordered parameter list with per-field `indexed` flags
//! - [`decoder`]: bounds-checked head/tail decoding of log data, topics and
//!   selector-prefixed call input into a [`DecodedRecord`]
//! - [`encoder`]: canonical head/tail encoding (calldata, test fixtures)
//! - [`signature`]: keccak-256 event topics and function selectors
//!
//! Every decode path returns [`DecodeError`] on truncated or malformed input;
//! nothing in this crate panics on data received from the network.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod schema;
pub mod signature;
pub mod types;

pub use decoder::{decode_params, decode_string_result};
pub use encoder::{encode_call, encode_params};
pub use error::DecodeError;
pub use schema::{DecodedRecord, Param, Schema};
pub use signature::{event_topic, function_selector};
pub use types::{AbiValue, TypeTag};

pub use alloy_primitives::{Address, B256, U256};
