//! Keccak-256 event topics and function selectors.

use alloy_primitives::{keccak256, B256};

/// `topics[0]` of an event with the given canonical signature,
/// e.g. `"PairCreated(address,address,address,uint256)"`.
pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

/// First four bytes of `keccak256(signature)`, e.g. `"name()"` → `0x06fdde03`.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}
