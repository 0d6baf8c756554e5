//! Head/tail ABI decoder.
//!
//! # Layout
//! A tuple is encoded as a head of 32-byte slots followed by a tail.
//! Static values sit directly in their head slot (static tuples are inlined).
//! Dynamic values (`bytes`, `string`, tuples with a dynamic member) store in
//! their head slot a byte offset, relative to the start of the enclosing
//! tuple, pointing at their encoding in the tail. `bytes`/`string` payloads
//! are a 32-byte length word followed by the content, right-padded to a
//! multiple of 32; the padding is never read.
//!
//! Every read is bounds-checked with checked arithmetic; a bad offset or
//! length yields [`DecodeError`], never a panic.

use alloy_primitives::{Address, B256, U256};

use crate::error::DecodeError;
use crate::types::{AbiValue, TypeTag};

/// Decode `data` as the tuple `types` (the parameter list of a log or call).
pub fn decode_params(types: &[TypeTag], data: &[u8]) -> Result<Vec<AbiValue>, DecodeError> {
    let needed: usize = types.iter().map(TypeTag::head_size).sum();
    if data.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            len: data.len(),
        });
    }
    decode_tuple(types, data, 0)
}

/// Decode the return data of an ERC-20 `name()` / `symbol()` call.
///
/// Accepts the standard `string` return and the legacy `bytes32` return
/// (NUL-padded) used by some older tokens.
pub fn decode_string_result(data: &[u8]) -> Result<String, DecodeError> {
    match decode_params(&[TypeTag::String], data) {
        Ok(mut values) => match values.pop() {
            Some(AbiValue::String(s)) => Ok(s),
            _ => Err(DecodeError::InvalidUtf8),
        },
        Err(e) if data.len() == 32 => {
            let end = data.iter().position(|b| *b == 0).unwrap_or(32);
            match std::str::from_utf8(&data[..end]) {
                Ok(s) => Ok(s.to_string()),
                Err(_) => Err(e),
            }
        }
        Err(e) => Err(e),
    }
}

/// Decode a tuple whose encoding starts at `base`.
pub(crate) fn decode_tuple(
    types: &[TypeTag],
    data: &[u8],
    base: usize,
) -> Result<Vec<AbiValue>, DecodeError> {
    let mut values = Vec::with_capacity(types.len());
    let mut head = base;
    for ty in types {
        if ty.is_dynamic() {
            let rel = read_usize(data, head)?;
            let start = base.checked_add(rel).ok_or_else(|| DecodeError::InvalidOffset {
                value: rel.to_string(),
            })?;
            values.push(decode_dynamic(ty, data, start)?);
        } else {
            values.push(decode_static(ty, data, head)?);
        }
        head += ty.head_size();
    }
    Ok(values)
}

/// Decode a static value whose encoding starts at `at`.
pub(crate) fn decode_static(ty: &TypeTag, data: &[u8], at: usize) -> Result<AbiValue, DecodeError> {
    match ty {
        TypeTag::Address => {
            let w = word(data, at)?;
            if w[..12].iter().any(|b| *b != 0) {
                return Err(DecodeError::DirtyAddress);
            }
            Ok(AbiValue::Address(Address::from_slice(&w[12..])))
        }
        TypeTag::Bool => match U256::from_be_bytes(*word(data, at)?) {
            v if v.is_zero() => Ok(AbiValue::Bool(false)),
            v if v == U256::from(1u8) => Ok(AbiValue::Bool(true)),
            _ => Err(DecodeError::InvalidBool),
        },
        TypeTag::Uint(bits) => {
            let v = U256::from_be_bytes(*word(data, at)?);
            if v.bit_len() > *bits as usize {
                return Err(DecodeError::UintOverflow { bits: *bits });
            }
            Ok(AbiValue::Uint(v, *bits))
        }
        TypeTag::FixedBytes(size) => {
            let mut out = B256::ZERO;
            let n = *size as usize;
            out[..n].copy_from_slice(&word(data, at)?[..n]);
            Ok(AbiValue::FixedBytes(out, *size))
        }
        TypeTag::Tuple(inner) => decode_tuple(inner, data, at).map(AbiValue::Tuple),
        TypeTag::Bytes | TypeTag::String => decode_dynamic(ty, data, at),
    }
}

/// Decode a dynamic value whose tail encoding starts at `start`.
fn decode_dynamic(ty: &TypeTag, data: &[u8], start: usize) -> Result<AbiValue, DecodeError> {
    match ty {
        TypeTag::Bytes => read_length_prefixed(data, start).map(|b| AbiValue::Bytes(b.to_vec())),
        TypeTag::String => {
            let raw = read_length_prefixed(data, start)?;
            std::str::from_utf8(raw)
                .map(|s| AbiValue::String(s.to_string()))
                .map_err(|_| DecodeError::InvalidUtf8)
        }
        TypeTag::Tuple(inner) => decode_tuple(inner, data, start).map(AbiValue::Tuple),
        _ => decode_static(ty, data, start),
    }
}

/// Read `length || content` at `start` and return the content (padding ignored).
fn read_length_prefixed(data: &[u8], start: usize) -> Result<&[u8], DecodeError> {
    let len = read_usize(data, start)?;
    let content = start + 32;
    slice(data, content, len)
}

/// Read the 32-byte slot at `at`.
fn word(data: &[u8], at: usize) -> Result<&[u8; 32], DecodeError> {
    slice(data, at, 32)?
        .try_into()
        .map_err(|_| DecodeError::OutOfBounds {
            offset: at,
            needed: 32,
            len: data.len(),
        })
}

/// Read the slot at `at` as an offset or length.
fn read_usize(data: &[u8], at: usize) -> Result<usize, DecodeError> {
    let v = U256::from_be_bytes(*word(data, at)?);
    u64::try_from(v)
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| DecodeError::InvalidOffset {
            value: v.to_string(),
        })
}

fn slice(data: &[u8], offset: usize, needed: usize) -> Result<&[u8], DecodeError> {
    offset
        .checked_add(needed)
        .and_then(|end| data.get(offset..end))
        .ok_or(DecodeError::OutOfBounds {
            offset,
            needed,
            len: data.len(),
        })
}
