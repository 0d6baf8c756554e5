//! ABI encoder: the inverse of [`crate::decoder`].
//!
//! Produces canonical head/tail encodings: offsets point at the tail in
//! declaration order and every dynamic payload is zero-padded to 32 bytes.

use alloy_primitives::U256;

use crate::types::AbiValue;

/// Encode a parameter list as a tuple.
pub fn encode_params(values: &[AbiValue]) -> Vec<u8> {
    encode_tuple(values)
}

/// Encode a function call: `selector || encode_params(args)`.
pub fn encode_call(selector: [u8; 4], args: &[AbiValue]) -> Vec<u8> {
    let mut out = selector.to_vec();
    out.extend(encode_tuple(args));
    out
}

fn head_size(value: &AbiValue) -> usize {
    match value {
        AbiValue::Tuple(vals) if !value.is_dynamic() => vals.iter().map(head_size).sum(),
        _ => 32,
    }
}

fn encode_tuple(values: &[AbiValue]) -> Vec<u8> {
    let head_len: usize = values.iter().map(head_size).sum();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        if value.is_dynamic() {
            head.extend(uint_word(U256::from(head_len + tail.len())));
            tail.extend(encode_dynamic(value));
        } else {
            head.extend(encode_static(value));
        }
    }
    head.extend(tail);
    head
}

fn encode_static(value: &AbiValue) -> Vec<u8> {
    match value {
        AbiValue::Address(a) => a.into_word().to_vec(),
        AbiValue::Bool(b) => uint_word(U256::from(*b as u8)),
        AbiValue::Uint(v, _) => uint_word(*v),
        AbiValue::FixedBytes(b, _) => b.to_vec(),
        AbiValue::Tuple(vals) => encode_tuple(vals),
        AbiValue::Bytes(_) | AbiValue::String(_) => encode_dynamic(value),
    }
}

fn encode_dynamic(value: &AbiValue) -> Vec<u8> {
    match value {
        AbiValue::Bytes(b) => length_prefixed(b),
        AbiValue::String(s) => length_prefixed(s.as_bytes()),
        AbiValue::Tuple(vals) => encode_tuple(vals),
        other => encode_static(other),
    }
}

fn length_prefixed(content: &[u8]) -> Vec<u8> {
    let padded = content.len().div_ceil(32) * 32;
    let mut out = uint_word(U256::from(content.len()));
    out.extend_from_slice(content);
    out.resize(32 + padded, 0);
    out
}

fn uint_word(v: U256) -> Vec<u8> {
    v.to_be_bytes::<32>().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_params;
    use crate::signature::function_selector;

    #[test]
    fn encodes_name_call_as_bare_selector() {
        let calldata = encode_call(function_selector("name()"), &[]);
        assert_eq!(hex::encode(calldata), "06fdde03");
    }

    #[test]
    fn string_layout() {
        let enc = encode_params(&[AbiValue::String("Foo".into())]);
        assert_eq!(enc.len(), 96);
        assert_eq!(enc[31], 0x20);
        assert_eq!(enc[63], 3);
        assert_eq!(&enc[64..67], b"Foo");
        assert!(enc[67..].iter().all(|b| *b == 0));
    }

    #[test]
    fn nested_dynamic_tuple_decodes_back() {
        let value = AbiValue::Tuple(vec![
            AbiValue::String("a".repeat(40)),
            AbiValue::Uint(U256::from(9u8), 8),
            AbiValue::Bytes(vec![1, 2, 3]),
        ]);
        let enc = encode_params(std::slice::from_ref(&value));
        let dec = decode_params(&[value.type_tag()], &enc).unwrap();
        assert_eq!(dec, vec![value]);
    }
}
