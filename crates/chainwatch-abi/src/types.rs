//! ABI type tags and decoded values.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// A supported ABI type.
///
/// Arrays are not supported; none of the watched events use them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeTag {
    /// 20-byte address, right-aligned in its slot.
    Address,
    /// Boolean, encoded as 0 or 1.
    Bool,
    /// Unsigned integer of the given bit width (8..=256, multiple of 8).
    Uint(u16),
    /// Fixed-size byte array (`bytes1` .. `bytes32`), left-aligned.
    FixedBytes(u8),
    /// Length-prefixed byte string.
    Bytes,
    /// Length-prefixed UTF-8 string.
    String,
    /// Ordered tuple of component types.
    Tuple(Vec<TypeTag>),
}

impl TypeTag {
    /// Returns `true` if values of this type live in the tail region.
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeTag::Bytes | TypeTag::String => true,
            TypeTag::Tuple(inner) => inner.iter().any(TypeTag::is_dynamic),
            _ => false,
        }
    }

    /// Number of bytes this type occupies in the head of its enclosing tuple.
    ///
    /// Dynamic types occupy one offset slot; static tuples are inlined.
    pub fn head_size(&self) -> usize {
        match self {
            TypeTag::Tuple(inner) if !self.is_dynamic() => {
                inner.iter().map(TypeTag::head_size).sum()
            }
            _ => 32,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Address => write!(f, "address"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Uint(bits) => write!(f, "uint{bits}"),
            TypeTag::FixedBytes(n) => write!(f, "bytes{n}"),
            TypeTag::Bytes => write!(f, "bytes"),
            TypeTag::String => write!(f, "string"),
            TypeTag::Tuple(inner) => {
                let parts: Vec<_> = inner.iter().map(|t| t.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

impl FromStr for TypeTag {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let parse_err = |reason: &str| DecodeError::TypeParse {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let body = input.strip_prefix("tuple").unwrap_or(input);
        if let Some(inner) = body.strip_prefix('(') {
            let inner = inner
                .strip_suffix(')')
                .ok_or_else(|| parse_err("unbalanced parentheses"))?;
            return split_top_level(inner)
                .map_err(|reason| parse_err(reason))?
                .into_iter()
                .map(str::parse)
                .collect::<Result<Vec<_>, _>>()
                .map(TypeTag::Tuple);
        }

        if input.ends_with(']') {
            return Err(parse_err("array types are not supported"));
        }

        match input {
            "address" => Ok(TypeTag::Address),
            "bool" => Ok(TypeTag::Bool),
            "string" => Ok(TypeTag::String),
            "bytes" => Ok(TypeTag::Bytes),
            "uint" => Ok(TypeTag::Uint(256)),
            _ => {
                if let Some(bits) = input.strip_prefix("uint") {
                    let bits: u16 = bits.parse().map_err(|_| parse_err("bad uint width"))?;
                    if bits == 0 || bits > 256 || bits % 8 != 0 {
                        return Err(parse_err("uint width must be a multiple of 8 in 8..=256"));
                    }
                    Ok(TypeTag::Uint(bits))
                } else if let Some(size) = input.strip_prefix("bytes") {
                    let size: u8 = size.parse().map_err(|_| parse_err("bad bytes size"))?;
                    if size == 0 || size > 32 {
                        return Err(parse_err("bytes size must be in 1..=32"));
                    }
                    Ok(TypeTag::FixedBytes(size))
                } else {
                    Err(parse_err("unknown type"))
                }
            }
        }
    }
}

impl TryFrom<String> for TypeTag {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeTag> for String {
    fn from(value: TypeTag) -> Self {
        value.to_string()
    }
}

/// Split a tuple body on commas that are not nested inside parentheses.
fn split_top_level(body: &str) -> Result<Vec<&str>, &'static str> {
    if body.trim().is_empty() {
        return Ok(vec![]);
    }
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1).ok_or("unbalanced parentheses")?,
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced parentheses");
    }
    parts.push(&body[start..]);
    Ok(parts)
}

/// A decoded ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Address(Address),
    Bool(bool),
    /// Value and declared bit width.
    Uint(U256, u16),
    /// Left-aligned bytes and declared size; bytes past `size` are zero.
    FixedBytes(B256, u8),
    Bytes(Vec<u8>),
    String(String),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// The type tag this value encodes as.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            AbiValue::Address(_) => TypeTag::Address,
            AbiValue::Bool(_) => TypeTag::Bool,
            AbiValue::Uint(_, bits) => TypeTag::Uint(*bits),
            AbiValue::FixedBytes(_, size) => TypeTag::FixedBytes(*size),
            AbiValue::Bytes(_) => TypeTag::Bytes,
            AbiValue::String(_) => TypeTag::String,
            AbiValue::Tuple(vals) => TypeTag::Tuple(vals.iter().map(AbiValue::type_tag).collect()),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiValue::Bytes(_) | AbiValue::String(_) => true,
            AbiValue::Tuple(vals) => vals.iter().any(AbiValue::is_dynamic),
            _ => false,
        }
    }

    /// Short type name used in error messages.
    pub(crate) fn kind(&self) -> String {
        self.type_tag().to_string()
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Address(a) => write!(f, "{a}"),
            AbiValue::Bool(b) => write!(f, "{b}"),
            AbiValue::Uint(v, _) => write!(f, "{v}"),
            AbiValue::FixedBytes(b, size) => {
                write!(f, "0x{}", hex::encode(&b[..*size as usize]))
            }
            AbiValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            AbiValue::String(s) => write!(f, "{s}"),
            AbiValue::Tuple(vals) => {
                let parts: Vec<_> = vals.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}
