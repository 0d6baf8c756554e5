//! Event / call schemas and decoded records.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::decoder::{decode_params, decode_static};
use crate::error::DecodeError;
use crate::signature::{event_topic, function_selector};
use crate::types::{AbiValue, TypeTag};

/// A single named parameter of an event or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeTag,
    /// Event only: carried in `topics[1..]` rather than `data`.
    #[serde(default)]
    pub indexed: bool,
}

/// An ordered parameter list describing how to decode an event log or
/// a call input. Order matters: it is the ABI tuple order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Event or function name, e.g. `"PairCreated"`.
    pub name: String,
    pub params: Vec<Param>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: vec![],
        }
    }

    /// Append a non-indexed parameter.
    pub fn param(mut self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
            indexed: false,
        });
        self
    }

    /// Append an indexed (topic) parameter.
    pub fn indexed(mut self, name: impl Into<String>, ty: TypeTag) -> Self {
        self.params.push(Param {
            name: name.into(),
            ty,
            indexed: true,
        });
        self
    }

    /// Parse a human-readable signature such as
    /// `"PairCreated(address indexed token0, address indexed token1, address pair, uint256)"`.
    ///
    /// Unnamed parameters are named `arg{i}`.
    pub fn parse(signature: &str) -> Result<Self, DecodeError> {
        let parse_err = |reason: &str| DecodeError::TypeParse {
            input: signature.to_string(),
            reason: reason.to_string(),
        };
        let open = signature.find('(').ok_or_else(|| parse_err("missing '('"))?;
        let name = signature[..open].trim();
        if name.is_empty() {
            return Err(parse_err("missing name"));
        }
        let body = signature[open + 1..]
            .trim_end()
            .strip_suffix(')')
            .ok_or_else(|| parse_err("missing ')'"))?;

        let mut schema = Schema::new(name);
        for (i, part) in split_params(body).into_iter().enumerate() {
            let mut tokens: Vec<&str> = part.split_whitespace().collect();
            let mut indexed = false;
            let mut param_name = format!("arg{i}");

            // A trailing token that isn't part of the type is the name.
            if tokens.len() > 1 && !tokens[tokens.len() - 1].ends_with(')') {
                let last = tokens.pop().unwrap_or_default();
                if last == "indexed" {
                    indexed = true;
                } else {
                    param_name = last.to_string();
                }
            }
            if tokens.last() == Some(&"indexed") {
                tokens.pop();
                indexed = true;
            }
            let ty: TypeTag = tokens.concat().parse()?;
            schema.params.push(Param {
                name: param_name,
                ty,
                indexed,
            });
        }
        Ok(schema)
    }

    /// Canonical signature, e.g. `"PairCreated(address,address,address,uint256)"`.
    pub fn signature(&self) -> String {
        let types: Vec<_> = self.params.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// The event topic (`topics[0]`) for this schema.
    pub fn topic(&self) -> B256 {
        event_topic(&self.signature())
    }

    /// The 4-byte function selector for this schema.
    pub fn selector(&self) -> [u8; 4] {
        function_selector(&self.signature())
    }

    fn data_types(&self) -> Vec<TypeTag> {
        self.params
            .iter()
            .filter(|p| !p.indexed)
            .map(|p| p.ty.clone())
            .collect()
    }

    /// Decode an event log: indexed parameters from `topics[1..]`,
    /// the rest from `data`.
    pub fn decode_log(&self, topics: &[B256], data: &[u8]) -> Result<DecodedRecord, DecodeError> {
        let mut data_values = decode_params(&self.data_types(), data)?.into_iter();
        let mut fields = Vec::with_capacity(self.params.len());
        let mut topic_idx = 1;

        for param in &self.params {
            let value = if param.indexed {
                let topic = topics.get(topic_idx).ok_or_else(|| DecodeError::MissingTopic {
                    index: topic_idx,
                    field: param.name.clone(),
                })?;
                topic_idx += 1;
                decode_topic(&param.ty, topic).map_err(|e| e.in_field(&param.name))?
            } else {
                data_values.next().ok_or_else(|| DecodeError::MissingField {
                    field: param.name.clone(),
                })?
            };
            fields.push((param.name.clone(), value));
        }
        Ok(DecodedRecord { fields })
    }

    /// Decode `data` as the full parameter tuple, ignoring `indexed` flags.
    pub fn decode_data(&self, data: &[u8]) -> Result<DecodedRecord, DecodeError> {
        let types: Vec<_> = self.params.iter().map(|p| p.ty.clone()).collect();
        let values = decode_params(&types, data)?;
        Ok(self.record(values))
    }

    /// Decode selector-prefixed call input whose arguments are this schema's
    /// parameters.
    pub fn decode_input(&self, input: &[u8]) -> Result<DecodedRecord, DecodeError> {
        self.decode_data(strip_selector(input)?)
    }

    /// Decode selector-prefixed call input whose single argument is a struct
    /// with this schema's parameters as members.
    pub fn decode_struct_input(&self, input: &[u8]) -> Result<DecodedRecord, DecodeError> {
        let types: Vec<_> = self.params.iter().map(|p| p.ty.clone()).collect();
        let mut values = decode_params(&[TypeTag::Tuple(types)], strip_selector(input)?)?;
        match values.pop() {
            Some(AbiValue::Tuple(inner)) => Ok(self.record(inner)),
            other => Err(DecodeError::TypeMismatch {
                field: self.name.clone(),
                expected: "tuple",
                got: other.map(|v| v.kind()).unwrap_or_default(),
            }),
        }
    }

    fn record(&self, values: Vec<AbiValue>) -> DecodedRecord {
        let fields = self
            .params
            .iter()
            .map(|p| p.name.clone())
            .zip(values)
            .collect();
        DecodedRecord { fields }
    }
}

fn strip_selector(input: &[u8]) -> Result<&[u8], DecodeError> {
    input
        .get(4..)
        .ok_or(DecodeError::MissingSelector { len: input.len() })
}

/// Decode a single 32-byte topic.
///
/// Dynamic types are stored as their keccak hash and cannot be recovered;
/// the hash is returned as `bytes32`.
fn decode_topic(ty: &TypeTag, topic: &B256) -> Result<AbiValue, DecodeError> {
    if ty.is_dynamic() || matches!(ty, TypeTag::Tuple(_)) {
        return Ok(AbiValue::FixedBytes(*topic, 32));
    }
    decode_static(ty, topic.as_slice(), 0)
}

fn split_params(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = body[start..].trim();
    if !last.is_empty() {
        parts.push(last);
    }
    parts
}

/// The result of applying a [`Schema`]: field name → value, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedRecord {
    fields: Vec<(String, AbiValue)>,
}

impl DecodedRecord {
    pub fn get(&self, name: &str) -> Option<&AbiValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AbiValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&AbiValue, DecodeError> {
        self.get(name).ok_or_else(|| DecodeError::MissingField {
            field: name.to_string(),
        })
    }

    fn mismatch(name: &str, expected: &'static str, got: &AbiValue) -> DecodeError {
        DecodeError::TypeMismatch {
            field: name.to_string(),
            expected,
            got: got.kind(),
        }
    }

    pub fn address(&self, name: &str) -> Result<Address, DecodeError> {
        match self.require(name)? {
            AbiValue::Address(a) => Ok(*a),
            other => Err(Self::mismatch(name, "address", other)),
        }
    }

    pub fn uint(&self, name: &str) -> Result<U256, DecodeError> {
        match self.require(name)? {
            AbiValue::Uint(v, _) => Ok(*v),
            other => Err(Self::mismatch(name, "uint", other)),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, DecodeError> {
        match self.require(name)? {
            AbiValue::String(s) => Ok(s),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    pub fn bytes(&self, name: &str) -> Result<&[u8], DecodeError> {
        match self.require(name)? {
            AbiValue::Bytes(b) => Ok(b),
            other => Err(Self::mismatch(name, "bytes", other)),
        }
    }

    pub fn word(&self, name: &str) -> Result<B256, DecodeError> {
        match self.require(name)? {
            AbiValue::FixedBytes(b, _) => Ok(*b),
            other => Err(Self::mismatch(name, "bytesN", other)),
        }
    }
}
