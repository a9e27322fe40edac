//! Purpose: Tagged value models for caller-facing and codec-facing data.
//! Exports: `Value`, `FlatValue`, and JSON boundary conversions.
//! Role: Replaces dynamic shape probing with exhaustive enums at the API edge.
//! Invariants: Serialization emits only text and sequences into `FlatValue`.
//! Invariants: Integer precision survives JSON round trips as decimal strings.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use num_bigint::BigInt;
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

/// A structured value conforming to a parameter's type tree.
///
/// `Null` models an absent argument (JSON `null`); serializing one fails with
/// `UndefinedArgument` rather than producing a flat value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(BigInt),
    Text(String),
    Seq(Vec<Value>),
    Record(BTreeMap<String, Value>),
}

impl Value {
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Record(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        )
    }

    /// Build a structured value from caller-supplied dynamic JSON.
    ///
    /// JSON numbers must be integral; precision-sensitive callers should pass
    /// decimal strings for integer-family parameters instead.
    pub fn from_json(value: &JsonValue) -> Result<Self, Error> {
        match value {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(flag) => Ok(Self::Bool(*flag)),
            JsonValue::Number(number) => {
                if let Some(signed) = number.as_i64() {
                    Ok(Self::Number(BigInt::from(signed)))
                } else if let Some(unsigned) = number.as_u64() {
                    Ok(Self::Number(BigInt::from(unsigned)))
                } else {
                    Err(Error::new(ErrorKind::TypeMismatch)
                        .with_message(format!("non-integer number `{number}`")))
                }
            }
            JsonValue::String(text) => Ok(Self::Text(text.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Seq),
            JsonValue::Object(fields) => fields
                .iter()
                .map(|(name, field)| Ok((name.clone(), Self::from_json(field)?)))
                .collect::<Result<BTreeMap<_, _>, Error>>()
                .map(Self::Record),
        }
    }

    /// Render as JSON; numbers become decimal strings to preserve precision.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(flag) => JsonValue::Bool(*flag),
            Self::Number(number) => JsonValue::String(number.to_str_radix(10)),
            Self::Text(text) => JsonValue::String(text.clone()),
            Self::Seq(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Record(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Self::Number(BigInt::from(number))
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Self::Number(BigInt::from(number))
    }
}

impl From<BigInt> for Value {
    fn from(number: BigInt) -> Self {
        Self::Number(number)
    }
}

/// The codec-facing representation: shape mirrors the type tree exactly, with
/// tuples reduced to positional sequences and numbers to decimal strings.
///
/// `Bool` never comes out of serialization; it exists because codecs may hand
/// back native booleans on decode, which pass through unchanged.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FlatValue {
    Bool(bool),
    Text(String),
    Seq(Vec<FlatValue>),
}

impl FlatValue {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Build a flat value from JSON, for the CLI `expand` path.
    ///
    /// Bare JSON numbers are accepted as their literal text form.
    pub fn from_json(value: &JsonValue) -> Result<Self, Error> {
        match value {
            JsonValue::Bool(flag) => Ok(Self::Bool(*flag)),
            JsonValue::Number(number) => Ok(Self::Text(number.to_string())),
            JsonValue::String(text) => Ok(Self::Text(text.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Seq),
            JsonValue::Null | JsonValue::Object(_) => Err(Error::new(ErrorKind::TypeMismatch)
                .with_message("flat values are booleans, strings, or arrays")),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(flag) => JsonValue::Bool(*flag),
            Self::Text(text) => JsonValue::String(text.clone()),
            Self::Seq(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}
