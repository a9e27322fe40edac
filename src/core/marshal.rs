//! Purpose: Recursive type-directed marshaling between structured and flat values.
//! Exports: `serialize`, `deserialize`.
//! Role: The marshaling engine; pairs parameter trees with values positionally.
//! Invariants: Flat shape mirrors the type tree; tuple order is schema order.
//! Invariants: Failures carry the parameter path they occurred at.
#![allow(clippy::result_large_err)]

use crate::core::error::{Error, ErrorKind};
use crate::core::schema::{Parameter, TypeExpr};
use crate::core::value::{FlatValue, Value};
use num_bigint::BigInt;
use std::collections::BTreeMap;

/// Serialize structured values against a parameter list, positionally.
///
/// Tuple fields are emitted in schema component order regardless of the order
/// the caller's record carries them in.
pub fn serialize(params: &[Parameter], values: &[Value]) -> Result<Vec<FlatValue>, Error> {
    if params.len() != values.len() {
        return Err(arity_error(params.len(), values.len()));
    }
    params
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (param, value))| {
            serialize_value(&param.ty, &param.components, value, &root_path(param, index))
        })
        .collect()
}

/// Deserialize flat codec values against a parameter list.
///
/// A single-parameter list yields the bare structured value; longer lists
/// yield a sequence index-aligned with the schema. The convention applies
/// identically to function inputs and outputs.
pub fn deserialize(params: &[Parameter], flats: &[FlatValue]) -> Result<Value, Error> {
    if params.len() != flats.len() {
        return Err(arity_error(params.len(), flats.len()));
    }
    let mut structured = Vec::with_capacity(params.len());
    for (index, (param, flat)) in params.iter().zip(flats).enumerate() {
        structured.push(deserialize_value(
            &param.ty,
            &param.components,
            flat,
            &root_path(param, index),
        )?);
    }
    if structured.len() == 1 {
        Ok(structured.remove(0))
    } else {
        Ok(Value::Seq(structured))
    }
}

fn serialize_value(
    ty: &TypeExpr,
    components: &[Parameter],
    value: &Value,
    path: &str,
) -> Result<FlatValue, Error> {
    if matches!(value, Value::Null) {
        return Err(Error::new(ErrorKind::UndefinedArgument)
            .with_message("argument is missing")
            .with_param(path));
    }

    if ty.is_array() {
        let Value::Seq(items) = value else {
            return Err(shape_error(ty, "a sequence", path));
        };
        let element = ty.element();
        let flats = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serialize_value(&element, components, item, &format!("{path}[{index}]"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(FlatValue::Seq(flats));
    }

    if ty.is_tuple() {
        let Value::Record(fields) = value else {
            return Err(shape_error(ty, "a record", path));
        };
        let mut flats = Vec::with_capacity(components.len());
        for component in components {
            let field_path = format!("{path}.{}", component.name);
            let field = fields.get(&component.name).ok_or_else(|| {
                Error::new(ErrorKind::MissingField)
                    .with_message("tuple field is missing")
                    .with_param(field_path.clone())
            })?;
            flats.push(serialize_value(
                &component.ty,
                &component.components,
                field,
                &field_path,
            )?);
        }
        return Ok(FlatValue::Seq(flats));
    }

    // Scalar: numbers become base-10 literals, everything else its canonical
    // string form. Type-specific validation is the codec's burden.
    match value {
        Value::Number(number) => Ok(FlatValue::Text(number.to_str_radix(10))),
        Value::Bool(flag) => Ok(FlatValue::Text(flag.to_string())),
        Value::Text(text) => Ok(FlatValue::Text(text.clone())),
        Value::Seq(_) | Value::Record(_) => Err(shape_error(ty, "a scalar", path)),
        Value::Null => Err(Error::new(ErrorKind::UndefinedArgument)
            .with_message("argument is missing")
            .with_param(path)),
    }
}

fn deserialize_value(
    ty: &TypeExpr,
    components: &[Parameter],
    flat: &FlatValue,
    path: &str,
) -> Result<Value, Error> {
    if ty.is_array() {
        let FlatValue::Seq(items) = flat else {
            return Err(shape_error(ty, "a sequence", path));
        };
        let element = ty.element();
        let values = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                deserialize_value(&element, components, item, &format!("{path}[{index}]"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Seq(values));
    }

    if ty.is_tuple() {
        // Positional sequence; field names are recovered from the schema.
        let FlatValue::Seq(items) = flat else {
            return Err(shape_error(ty, "a sequence", path));
        };
        if items.len() != components.len() {
            return Err(arity_error(components.len(), items.len()).with_param(path));
        }
        let mut fields = BTreeMap::new();
        for (component, item) in components.iter().zip(items) {
            let field_path = format!("{path}.{}", component.name);
            let field =
                deserialize_value(&component.ty, &component.components, item, &field_path)?;
            fields.insert(component.name.clone(), field);
        }
        return Ok(Value::Record(fields));
    }

    if ty.is_integer() {
        let FlatValue::Text(text) = flat else {
            return Err(shape_error(ty, "numeric text", path));
        };
        let number = parse_bigint(text).ok_or_else(|| {
            Error::new(ErrorKind::TypeMismatch)
                .with_message(format!("`{text}` is not numeric"))
                .with_param(path)
        })?;
        return Ok(Value::Number(number));
    }

    // Other scalars pass through unchanged.
    match flat {
        FlatValue::Text(text) => Ok(Value::Text(text.clone())),
        FlatValue::Bool(flag) => Ok(Value::Bool(*flag)),
        FlatValue::Seq(_) => Err(shape_error(ty, "a scalar", path)),
    }
}

/// Decimal, or hex with a `0x` prefix.
fn parse_bigint(text: &str) -> Option<BigInt> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        BigInt::parse_bytes(hex.as_bytes(), 16)
    } else {
        BigInt::parse_bytes(text.as_bytes(), 10)
    }
}

fn root_path(param: &Parameter, index: usize) -> String {
    if param.name.is_empty() {
        format!("arg{index}")
    } else {
        param.name.clone()
    }
}

fn shape_error(ty: &TypeExpr, expected: &str, path: &str) -> Error {
    Error::new(ErrorKind::TypeMismatch)
        .with_message(format!("`{ty}` expects {expected}"))
        .with_param(path)
}

fn arity_error(expected: usize, got: usize) -> Error {
    Error::new(ErrorKind::ArityMismatch)
        .with_message(format!("expected {expected} values, got {got}"))
}
