//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use enum_as_inner::EnumAsInner;
use serde::{Deserialize, Serialize};

// Open key/value mapping used by custom match conditions and set actions.
pub type Mapping = BTreeMap<String, Value>;

// Structured value held by a `Mapping`.
//
// JSON `null` has no representation here, so a mapping carrying one fails to
// deserialize.
#[derive(Clone, Debug, EnumAsInner, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Mapping),
}

// Reasons why a mapping is not well-formed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MappingError {
    // The top-level value is not a key/value mapping.
    NotAMapping,
    // A key (at the given dotted path) is the empty string.
    EmptyKey(String),
    // A value (at the given dotted path) is null.
    NullValue(String),
    // A floating-point value (at the given dotted path) is not finite.
    NonFiniteNumber(String),
}

// ===== impl Value =====

impl Value {
    // Returns the value as an unsigned 32-bit integer, accepting numeric
    // strings.
    pub fn to_u32(&self) -> Option<u32> {
        match self {
            Value::Integer(value) => u32::try_from(*value).ok(),
            Value::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    // Flattens the value into a list of words.
    //
    // Lists are flattened one level, strings are split on whitespace and
    // scalars yield a single word.
    pub fn words(&self) -> Vec<String> {
        match self {
            Value::List(values) => {
                values.iter().flat_map(|value| value.words()).collect()
            }
            Value::String(value) => {
                value.split_whitespace().map(str::to_owned).collect()
            }
            Value::Integer(value) => vec![value.to_string()],
            Value::Float(value) => vec![value.to_string()],
            Value::Bool(value) => vec![value.to_string()],
            Value::Map(_) => vec![],
        }
    }

    // Returns whether two values are equal, comparing numbers by value and
    // strings against numbers by their textual form.
    pub fn loosely_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b))
            | (Value::Float(b), Value::Integer(a)) => (*a as f64) == *b,
            (Value::String(a), Value::Integer(b))
            | (Value::Integer(b), Value::String(a)) => {
                a.trim() == b.to_string()
            }
            (Value::String(a), Value::String(b)) => a.trim() == b.trim(),
            _ => self == other,
        }
    }

    fn check(&self, path: &str) -> Result<(), MappingError> {
        match self {
            Value::Float(value) if !value.is_finite() => {
                Err(MappingError::NonFiniteNumber(path.to_owned()))
            }
            Value::List(values) => {
                for (idx, value) in values.iter().enumerate() {
                    value.check(&format!("{path}[{idx}]"))?;
                }
                Ok(())
            }
            Value::Map(mapping) => check_mapping(mapping, path),
            _ => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::Integer(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Value {
        Value::Integer(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::Bool(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Value {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}

// ===== impl MappingError =====

impl std::fmt::Display for MappingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingError::NotAMapping => {
                write!(f, "value is not a key/value mapping")
            }
            MappingError::EmptyKey(path) if path.is_empty() => {
                write!(f, "empty key")
            }
            MappingError::EmptyKey(path) => {
                write!(f, "empty key under {path:?}")
            }
            MappingError::NullValue(path) => {
                write!(f, "null value at {path:?}")
            }
            MappingError::NonFiniteNumber(path) => {
                write!(f, "non-finite number at {path:?}")
            }
        }
    }
}

impl std::error::Error for MappingError {}

// ===== global functions =====

// Checks that every key in the mapping (nested mappings included) is a
// non-empty string and that every number is finite.
pub fn check_mapping(
    mapping: &Mapping,
    path: &str,
) -> Result<(), MappingError> {
    for (key, value) in mapping {
        if key.is_empty() {
            return Err(MappingError::EmptyKey(path.to_owned()));
        }
        let path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        value.check(&path)?;
    }

    Ok(())
}

// Converts loosely-typed JSON data into a checked mapping.
//
// `null` is accepted at the top level and yields an empty mapping, matching
// an unset field.
pub fn parse_mapping(
    json: &serde_json::Value,
) -> Result<Mapping, MappingError> {
    match json {
        serde_json::Value::Null => Ok(Mapping::new()),
        serde_json::Value::Object(object) => {
            let mut mapping = Mapping::new();
            for (key, value) in object {
                if key.is_empty() {
                    return Err(MappingError::EmptyKey(String::new()));
                }
                mapping.insert(key.clone(), parse_value(value, key)?);
            }
            Ok(mapping)
        }
        _ => Err(MappingError::NotAMapping),
    }
}

// ===== helper functions =====

fn parse_value(
    json: &serde_json::Value,
    path: &str,
) -> Result<Value, MappingError> {
    let value = match json {
        serde_json::Value::Null => {
            return Err(MappingError::NullValue(path.to_owned()));
        }
        serde_json::Value::Bool(value) => Value::Bool(*value),
        serde_json::Value::Number(number) => match number.as_i64() {
            Some(value) => Value::Integer(value),
            None => match number.as_f64() {
                Some(value) if value.is_finite() => Value::Float(value),
                _ => {
                    return Err(MappingError::NonFiniteNumber(
                        path.to_owned(),
                    ));
                }
            },
        },
        serde_json::Value::String(value) => Value::String(value.clone()),
        serde_json::Value::Array(values) => Value::List(
            values
                .iter()
                .enumerate()
                .map(|(idx, value)| {
                    parse_value(value, &format!("{path}[{idx}]"))
                })
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(object) => {
            let mut mapping = Mapping::new();
            for (key, value) in object {
                if key.is_empty() {
                    return Err(MappingError::EmptyKey(path.to_owned()));
                }
                let path = format!("{path}.{key}");
                mapping.insert(key.clone(), parse_value(value, &path)?);
            }
            Value::Map(mapping)
        }
    };

    Ok(value)
}

// ===== unit tests =====
