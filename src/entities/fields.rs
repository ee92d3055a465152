// Typed readers for JSON request payloads.
//
// Every mutable attribute goes through one of these, so a wrong JSON type
// becomes a MalformedInput instead of a silently coerced value.

use crate::{Error, Result};
use serde_json::{Map, Value};

pub type Payload = Map<String, Value>;

fn invalid(key: &str, expected: &str) -> Error {
    Error::MalformedInput(format!("Invalid {}: expected {}", key, expected))
}

/// Required string on creation: absence is reported as "Missing <key>".
pub fn required_string(payload: &Payload, key: &str) -> Result<String> {
    match payload.get(key) {
        None => Err(Error::MalformedInput(format!("Missing {}", key))),
        Some(value) => string(key, value),
    }
}

pub fn optional_string(payload: &Payload, key: &str) -> Result<Option<String>> {
    payload.get(key).map(|value| string(key, value)).transpose()
}

pub fn string(key: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(key, "a string"))
}

pub fn count(key: &str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(key, "a non-negative integer"))
}

pub fn float(key: &str, value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| invalid(key, "a number"))
}

pub fn id_list(key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| invalid(key, "a list of ids"))?;

    let mut ids: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let id = string(key, item)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
