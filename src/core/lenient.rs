//! Tolerant field deserializers for generator-written JSON
//!
//! `#[serde(default)]` only covers absent keys. Generators also write
//! `null`, quoted numbers and the odd wrong type for scalar fields; a
//! single such field must not sink the whole document, so these read the
//! raw value and fall back to the field's default instead of erroring.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

type FieldResult<T, E> = std::result::Result<T, E>;

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `1.5`, `"1.5"`; anything else reads as `0.0`
pub fn lenient_f32<'de, D>(deserializer: D) -> FieldResult<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_number(&value).map_or(0.0, |n| n as f32))
}

/// Like `lenient_f32`, but unreadable values are absent rather than zero
pub fn lenient_opt_f32<'de, D>(deserializer: D) -> FieldResult<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_number(&value).map(|n| n as f32))
}

/// `true`, `"true"`, `"yes"`, `1`; `null` and anything unrecognised are false
pub fn lenient_bool<'de, D>(deserializer: D) -> FieldResult<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        _ => false,
    })
}

/// Text fields: `null` is empty and bare numbers or booleans are spelled out
pub fn lenient_string<'de, D>(deserializer: D) -> FieldResult<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::String(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected text, found {}", other))),
    }
}

/// Lists: `null` is the empty list
pub fn lenient_vec<'de, D, T>(deserializer: D) -> FieldResult<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `2`, `2.0` and `"2"` for integer indices
pub fn lenient_index<'de, D>(deserializer: D) -> FieldResult<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Null => Some(0.0),
        other => as_number(other),
    };
    match number {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(n.round() as usize),
        Some(_) => Ok(0),
        None => Err(D::Error::custom(format!(
            "expected a street index, found {}",
            value
        ))),
    }
}
