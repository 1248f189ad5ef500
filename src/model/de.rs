//! Lenient deserializers for backend payloads.
//!
//! The backend is not consistent about JSON types: ids arrive as strings or
//! numbers, money as decimal strings, and optional text as `null`. These
//! helpers are used through `#[serde(deserialize_with = ...)]`.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `null` and missing become `""`.
pub fn nullable_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// String, number or null into `Option<String>`.
pub fn string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected string or number, got {other}"))),
    }
}

/// Number or numeric string into `f64`; null and missing become `0.0`.
pub fn amount<'de, D>(d: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("amount out of range")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid amount {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("invalid amount {other}"))),
    }
}

/// Integer or integer string; null and missing become `0`.
pub fn count<'de, D>(d: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| D::Error::custom(format!("invalid count {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map_err(|_| D::Error::custom(format!("invalid count {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("invalid count {other}"))),
    }
}

/// Closed enumerations: an unknown or missing value becomes `None` instead
/// of failing the whole list.
pub fn lenient_enum<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(d)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Accepts a bare array or any of the usual envelopes (`data`, `items`, `content`).
pub fn unwrap_list(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in ["data", "items", "content"] {
                if map.get(key).is_some_and(Value::is_array) {
                    return map.remove(key).unwrap_or_default();
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "string_or_number")]
        id: Option<String>,
        #[serde(default, deserialize_with = "amount")]
        cost: f64,
        #[serde(default, deserialize_with = "nullable_string")]
        note: String,
        #[serde(default, deserialize_with = "count")]
        qty: u32,
    }

    #[test]
    fn mixed_json_types_are_accepted() {
        let p: Sample =
            serde_json::from_str(r#"{"id": 7, "cost": "12.50", "note": null, "qty": "3"}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("7"));
        assert_eq!(p.cost, 12.5);
        assert_eq!(p.note, "");
        assert_eq!(p.qty, 3);

        let p: Sample = serde_json::from_str(r#"{"id": "a1", "cost": 3}"#).unwrap();
        assert_eq!(p.id.as_deref(), Some("a1"));
        assert_eq!(p.cost, 3.0);
        assert_eq!(p.qty, 0);
    }

    #[test]
    fn envelopes_are_unwrapped() {
        let v = unwrap_list(serde_json::json!({"data": [1, 2]}));
        assert_eq!(v, serde_json::json!([1, 2]));
        let v = unwrap_list(serde_json::json!([3]));
        assert_eq!(v, serde_json::json!([3]));
    }
}
