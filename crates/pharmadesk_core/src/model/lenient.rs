//! Field deserializers for numbers written loosely by other clients.
//!
//! Backend rows leave blank form fields as `null`; browser-written records
//! keep form input as strings (`"amount": "2"`). Both decode here instead
//! of failing the whole record.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::custom("number out of range")),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got `{text}`")))
        }
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

fn count<E: serde::de::Error>(value: f64) -> Result<u32, E> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(E::custom(format!("expected a whole non-negative count, got {value}")))
    }
}

/// Amount or price; blank reads as `0`.
pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.unwrap_or(0.0))
}

pub fn optional_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer)
}

/// Quantity or stock level; blank reads as `0`.
pub fn u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_u32(deserializer)?.unwrap_or(0))
}

pub fn optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer)?.map(count).transpose()
}

/// Flag where a blank means `true` (active rows).
pub fn bool_or_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}
