//! Tolerant field decoders for upstream JSON.
//!
//! The detection service and the intake form are loosely typed: numbers may
//! arrive as strings, optional fields as `null`, and boxes with missing
//! coordinates. Each decoder maps anything it cannot use to `None` instead of
//! failing the whole payload. Use with `#[serde(default, deserialize_with = ...)]`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::detection::BoundingBox;

/// Finite number from a JSON number or numeric string.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_finite_f64))
}

/// Non-negative whole number. Fractions are truncated.
pub fn count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(as_count))
}

/// Non-empty string; numbers are stringified, other shapes dropped.
pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// `[x1, y1, x2, y2]`; short, non-numeric, or inverted boxes are dropped.
pub fn bbox<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(None);
    };
    let coords: Option<Vec<f64>> = items.iter().map(as_finite_f64).collect();
    Ok(coords.and_then(|c| BoundingBox::from_coords(&c)))
}

fn as_finite_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let n = as_finite_f64(value)?;
    (n >= 0.0).then(|| n.trunc() as u64)
}
