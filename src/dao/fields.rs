//! Serde helpers for the shapes the row store uses for non-scalar fields.
//!
//! With human-readable field names enabled, link fields come back as
//! `[{"id": 3, "value": "Falcons"}]`, single selects as
//! `{"id": 1, "value": "finished", "color": "green"}` and numbers frequently
//! as strings. Rows are written by hand in the store's UI, so every helper
//! degrades to `None` instead of rejecting the row where it can.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, de::Error};
use serde_json::Value;

use crate::dao::models::RowId;

/// Decode a link field into the id of its first linked row.
pub fn link<'de, D>(deserializer: D) -> Result<Option<RowId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    link_id(&raw).map_err(D::Error::custom)
}

/// Decode a row's own primary key, accepting the same shapes as [`link`].
pub fn id<'de, D>(deserializer: D) -> Result<RowId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    link_id(&raw)
        .map_err(D::Error::custom)?
        .ok_or_else(|| D::Error::custom("empty row id"))
}

/// Shared by [`link`], [`id`] and [`crate::dao::models::row_id`].
pub(crate) fn link_id(value: &Value) -> Result<Option<RowId>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("invalid row id {number}")),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| format!("invalid row id `{text}`")),
        Value::Array(items) => items.first().map_or(Ok(None), link_id),
        Value::Object(map) => map.get("id").map_or(Ok(None), link_id),
        other => Err(format!("unexpected link value {other}")),
    }
}

/// Decode a single select (plain label or option object) and parse its label.
///
/// Labels that do not parse decode as `None`.
pub fn select<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(select_label(&raw).and_then(|label| label.parse().ok()))
}

fn select_label(value: &Value) -> Option<&str> {
    match value {
        Value::String(text) => Some(text.trim()).filter(|text| !text.is_empty()),
        Value::Object(map) => map.get("value").and_then(select_label),
        Value::Array(items) => items.first().and_then(select_label),
        _ => None,
    }
}

/// Decode an integer that may be sent as a JSON number or a numeric string.
pub fn number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value.round() as i64))
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid number {number}"))),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(|value| Some(value.round() as i64))
            .map_err(|_| D::Error::custom(format!("invalid number `{text}`"))),
        other => Err(D::Error::custom(format!("unexpected number value {other}"))),
    }
}

/// Decode a text field, mapping `null` to an empty string.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!("unexpected text value {other}"))),
    }
}
