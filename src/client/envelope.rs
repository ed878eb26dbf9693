//! Response envelope normalization
//!
//! The resource API is not consistent about where it puts rows:
//! `{data: {data: [...]}}`, `{data: {items: [...]}}`, `{data: [...]}`,
//! `{items: [...]}` and a bare array all occur. This is the one place that
//! knows about those shapes; everything past it sees a `RowSet`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    pub items: Vec<Value>,
    /// Total matching rows server-side; falls back to `items.len()`
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

fn as_total(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Locate the row array and total in a list response
pub fn unwrap_list(payload: Value) -> ApiResult<RowSet> {
    let data = payload.get("data");

    let items = data
        .and_then(|d| d.get("data"))
        .and_then(Value::as_array)
        .or_else(|| data.and_then(|d| d.get("items")).and_then(Value::as_array))
        .or_else(|| data.and_then(Value::as_array))
        .or_else(|| payload.get("items").and_then(Value::as_array))
        .or_else(|| payload.as_array())
        .cloned()
        .ok_or_else(|| ApiError::MalformedResponse("list response has no row array".to_string()))?;

    let meta = data
        .and_then(|d| d.get("meta"))
        .or_else(|| payload.get("meta"))
        .filter(|m| m.is_object())
        .cloned();

    let total = as_total(meta.as_ref().and_then(|m| m.get("total")))
        .or_else(|| as_total(payload.get("total")))
        .or_else(|| as_total(data.and_then(|d| d.get("total"))))
        .unwrap_or(items.len() as u64);

    Ok(RowSet { items, total, meta })
}

/// Locate the record object in a detail response: `{data: {...}}` or the
/// bare object
pub fn unwrap_detail(payload: Value) -> ApiResult<Value> {
    match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Object(_)) => Ok(data),
            Some(other) => {
                map.insert("data".to_string(), other);
                Ok(Value::Object(map))
            }
            None => Ok(Value::Object(map)),
        },
        other => Err(ApiError::MalformedResponse(format!(
            "detail response is not an object: {}",
            other
        ))),
    }
}
