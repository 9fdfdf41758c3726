//! Locating a collection inside stored client data.
//!
//! Client data comes back from the report service either as one object or as a list of
//! objects, newest last. A report may also hold several results, in which case the tracked
//! items collection is nested under its own key.

use crate::{TrackingError, TrackingResult};
use serde_json::Value;

/// The newest report in `client_data`.
///
/// # Errors
///
/// Returns [`TrackingError::InvalidClientData`] unless `client_data` is an object or a
/// non-empty array whose last element is an object.
pub fn latest_report(client_data: &Value) -> TrackingResult<&Value> {
    let report = match client_data {
        Value::Array(reports) => reports.last(),
        other => Some(other),
    };
    match report {
        Some(report) if report.is_object() => Ok(report),
        _ => Err(TrackingError::InvalidClientData(format!(
            "expected an object or an array of objects, found {}",
            describe(client_data)
        ))),
    }
}

/// The collection object within `report`: the object under `key` when its `type` is
/// `collection_type`, otherwise the report itself.
pub fn nested_collection<'a>(report: &'a Value, key: &str, collection_type: &str) -> &'a Value {
    match report.get(key) {
        Some(nested) if nested.get("type").and_then(Value::as_str) == Some(collection_type) => {
            nested
        }
        _ => report,
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(items) if items.is_empty() => "an empty array",
        Value::Array(_) => "an array ending in a non-object",
        Value::Object(_) => "an object",
    }
}
