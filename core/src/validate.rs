//! Argument checks run before a request is built.

use serde_json::{Map, Value};

use crate::error::ApiError;

/// Reject blank identifiers. `what` names the id in the message, e.g.
/// `"Thread ID"`.
pub fn require_id(what: &str, id: &str) -> Result<(), ApiError> {
    if id.trim().is_empty() {
        return Err(ApiError::validation(format!("{what} cannot be nil or empty")));
    }
    Ok(())
}

/// A cron schedule must have 5 or 6 whitespace-separated fields.
pub fn cron_schedule(schedule: &str) -> Result<(), ApiError> {
    if schedule.trim().is_empty() {
        return Err(ApiError::validation("Cron schedule cannot be nil or empty"));
    }
    let parts = schedule.split_whitespace().count();
    if parts != 5 && parts != 6 {
        return Err(ApiError::validation(format!(
            "Invalid cron schedule format. Expected 5 or 6 parts, got {parts}"
        )));
    }
    Ok(())
}

/// `limit`, when present, must be a positive integer and `offset` a
/// non-negative one.
pub fn pagination_params(params: &Value) -> Result<(), ApiError> {
    if let Some(limit) = params.get("limit").filter(|v| !v.is_null()) {
        if !limit.as_u64().is_some_and(|n| n >= 1) {
            return Err(ApiError::validation("Limit must be a positive integer"));
        }
    }
    if let Some(offset) = params.get("offset").filter(|v| !v.is_null()) {
        if offset.as_u64().is_none() {
            return Err(ApiError::validation("Offset must be a non-negative integer"));
        }
    }
    Ok(())
}

/// `metadata`, when present, must be a JSON object.
pub fn metadata(params: &Value) -> Result<(), ApiError> {
    match params.get("metadata") {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err(ApiError::validation("Metadata must be an object")),
    }
}

/// Turn caller params into a request object: fill `defaults` for keys that are
/// missing or null, then drop every remaining null.
///
/// Non-object params are treated as an empty object.
pub(crate) fn with_defaults(params: Value, defaults: &[(&str, Value)]) -> Value {
    let mut map = match params {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, default) in defaults {
        let missing = map.get(*key).map_or(true, Value::is_null);
        if missing {
            map.insert((*key).to_string(), default.clone());
        }
    }
    map.retain(|_, v| !v.is_null());
    Value::Object(map)
}
