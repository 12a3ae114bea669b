//! Per-resource request builders.
//!
//! # Design
//! Each resource holds the `Transport` snapshot it was created from and only
//! assembles paths, query strings and bodies. Params and results are opaque
//! JSON; decoding into concrete record types is left to callers.

mod assistants;
mod crons;
mod mcp;
mod runs;
mod store;
mod threads;

pub use assistants::Assistants;
pub use crons::Crons;
pub use mcp::Mcp;
pub use runs::Runs;
pub use store::Store;
pub use threads::Threads;

use serde_json::{json, Value};

use crate::error::ApiError;

/// A single-record response; an empty body becomes `Value::Null`.
fn record(response: Option<Value>) -> Value {
    response.unwrap_or(Value::Null)
}

/// A list response. An empty body is an empty list.
fn records(response: Option<Value>) -> Result<Vec<Value>, ApiError> {
    match response {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ApiError::generic(format!(
            "Expected a JSON array response, got: {other}"
        ))),
    }
}

/// Params for one page of a list call.
fn page_params(params: &Value, limit: u32, offset: u32) -> Value {
    let mut params = match params {
        Value::Object(map) => map.clone(),
        _ => Default::default(),
    };
    params.insert("limit".into(), json!(limit));
    params.insert("offset".into(), json!(offset));
    Value::Object(params)
}
