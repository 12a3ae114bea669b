//! Plain-data HTTP types and response interpretation.
//!
//! # Design
//! `RequestSpec` describes one call and `HttpResponse` one fully read
//! response. Turning a response into a JSON value or an `ApiError` is a pure
//! function of these types, so status mapping and message extraction are
//! tested without a network.

use serde_json::Value;

use crate::error::{ApiError, ErrorKind};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// One logical request against `base_url + path`.
///
/// `query` is only sent for GET. `body` is sent as JSON for POST, PATCH and
/// PUT (an empty object when unset) and for DELETE only when set.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append every entry of a JSON object as a query pair. Strings are sent
    /// as-is, other values as their compact JSON text; nulls are skipped.
    pub fn with_query_object(mut self, params: &Value) -> Self {
        if let Value::Object(map) = params {
            for (key, value) in map {
                match value {
                    Value::Null => {}
                    Value::String(s) => self.query.push((key.clone(), s.clone())),
                    other => self.query.push((key.clone(), other.to_string())),
                }
            }
        }
        self
    }

    /// Serialized body for the wire, `None` when the method sends no body.
    pub(crate) fn body_bytes(&self) -> Result<Option<Vec<u8>>, ApiError> {
        let body = match (self.method, &self.body) {
            (HttpMethod::Get, _) | (HttpMethod::Delete, None) => return Ok(None),
            (_, Some(body)) => body.clone(),
            (_, None) => Value::Object(Default::default()),
        };
        serde_json::to_vec(&body)
            .map(Some)
            .map_err(|e| ApiError::generic(format!("Failed to serialize request body: {e}")).with_source(e))
    }
}

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Decode a 2xx body or map a failure status to an `ApiError`.
    ///
    /// An empty 2xx body (e.g. 204) yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<Value>, ApiError> {
        if (200..300).contains(&self.status) {
            if self.body.trim().is_empty() {
                return Ok(None);
            }
            return serde_json::from_str(&self.body).map(Some).map_err(|e| {
                ApiError::new(
                    ErrorKind::Generic,
                    format!("Failed to parse response body: {e}"),
                    Some(self.status),
                )
                .with_source(e)
            });
        }
        Err(self.into_error())
    }

    /// Map a non-2xx response to its `ApiError`.
    pub fn into_error(self) -> ApiError {
        ApiError::from_status(self.status, extract_error_message(&self.body))
    }
}

/// Pick the human-readable message out of an error body.
///
/// Prefers a non-null `error` field, then `message`, then the whole body. A
/// body that is not JSON is returned verbatim.
pub fn extract_error_message(body: &str) -> String {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return body.to_string(),
    };
    let field = |name: &str| {
        parsed
            .get(name)
            .filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
            .cloned()
    };
    match field("error").or_else(|| field("message")) {
        Some(value) => render(&value),
        None => render(&parsed),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
