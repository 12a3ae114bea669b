use std::sync::Arc;

use serde_json::{json, Value};

use super::record;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::validate::{self, with_defaults};

/// Tool-calling endpoints. Payloads pass through untouched.
#[derive(Debug, Clone)]
pub struct Mcp {
    transport: Arc<Transport>,
}

impl Mcp {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn call_tool(&self, params: Value) -> Result<Value, ApiError> {
        let body = with_defaults(params, &[("arguments", json!({}))]);
        self.transport.post("/mcp/tools/call", body).map(record)
    }

    pub fn list_tools(&self) -> Result<Value, ApiError> {
        self.transport.get("/mcp/tools", &Value::Null).map(record)
    }

    pub fn get_tool(&self, tool_name: &str) -> Result<Value, ApiError> {
        validate::require_id("Tool name", tool_name)?;
        self.transport
            .get(&format!("/mcp/tools/{tool_name}"), &Value::Null)
            .map(record)
    }

    pub fn list_resources(&self) -> Result<Value, ApiError> {
        self.transport.get("/mcp/resources", &Value::Null).map(record)
    }

    pub fn get_resource(&self, params: Value) -> Result<Value, ApiError> {
        let query = with_defaults(params, &[]);
        self.transport.get("/mcp/resources/get", &query).map(record)
    }

    pub fn read_resource(&self, params: Value) -> Result<Value, ApiError> {
        let query = with_defaults(params, &[]);
        self.transport.get("/mcp/resources/read", &query).map(record)
    }

    pub fn list_prompts(&self) -> Result<Value, ApiError> {
        self.transport.get("/mcp/prompts", &Value::Null).map(record)
    }

    pub fn get_prompt(&self, params: Value) -> Result<Value, ApiError> {
        let body = with_defaults(params, &[("arguments", json!({}))]);
        self.transport.post("/mcp/prompts/get", body).map(record)
    }

    pub fn complete_prompt(&self, params: Value) -> Result<Value, ApiError> {
        let body = with_defaults(params, &[("arguments", json!({}))]);
        self.transport.post("/mcp/prompts/complete", body).map(record)
    }

    pub fn send_log(&self, params: Value) -> Result<Value, ApiError> {
        self.transport
            .post("/mcp/logging/log", with_defaults(params, &[]))
            .map(record)
    }
}
