use std::sync::Arc;

use serde_json::{json, Value};

use super::{page_params, record, records};
use crate::error::ApiError;
use crate::paginator::Paginator;
use crate::transport::Transport;
use crate::validate::{self, with_defaults};

#[derive(Debug, Clone)]
pub struct Assistants {
    transport: Arc<Transport>,
}

impl Assistants {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn create(&self, params: Value) -> Result<Value, ApiError> {
        validate::metadata(&params)?;
        let body = with_defaults(params, &[("config", json!({})), ("metadata", json!({}))]);
        self.transport.post("/assistants", body).map(record)
    }

    pub fn find(&self, assistant_id: &str) -> Result<Value, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        self.transport
            .get(&format!("/assistants/{assistant_id}"), &Value::Null)
            .map(record)
    }

    pub fn update(&self, assistant_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        let body = with_defaults(params, &[]);
        self.transport
            .patch(&format!("/assistants/{assistant_id}"), body)
            .map(record)
    }

    pub fn delete(&self, assistant_id: &str) -> Result<(), ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        self.transport.delete(&format!("/assistants/{assistant_id}"))?;
        Ok(())
    }

    pub fn search(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::pagination_params(&params)?;
        let body = with_defaults(
            params,
            &[("metadata", json!({})), ("limit", json!(10)), ("offset", json!(0))],
        );
        records(self.transport.post("/assistants/search", body)?)
    }

    /// Lazily page through `search` results.
    pub fn search_all(
        &self,
        params: Value,
    ) -> Paginator<impl FnMut(u32, u32) -> Result<Vec<Value>, ApiError> + '_> {
        Paginator::new(move |limit: u32, offset: u32| {
            self.search(page_params(&params, limit, offset))
        })
    }

    pub fn graph(&self, assistant_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        let query = with_defaults(params, &[("xray", json!(false))]);
        self.transport
            .get(&format!("/assistants/{assistant_id}/graph"), &query)
            .map(record)
    }

    pub fn subgraphs(&self, assistant_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        let query = with_defaults(params, &[("recurse", json!(false))]);
        self.transport
            .get(&format!("/assistants/{assistant_id}/subgraphs"), &query)
            .map(record)
    }

    pub fn schemas(&self, assistant_id: &str) -> Result<Value, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        self.transport
            .get(&format!("/assistants/{assistant_id}/schemas"), &Value::Null)
            .map(record)
    }

    pub fn versions(&self, assistant_id: &str) -> Result<Vec<Value>, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        records(
            self.transport
                .post(&format!("/assistants/{assistant_id}/versions"), json!({}))?,
        )
    }

    pub fn set_latest_version(&self, assistant_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Assistant ID", assistant_id)?;
        let body = with_defaults(params, &[]);
        self.transport
            .post(&format!("/assistants/{assistant_id}/latest"), body)
            .map(record)
    }
}
