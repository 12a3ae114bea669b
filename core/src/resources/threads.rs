use std::sync::Arc;

use serde_json::{json, Value};

use super::{page_params, record, records};
use crate::error::ApiError;
use crate::paginator::Paginator;
use crate::transport::Transport;
use crate::validate::{self, with_defaults};

#[derive(Debug, Clone)]
pub struct Threads {
    transport: Arc<Transport>,
}

impl Threads {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn create(&self, params: Value) -> Result<Value, ApiError> {
        validate::metadata(&params)?;
        let body = with_defaults(params, &[("metadata", json!({}))]);
        self.transport.post("/threads", body).map(record)
    }

    pub fn find(&self, thread_id: &str) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        self.transport
            .get(&format!("/threads/{thread_id}"), &Value::Null)
            .map(record)
    }

    pub fn update(&self, thread_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        validate::metadata(&params)?;
        let body = with_defaults(params, &[("metadata", json!({}))]);
        self.transport
            .patch(&format!("/threads/{thread_id}"), body)
            .map(record)
    }

    pub fn delete(&self, thread_id: &str) -> Result<(), ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        self.transport.delete(&format!("/threads/{thread_id}"))?;
        Ok(())
    }

    pub fn search(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::pagination_params(&params)?;
        let body = with_defaults(
            params,
            &[
                ("metadata", json!({})),
                ("values", json!({})),
                ("limit", json!(10)),
                ("offset", json!(0)),
            ],
        );
        records(self.transport.post("/threads/search", body)?)
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

    pub fn state(&self, thread_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        let query = with_defaults(params, &[("subgraphs", json!(false))]);
        self.transport
            .get(&format!("/threads/{thread_id}/state"), &query)
            .map(record)
    }

    pub fn update_state(&self, thread_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        let body = with_defaults(params, &[]);
        self.transport
            .post(&format!("/threads/{thread_id}/state"), body)
            .map(record)
    }

    pub fn history(&self, thread_id: &str, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        let query = with_defaults(params, &[("limit", json!(10))]);
        records(
            self.transport
                .get(&format!("/threads/{thread_id}/history"), &query)?,
        )
    }

    pub fn copy(&self, thread_id: &str) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        self.transport
            .post(&format!("/threads/{thread_id}/copy"), json!({}))
            .map(record)
    }
}
