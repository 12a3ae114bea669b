use std::sync::Arc;

use serde_json::{json, Value};

use super::{page_params, record, records};
use crate::error::ApiError;
use crate::http::RequestSpec;
use crate::paginator::Paginator;
use crate::stream::{EventStream, StreamEvent};
use crate::transport::Transport;
use crate::validate::{self, with_defaults};

#[derive(Debug, Clone)]
pub struct Runs {
    transport: Arc<Transport>,
}

impl Runs {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn create(&self, thread_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        let body = with_defaults(params, &[]);
        self.transport
            .post(&format!("/threads/{thread_id}/runs"), body)
            .map(record)
    }

    /// Start a run on a thread and deliver its events to `on_event`.
    pub fn stream<F>(&self, thread_id: &str, params: Value, on_event: F) -> Result<(), ApiError>
    where
        F: FnMut(StreamEvent),
    {
        validate::require_id("Thread ID", thread_id)?;
        let spec = RequestSpec::post(format!("/threads/{thread_id}/runs/stream"))
            .with_body(stream_body(params));
        self.transport.stream(&spec, on_event)
    }

    /// Like `stream`, but hands back the event iterator.
    pub fn open_stream(&self, thread_id: &str, params: Value) -> Result<EventStream, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        let spec = RequestSpec::post(format!("/threads/{thread_id}/runs/stream"))
            .with_body(stream_body(params));
        self.transport.open_stream(&spec)
    }

    pub fn wait(&self, thread_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        let body = with_defaults(params, &[]);
        self.transport
            .post(&format!("/threads/{thread_id}/runs/wait"), body)
            .map(record)
    }

    pub fn find(&self, thread_id: &str, run_id: &str) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        validate::require_id("Run ID", run_id)?;
        self.transport
            .get(&format!("/threads/{thread_id}/runs/{run_id}"), &Value::Null)
            .map(record)
    }

    pub fn list(&self, thread_id: &str, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        validate::pagination_params(&params)?;
        let query = with_defaults(params, &[("limit", json!(10)), ("offset", json!(0))]);
        records(
            self.transport
                .get(&format!("/threads/{thread_id}/runs"), &query)?,
        )
    }

    /// Lazily page through the runs of a thread.
    pub fn list_all<'a>(
        &'a self,
        thread_id: &'a str,
        params: Value,
    ) -> Paginator<impl FnMut(u32, u32) -> Result<Vec<Value>, ApiError> + 'a> {
        Paginator::new(move |limit: u32, offset: u32| {
            self.list(thread_id, page_params(&params, limit, offset))
        })
    }

    pub fn cancel(&self, thread_id: &str, run_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        validate::require_id("Run ID", run_id)?;
        let body = with_defaults(params, &[("wait", json!(false)), ("action", json!("interrupt"))]);
        self.transport
            .post(&format!("/threads/{thread_id}/runs/{run_id}/cancel"), body)
            .map(record)
    }

    pub fn join(&self, thread_id: &str, run_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        validate::require_id("Run ID", run_id)?;
        let query = with_defaults(params, &[("cancel_on_disconnect", json!(false))]);
        self.transport
            .get(&format!("/threads/{thread_id}/runs/{run_id}/join"), &query)
            .map(record)
    }

    /// Attach to the event stream of a run that is already executing.
    pub fn join_stream<F>(&self, thread_id: &str, run_id: &str, on_event: F) -> Result<(), ApiError>
    where
        F: FnMut(StreamEvent),
    {
        validate::require_id("Thread ID", thread_id)?;
        validate::require_id("Run ID", run_id)?;
        let spec = RequestSpec::post(format!("/threads/{thread_id}/runs/{run_id}/stream"));
        self.transport.stream(&spec, on_event)
    }

    pub fn delete(&self, thread_id: &str, run_id: &str) -> Result<(), ApiError> {
        validate::require_id("Thread ID", thread_id)?;
        validate::require_id("Run ID", run_id)?;
        self.transport
            .delete(&format!("/threads/{thread_id}/runs/{run_id}"))?;
        Ok(())
    }

    pub fn create_stateless(&self, params: Value) -> Result<Value, ApiError> {
        self.transport
            .post("/runs", with_defaults(params, &[]))
            .map(record)
    }

    pub fn stream_stateless<F>(&self, params: Value, on_event: F) -> Result<(), ApiError>
    where
        F: FnMut(StreamEvent),
    {
        let spec = RequestSpec::post("/runs/stream").with_body(stream_body(params));
        self.transport.stream(&spec, on_event)
    }

    pub fn wait_stateless(&self, params: Value) -> Result<Value, ApiError> {
        self.transport
            .post("/runs/wait", with_defaults(params, &[]))
            .map(record)
    }

    pub fn create_batch(&self, runs: Vec<Value>) -> Result<Value, ApiError> {
        self.transport
            .post("/runs/batch", Value::Array(runs))
            .map(record)
    }

    pub fn cancel_multiple(&self, params: Value) -> Result<Value, ApiError> {
        let body = with_defaults(params, &[("action", json!("interrupt"))]);
        self.transport.post("/runs/cancel", body).map(record)
    }
}

/// Stream requests always carry `stream_mode` as a list, `["values"]` by
/// default; a single mode is wrapped.
fn stream_body(params: Value) -> Value {
    let mut body = with_defaults(params, &[("stream_mode", json!(["values"]))]);
    if let Some(mode) = body.get_mut("stream_mode") {
        if !mode.is_array() {
            *mode = Value::Array(vec![mode.take()]);
        }
    }
    body
}
