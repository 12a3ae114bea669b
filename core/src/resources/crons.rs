use std::sync::Arc;

use serde_json::{json, Value};

use super::{page_params, record, records};
use crate::error::ApiError;
use crate::paginator::Paginator;
use crate::transport::Transport;
use crate::validate::{self, with_defaults};

#[derive(Debug, Clone)]
pub struct Crons {
    transport: Arc<Transport>,
}

impl Crons {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn create(&self, params: Value) -> Result<Value, ApiError> {
        if let Some(schedule) = params.get("schedule").and_then(Value::as_str) {
            validate::cron_schedule(schedule)?;
        }
        let body = with_defaults(params, &[("payload", json!({}))]);
        self.transport.post("/crons", body).map(record)
    }

    pub fn find(&self, cron_id: &str) -> Result<Value, ApiError> {
        validate::require_id("Cron ID", cron_id)?;
        self.transport
            .get(&format!("/crons/{cron_id}"), &Value::Null)
            .map(record)
    }

    pub fn update(&self, cron_id: &str, params: Value) -> Result<Value, ApiError> {
        validate::require_id("Cron ID", cron_id)?;
        if let Some(schedule) = params.get("schedule").and_then(Value::as_str) {
            validate::cron_schedule(schedule)?;
        }
        self.transport
            .patch(&format!("/crons/{cron_id}"), with_defaults(params, &[]))
            .map(record)
    }

    pub fn delete(&self, cron_id: &str) -> Result<(), ApiError> {
        validate::require_id("Cron ID", cron_id)?;
        self.transport.delete(&format!("/crons/{cron_id}"))?;
        Ok(())
    }

    pub fn list(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::pagination_params(&params)?;
        let query = with_defaults(params, &[("limit", json!(10)), ("offset", json!(0))]);
        records(self.transport.get("/crons", &query)?)
    }

    /// Lazily page through `list` results.
    pub fn list_all(
        &self,
        params: Value,
    ) -> Paginator<impl FnMut(u32, u32) -> Result<Vec<Value>, ApiError> + '_> {
        Paginator::new(move |limit: u32, offset: u32| {
            self.list(page_params(&params, limit, offset))
        })
    }

    pub fn search(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::pagination_params(&params)?;
        let body = with_defaults(params, &[("limit", json!(10)), ("offset", json!(0))]);
        records(self.transport.post("/crons/search", body)?)
    }

    pub fn enable(&self, cron_id: &str) -> Result<(), ApiError> {
        validate::require_id("Cron ID", cron_id)?;
        self.transport
            .post(&format!("/crons/{cron_id}/enable"), json!({}))?;
        Ok(())
    }

    pub fn disable(&self, cron_id: &str) -> Result<(), ApiError> {
        validate::require_id("Cron ID", cron_id)?;
        self.transport
            .post(&format!("/crons/{cron_id}/disable"), json!({}))?;
        Ok(())
    }
}
