use std::sync::Arc;

use serde_json::{json, Value};

use super::{page_params, record, records};
use crate::error::ApiError;
use crate::http::RequestSpec;
use crate::paginator::Paginator;
use crate::transport::Transport;
use crate::validate::{self, with_defaults};

/// Key-value store scoped by namespace.
#[derive(Debug, Clone)]
pub struct Store {
    transport: Arc<Transport>,
}

impl Store {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    pub fn get(&self, namespace: &str, key: &str) -> Result<Value, ApiError> {
        check_item(namespace, key)?;
        self.transport
            .get(&format!("/store/{namespace}/{key}"), &Value::Null)
            .map(record)
    }

    pub fn put(&self, namespace: &str, key: &str, params: Value) -> Result<Value, ApiError> {
        check_item(namespace, key)?;
        self.transport
            .put(&format!("/store/{namespace}/{key}"), with_defaults(params, &[]))
            .map(record)
    }

    pub fn delete(&self, namespace: &str, key: &str) -> Result<(), ApiError> {
        check_item(namespace, key)?;
        self.transport.delete(&format!("/store/{namespace}/{key}"))?;
        Ok(())
    }

    pub fn list(&self, namespace: &str, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::require_id("Namespace", namespace)?;
        validate::pagination_params(&params)?;
        let query = with_defaults(params, &[("limit", json!(10)), ("offset", json!(0))]);
        records(self.transport.get(&format!("/store/{namespace}"), &query)?)
    }

    /// Lazily page through the items of a namespace.
    pub fn list_all<'a>(
        &'a self,
        namespace: &'a str,
        params: Value,
    ) -> Paginator<impl FnMut(u32, u32) -> Result<Vec<Value>, ApiError> + 'a> {
        Paginator::new(move |limit: u32, offset: u32| {
            self.list(namespace, page_params(&params, limit, offset))
        })
    }

    pub fn search(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        validate::pagination_params(&params)?;
        let body = with_defaults(params, &[("limit", json!(10)), ("offset", json!(0))]);
        records(self.transport.post("/store/search", body)?)
    }

    pub fn batch_get(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        records(self.transport.post("/store/batch", with_defaults(params, &[]))?)
    }

    pub fn batch_put(&self, params: Value) -> Result<Vec<Value>, ApiError> {
        records(self.transport.put("/store/batch", with_defaults(params, &[]))?)
    }

    /// DELETE with a JSON body naming the items to remove.
    pub fn batch_delete(&self, params: Value) -> Result<(), ApiError> {
        let spec = RequestSpec::delete("/store/batch").with_body(with_defaults(params, &[]));
        self.transport.request(&spec)?;
        Ok(())
    }
}

fn check_item(namespace: &str, key: &str) -> Result<(), ApiError> {
    validate::require_id("Namespace", namespace)?;
    validate::require_id("Key", key)
}
