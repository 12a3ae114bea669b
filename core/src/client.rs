//! Entry point tying configuration, transport and resources together.
//!
//! # Design
//! The client never mutates a `Configuration` a transport has captured.
//! `configure` copies the current snapshot, applies the caller's changes,
//! validates the result and swaps in a freshly built `Transport`. Calls that
//! already loaded the old transport finish on it; resource handles obtained
//! before the swap keep the snapshot they were created with.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use crate::config::{Configuration, API_KEY_ENV};
use crate::error::{ApiError, ErrorKind};
use crate::resources::{Assistants, Crons, Mcp, Runs, Store, Threads};
use crate::transport::Transport;

pub struct Client {
    transport: ArcSwap<Transport>,
}

impl Client {
    /// Build a client. Fails with `Unauthorized` when the API key is blank.
    pub fn new(config: Configuration) -> Result<Self, ApiError> {
        Self::with_transport(Transport::new(validated(config)?))
    }

    /// Build a client from `LANGGRAPH_API_KEY` / `LANGGRAPH_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::new(Configuration::from_env())
    }

    /// Wrap a prepared transport, e.g. one with a custom backoff.
    pub fn with_transport(transport: Transport) -> Result<Self, ApiError> {
        validated(transport.config().clone())?;
        Ok(Self {
            transport: ArcSwap::from_pointee(transport),
        })
    }

    /// Apply changes to a copy of the current configuration and swap in a new
    /// transport built from it. The current transport stays in place if the
    /// new configuration is invalid.
    pub fn configure<F>(&self, change: F) -> Result<(), ApiError>
    where
        F: FnOnce(&mut Configuration),
    {
        let current = self.transport.load_full();
        let mut config = current.config().clone();
        change(&mut config);
        let config = validated(config)?;
        let next = Transport::new(config).with_shared_backoff(current.backoff());
        debug!(base_url = %next.config().base_url, "client reconfigured");
        self.transport.store(Arc::new(next));
        Ok(())
    }

    /// Current transport snapshot.
    pub fn transport(&self) -> Arc<Transport> {
        self.transport.load_full()
    }

    pub fn configuration(&self) -> Configuration {
        self.transport.load().config().clone()
    }

    pub fn assistants(&self) -> Assistants {
        Assistants::new(self.transport())
    }

    pub fn threads(&self) -> Threads {
        Threads::new(self.transport())
    }

    pub fn runs(&self) -> Runs {
        Runs::new(self.transport())
    }

    pub fn crons(&self) -> Crons {
        Crons::new(self.transport())
    }

    pub fn store(&self) -> Store {
        Store::new(self.transport())
    }

    pub fn mcp(&self) -> Mcp {
        Mcp::new(self.transport())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.load_full())
            .finish()
    }
}

fn validated(config: Configuration) -> Result<Configuration, ApiError> {
    if config.is_valid() {
        return Ok(config);
    }
    Err(ApiError::new(
        ErrorKind::Unauthorized,
        format!(
            "API key is required. Set it via the api_key parameter or {API_KEY_ENV} environment variable."
        ),
        None,
    ))
}
