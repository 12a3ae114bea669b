//! Blocking client core for the LangGraph platform API.
//!
//! # Overview
//! Turns REST calls into request/response exchanges with typed errors and
//! bounded retry, and long-lived `text/event-stream` responses into an
//! ordered sequence of decoded events. Resource handles (assistants, threads,
//! runs, crons, store, MCP) are thin path/body builders on top.
//!
//! # Design
//! - `Transport` owns an immutable `Configuration` snapshot; `Client` swaps
//!   whole transports on reconfiguration instead of mutating settings.
//! - Only transport-level failures are retried, with a pluggable `Backoff`.
//!   HTTP error statuses map once to an `ApiError` and return immediately.
//! - `EventStreamParser` is independent of I/O and of chunk boundaries.
//! - `Paginator` works over any `fetch(limit, offset)` closure.
//! - Request bodies and results are `serde_json::Value`; typed records are
//!   the caller's concern.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod paginator;
pub mod resources;
pub mod sse;
pub mod stream;
pub mod transport;
pub mod validate;

pub use client::Client;
pub use config::Configuration;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpResponse, RequestSpec};
pub use paginator::{Page, Paginator};
pub use sse::{EventStreamParser, SseFrame};
pub use stream::{EventStream, Payload, StreamEvent};
pub use transport::{Backoff, ExponentialBackoff, Transport};
