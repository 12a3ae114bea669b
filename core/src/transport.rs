//! Blocking HTTP transport with bounded retry and event streaming.
//!
//! # Design
//! A `Transport` owns an immutable `Configuration` snapshot and two `ureq`
//! agents built from it: one for request/response calls with an overall
//! deadline, one for streams where only connecting and receiving the response
//! head are bounded. Agents are cheap to clone and safe to share, so a
//! `Transport` can serve concurrent independent calls without locks.
//!
//! Only transport-level failures are retried. Any HTTP status, success or
//! not, ends the call after a single mapping step.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::config::Configuration;
use crate::error::{ApiError, ErrorKind};
use crate::http::{HttpMethod, HttpResponse, RequestSpec};
use crate::stream::{EventStream, StreamEvent};

/// Upper bound on a buffered (non-stream) response body.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Delay before retry number `attempt` (1-based).
pub trait Backoff: Send + Sync {
    fn delay(&self, attempt: u32) -> Duration;
}

/// `2^attempt` seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialBackoff;

impl Backoff for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt))
    }
}

impl<F> Backoff for F
where
    F: Fn(u32) -> Duration + Send + Sync,
{
    fn delay(&self, attempt: u32) -> Duration {
        self(attempt)
    }
}

#[derive(Clone)]
pub struct Transport {
    config: Arc<Configuration>,
    agent: Agent,
    stream_agent: Agent,
    backoff: Arc<dyn Backoff>,
}

impl Transport {
    pub fn new(config: Configuration) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build()
            .new_agent();
        let stream_agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_connect(Some(config.timeout))
            .timeout_recv_response(Some(config.timeout))
            .build()
            .new_agent();
        Self {
            config: Arc::new(config),
            agent,
            stream_agent,
            backoff: Arc::new(ExponentialBackoff),
        }
    }

    /// Replace the retry delay schedule.
    pub fn with_backoff(mut self, backoff: impl Backoff + 'static) -> Self {
        self.backoff = Arc::new(backoff);
        self
    }

    pub(crate) fn backoff(&self) -> Arc<dyn Backoff> {
        Arc::clone(&self.backoff)
    }

    pub(crate) fn with_shared_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Perform one logical call, retrying transport failures.
    ///
    /// Returns `Ok(None)` for an empty 2xx body.
    pub fn request(&self, spec: &RequestSpec) -> Result<Option<Value>, ApiError> {
        let body = spec.body_bytes()?;
        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;
        loop {
            debug!(method = spec.method.as_str(), path = %spec.path, attempt, "sending request");
            match self.send(&self.agent, spec, body.as_deref(), false) {
                Ok(mut response) => {
                    let status = response.status().as_u16();
                    debug!(path = %spec.path, status, "received response");
                    // Never retried once a status has arrived.
                    return match read_body(&mut response) {
                        Ok(body) => HttpResponse { status, body }.into_result(),
                        Err(err) => Err(body_read_error(status, err)),
                    };
                }
                Err(err) => {
                    attempt += 1;
                    if attempt > max_retries {
                        return Err(ApiError::generic(format!(
                            "HTTP request failed after {max_retries} retries: {err}"
                        ))
                        .with_source(err));
                    }
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        path = %spec.path,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "request failed, retrying"
                    );
                    std::thread::sleep(delay);
                }
            }
        }
    }

    pub fn get(&self, path: &str, query: &Value) -> Result<Option<Value>, ApiError> {
        self.request(&RequestSpec::get(path).with_query_object(query))
    }

    pub fn post(&self, path: &str, body: Value) -> Result<Option<Value>, ApiError> {
        self.request(&RequestSpec::post(path).with_body(body))
    }

    pub fn patch(&self, path: &str, body: Value) -> Result<Option<Value>, ApiError> {
        self.request(&RequestSpec::patch(path).with_body(body))
    }

    pub fn put(&self, path: &str, body: Value) -> Result<Option<Value>, ApiError> {
        self.request(&RequestSpec::put(path).with_body(body))
    }

    pub fn delete(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.request(&RequestSpec::delete(path))
    }

    /// Open an event stream. One attempt only; a non-2xx status is mapped the
    /// same way `request` maps it.
    pub fn open_stream(&self, spec: &RequestSpec) -> Result<EventStream, ApiError> {
        let body = spec.body_bytes()?;
        debug!(method = spec.method.as_str(), path = %spec.path, "opening stream");
        let mut response = self
            .send(&self.stream_agent, spec, body.as_deref(), true)
            .map_err(|e| ApiError::generic(format!("Stream request failed: {e}")).with_source(e))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            return Err(match read_body(&mut response) {
                Ok(body) => HttpResponse { status, body }.into_error(),
                Err(err) => body_read_error(status, err),
            });
        }
        Ok(EventStream::new(response.into_body().into_reader()))
    }

    /// Stream events to `on_event`, one at a time, on the calling thread.
    ///
    /// Returns when the server closes the stream or on the first error.
    /// Events delivered before an error stay delivered.
    pub fn stream<F>(&self, spec: &RequestSpec, mut on_event: F) -> Result<(), ApiError>
    where
        F: FnMut(StreamEvent),
    {
        for event in self.open_stream(spec)? {
            on_event(event?);
        }
        Ok(())
    }

    fn send(
        &self,
        agent: &Agent,
        spec: &RequestSpec,
        body: Option<&[u8]>,
        streaming: bool,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let url = self.config.url(&spec.path);
        let body = body.unwrap_or_default();
        match spec.method {
            HttpMethod::Get => {
                let mut builder = agent.get(&url);
                for (key, value) in &spec.query {
                    builder = builder.query(key.as_str(), value.as_str());
                }
                self.headers(builder, streaming).call()
            }
            HttpMethod::Post => self.headers(agent.post(&url), streaming).send(body),
            HttpMethod::Patch => self.headers(agent.patch(&url), streaming).send(body),
            HttpMethod::Put => self.headers(agent.put(&url), streaming).send(body),
            HttpMethod::Delete if spec.body.is_some() => self
                .headers(agent.delete(&url).force_send_body(), streaming)
                .send(body),
            HttpMethod::Delete => self.headers(agent.delete(&url), streaming).call(),
        }
    }

    fn headers<B>(&self, builder: RequestBuilder<B>, streaming: bool) -> RequestBuilder<B> {
        let builder = builder
            .header("Authorization", format!("Bearer {}", self.config.api_key).as_str())
            .header("User-Agent", self.config.user_agent.as_str())
            .header("Content-Type", "application/json");
        if streaming {
            builder
                .header("Accept", "text/event-stream")
                .header("Cache-Control", "no-cache")
        } else {
            builder
        }
    }
}

/// Read a whole response body. Invalid UTF-8 is replaced, not rejected.
fn read_body(response: &mut ureq::http::Response<ureq::Body>) -> Result<String, ureq::Error> {
    let bytes = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// The status arrived but its body could not be read. Error statuses keep
/// their mapped kind with an empty message.
fn body_read_error(status: u16, err: ureq::Error) -> ApiError {
    let mapped = if (200..300).contains(&status) {
        ApiError::new(
            ErrorKind::Generic,
            format!("Failed to read response body: {err}"),
            Some(status),
        )
    } else {
        ApiError::from_status(status, String::new())
    };
    mapped.with_source(err)
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
