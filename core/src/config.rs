//! Client configuration snapshot.
//!
//! # Design
//! `Configuration` is plain data. A `Transport` takes its own copy at
//! construction, so changing settings means building a new snapshot and a
//! new transport (see `Client::configure`) rather than mutating one that an
//! in-flight request may be reading.

use std::fmt;
use std::time::Duration;

pub const API_KEY_ENV: &str = "LANGGRAPH_API_KEY";
pub const BASE_URL_ENV: &str = "LANGGRAPH_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://api.langchain.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Settings consumed by `Transport`.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    pub api_key: String,
    /// Stored without a trailing `/`; request paths start with one.
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: String,
}

impl Configuration {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: default_user_agent(),
        }
    }

    /// Read `LANGGRAPH_API_KEY` and `LANGGRAPH_BASE_URL`. A missing key yields
    /// an empty one; `Client::new` rejects it.
    pub fn from_env() -> Self {
        let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        let config = Self::new(api_key);
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => config.with_base_url(url),
            _ => config,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Absolute URL for a request path.
    pub(crate) fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!("{base}{path}")
    }
}

fn default_user_agent() -> String {
    format!("langgraph-core-rust/{}", env!("CARGO_PKG_VERSION"))
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::new("key");
        assert_eq!(config.base_url, "https://api.langchain.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert!(config.user_agent.starts_with("langgraph-core-rust/"));
        assert!(config.is_valid());
    }

    #[test]
    fn blank_key_is_invalid() {
        assert!(!Configuration::new("").is_valid());
        assert!(!Configuration::new("   ").is_valid());
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = Configuration::new("k").with_base_url("http://localhost:8123/");
        assert_eq!(config.base_url, "http://localhost:8123");
        assert_eq!(config.url("/threads"), "http://localhost:8123/threads");
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", Configuration::new("sk-secret"));
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
