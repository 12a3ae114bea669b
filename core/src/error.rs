//! Error taxonomy for the platform client.
//!
//! # Design
//! Every failure that leaves the crate is an `ApiError`. The `kind` is a
//! closed set keyed by HTTP status; transport-level failures (connect,
//! timeout, broken streams) are `Generic` with no status code. The error that
//! triggered a `Generic` failure is kept as the `source` so callers can walk
//! the chain without the crate exposing `ureq` types in its API.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure category of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400
    BadRequest,
    /// 401, or a client built without an API key.
    Unauthorized,
    /// 404
    NotFound,
    /// 409
    Conflict,
    /// 422, or an argument rejected before any request was sent.
    Validation,
    /// 500–599
    Server,
    /// Any other status, transport failures, and malformed payloads.
    Generic,
}

impl ErrorKind {
    /// Map a non-2xx status to its kind. Returns `None` for statuses outside
    /// the table, which callers report as `Generic`.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::BadRequest),
            401 => Some(Self::Unauthorized),
            404 => Some(Self::NotFound),
            409 => Some(Self::Conflict),
            422 => Some(Self::Validation),
            500..=599 => Some(Self::Server),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BadRequest => "bad request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Validation => "validation failed",
            Self::Server => "server error",
            Self::Generic => "api error",
        };
        f.write_str(name)
    }
}

/// Error returned by every fallible operation in this crate.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    status_code: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code,
            source: None,
        }
    }

    /// A `Generic` error with no status code.
    pub fn generic(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, message, None)
    }

    /// An argument rejected before any request was issued.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message, None)
    }

    /// Build the error for a non-2xx response.
    ///
    /// Statuses outside the mapping table become `Generic` with the fixed
    /// message `Unexpected response status: <status>`; the extracted message
    /// is discarded in that case.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match ErrorKind::from_status(status) {
            Some(kind) => Self::new(kind, message, Some(status)),
            None => Self::new(
                ErrorKind::Generic,
                format!("Unexpected response status: {status}"),
                Some(status),
            ),
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status of the response that produced this error, `None` for
    /// transport-level and argument failures.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }
}
