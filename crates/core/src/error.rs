//! Unified error types for pagefront.
//!
//! Every variant carries a stable wire `type` and an HTTP status so the
//! server can render the `{"detail": [...]}` error body without knowing
//! about individual failure modes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Unified error types for the pagefront engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required request parameter is absent or empty.
    #[error("MISSING_PARAMETER: {0}")]
    MissingParameter(String),

    /// The `url` parameter is present but cannot be fetched.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Navigation, HTTP, or user-script failure in the fetch collaborator.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// The fetch collaborator did not finish within the request timeout.
    #[error("FETCH_TIMEOUT: no response within {0}ms")]
    FetchTimeout(u64),

    /// The cache medium itself failed (not a corrupt entry).
    #[error("STORAGE_ERROR: {0}")]
    Storage(String),
}

impl Error {
    /// Wire-level error type used in the `detail[].type` field.
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::MissingParameter(_) => "missing_parameter",
            Error::InvalidUrl(_) => "invalid_url",
            Error::FetchFailed(_) => "fetch_error",
            Error::FetchTimeout(_) => "fetch_timeout",
            Error::Storage(_) => "storage_error",
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::MissingParameter(_) | Error::InvalidUrl(_) => 400,
            _ => 500,
        }
    }

    /// Human-readable message used in the `detail[].msg` field.
    pub fn message(&self) -> String {
        match self {
            Error::MissingParameter(name) => format!("Missing required parameter: {name}"),
            Error::InvalidUrl(reason) => format!("Invalid url: {reason}"),
            Error::FetchFailed(reason) => format!("Failed to fetch URL: {reason}"),
            Error::FetchTimeout(ms) => format!("Failed to fetch URL: timed out after {ms}ms"),
            Error::Storage(reason) => format!("Cache storage failed: {reason}"),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

/// One entry of the `detail` array in an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    pub msg: String,
}

/// Error response body: `{"detail": [{"type": ..., "msg": ...}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    pub detail: Vec<ErrorDetail>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self { detail: vec![ErrorDetail { kind: err.error_type().to_string(), msg: err.message() }] }
    }
}
