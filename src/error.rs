//! Error types for the fileconv library.
//!
//! Two distinct error types reflect two distinct audiences:
//!
//! * [`ConvertError`] is **typed**: what actually went wrong (file unreadable,
//!   backend unreachable, non-2xx status, disk full while saving). Returned as
//!   `Err(ConvertError)` by the ports in [`crate::pipeline`] and by
//!   [`crate::workflow::Workflow::convert_file`] when delivery breaks.
//!
//! * [`WorkflowError`] is **user-facing**: a single free-text message held by
//!   the workflow between stage transitions. It carries no structured kind;
//!   the workflow builds it from a `ConvertError` (or a localized template)
//!   at the stage boundary and never lets the typed error escape further.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All typed errors returned by the fileconv library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists but reading it failed part-way.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Network errors ────────────────────────────────────────────────────
    /// The configured base URL cannot be turned into a request URL.
    #[error("Invalid API base URL '{base}': {reason}")]
    InvalidBaseUrl { base: String, reason: String },

    /// The request never produced a response (DNS, refused connection, TLS).
    #[error("Request to '{url}' failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    /// The backend answered with a non-success status.
    #[error("HTTP {status} from '{url}': {detail}")]
    HttpStatus {
        url: String,
        status: u16,
        detail: String,
    },

    /// The backend answered 2xx but the body was not what we expected.
    #[error("Invalid response from '{url}': {reason}")]
    InvalidResponse { url: String, reason: String },

    // ── Delivery errors ───────────────────────────────────────────────────
    /// Could not write the converted artifact.
    #[error("Failed to save '{path}': {source}")]
    DeliveryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error; the message is shown as-is.
    #[error("{0}")]
    Internal(String),
}

impl ConvertError {
    /// HTTP status code, when the error came from a backend response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConvertError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The workflow's single, transient, human-readable error.
///
/// Cleared on the next successful stage transition or on reset. A new error
/// replaces the previous one (last write wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WorkflowError(String);

impl WorkflowError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ConvertError> for WorkflowError {
    fn from(e: &ConvertError) -> Self {
        Self(e.to_string())
    }
}
