//! Error types for cq-swipe
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Only `FetchError` is fatal to a session. `CommitError` is reported and the
//! queue keeps moving; a candidate without a usable identity is a warning
//! event, not an error.

use thiserror::Error;

/// Candidate list could not be obtained
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request never produced a response (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not a JSON array of records
    #[error("Malformed candidate list: {0}")]
    Decode(String),
}

/// A single decision failed to persist
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    /// Request never produced a response (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded
    #[error("Malformed swipe response: {0}")]
    Decode(String),

    /// Commit task ended without producing a response (panicked or cancelled)
    #[error("Commit task aborted: {0}")]
    Aborted(String),
}

/// Main error type for cq-swipe
#[derive(Error, Debug)]
pub enum Error {
    /// Initial candidate fetch failed
    #[error("Candidate fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// HTTP client could not be built from configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using cq-swipe Error
pub type Result<T> = std::result::Result<T, Error>;
