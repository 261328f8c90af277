//! Error types for the aggregation core.
//!
//! Parsing and normalization never raise; they degrade individual fields
//! to sentinels. Only adapter I/O failures and structurally invalid
//! requests produce errors, and those are typed so callers can decide
//! between surfacing a retryable state and degrading to an empty result.

use thiserror::Error;

/// Adapter-level failure: network error, non-2xx response, or missing
/// credentials. Carries the backend identity and, when the upstream
/// answered at all, the HTTP status.
#[derive(Debug, Clone, Error)]
#[error("{backend} backend error: {message}")]
pub struct UpstreamError {
    pub backend: String,
    /// Set when the upstream answered at all; `None` for transport
    /// failures and missing credentials.
    pub http_status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            http_status: None,
            message: message.into(),
        }
    }

    pub fn with_status(
        backend: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            http_status: Some(status),
            message: message.into(),
        }
    }
}

/// Request-level failure returned by the aggregator.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The raw query trimmed to nothing. Not retryable.
    #[error("query must not be empty")]
    InvalidQuery,

    /// A rate-limiting layer in front of the core refused the request
    /// before any adapter was called. The core itself never produces
    /// this; it only passes the signal through.
    #[error("rate limit exceeded, try again later")]
    RateLimited,

    /// The selected backend failed and no cached result exists.
    /// Retryable at the caller's discretion.
    #[error("upstream unavailable: {0}")]
    Upstream(#[from] UpstreamError),
}
