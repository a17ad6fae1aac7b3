//! Error types for the placement advisor

use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by a [`CloudApi`](crate::cloud::CloudApi) implementation.
#[derive(Debug, Clone, Error)]
pub enum CloudApiError {
    #[error("request throttled by the cloud API")]
    Throttled {
        /// Server-supplied retry hint, if any
        retry_after: Option<Duration>,
    },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("access denied: {0}")]
    Forbidden(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    InvalidResponse(String),
}

impl CloudApiError {
    /// Whether the call is worth retrying with backoff
    pub fn is_transient(&self) -> bool {
        matches!(self, CloudApiError::Throttled { .. } | CloudApiError::Timeout(_))
    }

    /// Retry-after hint carried by a throttling response
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CloudApiError::Throttled { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Errors produced by the advisor engine itself.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("cloud API error: {0}")]
    Api(#[from] CloudApiError),

    #[error("No candidate regions resolved: {0}")]
    NoCandidateRegions(String),

    #[error("data residency code '{0}' has no region mapping")]
    UnmappedResidency(String),

    #[error("snapshot store error: {0}")]
    SnapshotStore(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AdvisorResult<T> = Result<T, AdvisorError>;
