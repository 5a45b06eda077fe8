//! Error types for the status fetcher

use thiserror::Error;

/// Errors that can occur while fetching a status payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status code
    #[error("Unexpected HTTP status: {status}")]
    Status {
        /// HTTP status code returned by the endpoint
        status: u16,
    },

    /// The body did not match the status payload schema
    #[error("Status payload schema error: {0}")]
    Schema(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Whether trying the same request again later can reasonably succeed.
    ///
    /// Connection failures, server errors and throttling are transient. A
    /// payload that violates the schema or a client-side status will not
    /// change by asking again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Status { status } => *status >= 500 || *status == 429,
            FetchError::Schema(_) | FetchError::Client(_) => false,
        }
    }
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
