//! Error types for the progress-poll crate.

use status_fetcher::FetchError;

/// Errors raised while configuring or running a poll controller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PollerError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A status fetch failed
    #[error("Status fetch failed: {0}")]
    Transport(#[from] FetchError),

    /// Too many status fetches failed in a row
    #[error("Giving up after {failures} consecutive failed status fetches (last: {last})")]
    TooManyFailures {
        /// Number of consecutive failures observed
        failures: u32,
        /// The most recent fetch error
        last: FetchError,
    },

    /// The background polling task could not be joined
    #[error("Polling task failed: {0}")]
    TaskJoin(String),
}

/// Convenience type alias for Results using PollerError.
pub type Result<T> = std::result::Result<T, PollerError>;
