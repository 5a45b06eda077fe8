//! # progress-poll
//!
//! Tracks one long-running server-side operation by polling its status
//! endpoint at a fixed interval and driving a progress dialog until the
//! operation finishes.
//!
//! The crate is split along the seams of the problem:
//!
//! - [`PollerConfig`] holds the immutable settings for one tracked operation
//! - [`PresentationSurface`] is the dialog/progress-bar capability the host provides
//! - [`StatusFetcher`] performs one status request (an HTTP implementation is re-exported)
//! - [`PollController`] runs the state machine and resolves into a [`PollOutcome`]
//!
//! ```rust,ignore
//! use progress_poller::{HttpStatusFetcher, PollController, PollOutcome, PollerConfig};
//!
//! let config = PollerConfig::from_json_str(r#"{"url": "https://example.com/jobs/7", "pollTimer": 2}"#)?;
//! let mut controller = PollController::new(config, HttpStatusFetcher::new()?, my_surface)?;
//!
//! match controller.run().await {
//!     PollOutcome::ReloadRequired => host.reload(),
//!     outcome => println!("done: {:?}", outcome),
//! }
//! ```

mod config;
mod error;
pub mod polling;
mod surface;

pub use config::{DialogOptions, PollerConfig, PollerOptions};
pub use error::{PollerError, Result};
pub use polling::{
    Decision, PollController, PollOutcome, PollState, PollStats, PollerHandle, ProgressTracker,
};
pub use surface::PresentationSurface;

// Re-export the fetch capability so hosts only need this crate
pub use status_fetcher::{
    FetchError, FetcherConfig, HttpStatusFetcher, StatusFetcher, StatusPayload, Url,
};
