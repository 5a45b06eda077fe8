//! Polling state machine
//!
//! [`decision`] holds the pure transition rules; [`controller`] drives them
//! with a timer, a status fetcher and a presentation surface.

pub mod controller;
pub mod decision;

pub use controller::{PollController, PollOutcome, PollStats, PollerHandle};
pub use decision::{backoff_delay, decide, Decision, PollState, ProgressTracker};
