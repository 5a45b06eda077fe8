//! Decision logic for a single poll cycle
//!
//! Everything here is pure: given the controller configuration, what has been
//! shown so far, and the payload that just arrived, [`decide`] says what the
//! controller must do next. The controller then performs the side effects.

use std::time::Duration;

use status_fetcher::StatusPayload;

use crate::config::PollerConfig;

/// Lifecycle states of a poll controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollState {
    /// No endpoint configured; nothing will ever happen
    Idle,
    /// Created, first cycle not scheduled yet
    Initializing,
    /// Waiting for the next fetch to fire or for a fetch to resolve
    Polling,
    /// Interpreting a resolved payload
    Rendering,
    /// A finished payload arrived too late; the host must reload
    StaleTimeout,
    /// A finished payload ended a non-continuous run
    Completed,
    /// A finished payload ended a continuous run; polling starts over
    Restarting,
    /// Status fetches failed beyond recovery
    Failed,
    /// Shut down through a handle
    Stopped,
}

impl PollState {
    /// Whether no further cycles can happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PollState::Idle
                | PollState::StaleTimeout
                | PollState::Completed
                | PollState::Failed
                | PollState::Stopped
        )
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PollState::Idle => "idle",
            PollState::Initializing => "initializing",
            PollState::Polling => "polling",
            PollState::Rendering => "rendering",
            PollState::StaleTimeout => "stale-timeout",
            PollState::Completed => "completed",
            PollState::Restarting => "restarting",
            PollState::Failed => "failed",
            PollState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What the controller does with a resolved payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Finished, but older than the age timeout: cancel everything and reload
    Reload,
    /// Finished in continuous mode: hide the dialog and poll again
    Restart,
    /// Finished: hide the dialog and stop
    Complete,
    /// Still running: ensure the dialog is shown, render if the progress
    /// changed, and poll again
    Continue {
        /// New `(value, max)` pair to render, if it differs from the last one
        render: Option<(f64, f64)>,
    },
}

impl Decision {
    /// Whether another cycle follows this decision
    pub fn schedules_next_poll(&self) -> bool {
        matches!(self, Decision::Restart | Decision::Continue { .. })
    }
}

/// What has been presented so far
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressTracker {
    last_rendered: Option<(f64, f64)>,
    dialog_open: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last `(value, max)` pair handed to the presentation surface
    pub fn last_rendered(&self) -> Option<(f64, f64)> {
        self.last_rendered
    }

    pub fn is_dialog_open(&self) -> bool {
        self.dialog_open
    }

    /// Record the presentation effects of a decision
    pub fn record(&mut self, decision: &Decision) {
        match decision {
            Decision::Reload => {}
            Decision::Restart | Decision::Complete => self.dialog_open = false,
            Decision::Continue { render } => {
                self.dialog_open = true;
                if let Some(progress) = render {
                    self.last_rendered = Some(*progress);
                }
            }
        }
    }

    /// Record that the dialog was hidden outside the normal completion path
    pub fn record_hidden(&mut self) {
        self.dialog_open = false;
    }
}

/// Decide what to do with a resolved payload.
///
/// Rules are checked in order: stale finished payload, finished in continuous
/// mode, finished, still running.
pub fn decide(config: &PollerConfig, tracker: &ProgressTracker, payload: &StatusPayload) -> Decision {
    let stale = config
        .age_timeout
        .map(|timeout| payload.finished && payload.is_older_than(timeout))
        .unwrap_or(false);

    if stale {
        Decision::Reload
    } else if payload.finished && config.continuous {
        Decision::Restart
    } else if payload.finished {
        Decision::Complete
    } else {
        let progress = payload.progress();
        let render = if tracker.last_rendered == Some(progress) {
            None
        } else {
            Some(progress)
        };
        Decision::Continue { render }
    }
}

/// Delay before the next fetch after `consecutive_failures` failed fetches.
///
/// Doubles the poll interval for each failure, capped at `max_backoff`.
pub fn backoff_delay(poll_interval: Duration, max_backoff: Duration, consecutive_failures: u32) -> Duration {
    let factor = 2_u32.pow(consecutive_failures.min(16));
    poll_interval
        .checked_mul(factor)
        .unwrap_or(max_backoff)
        .min(max_backoff)
}
