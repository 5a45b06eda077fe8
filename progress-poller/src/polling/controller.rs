//! Poll controller and background handle
//!
//! The controller owns the state machine for one tracked operation. Each cycle
//! waits for the configured delay, fetches one status payload, applies the
//! [`decide`] rules, drives the presentation surface, and then either
//! schedules the next cycle or resolves into a [`PollOutcome`].

use std::fmt;
use std::time::{Duration, SystemTime};

use status_fetcher::{FetchError, StatusFetcher, StatusPayload, Url};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::PollerConfig;
use crate::error::{PollerError, Result};
use crate::polling::decision::{backoff_delay, decide, Decision, PollState, ProgressTracker};
use crate::surface::PresentationSurface;

/// How a controller run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// No endpoint was configured, so nothing was polled
    Idle,
    /// The operation finished and the dialog was closed
    Completed,
    /// A finished payload was older than the age timeout. The host should
    /// discard all state and re-bootstrap.
    ReloadRequired,
    /// Status fetches failed beyond recovery
    Failed(PollerError),
    /// Shut down through a [`PollerHandle`]
    Stopped,
}

/// Counters for a controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollStats {
    /// When the first cycle was scheduled
    pub started_at: Option<SystemTime>,
    /// Fetches issued
    pub poll_count: u64,
    /// Progress renders issued
    pub render_count: u64,
    /// Finished payloads handled through the normal completion path
    pub runs_completed: u64,
    /// Failed fetches since the last successful one
    pub consecutive_failures: u32,
    /// Failed fetches overall
    pub total_failures: u64,
}

impl fmt::Display for PollStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Poll Controller Stats:")?;
        writeln!(f, "  Polls: {}", self.poll_count)?;
        writeln!(f, "  Renders: {}", self.render_count)?;
        writeln!(f, "  Runs completed: {}", self.runs_completed)?;
        write!(
            f,
            "  Failures: {} total, {} consecutive",
            self.total_failures, self.consecutive_failures
        )
    }
}

/// Result of waiting for one cycle
enum CycleEvent {
    Fetched(std::result::Result<StatusPayload, FetchError>),
    Shutdown,
}

/// Tracks one server-side operation and drives a progress dialog for it
pub struct PollController<F, S> {
    config: PollerConfig,
    fetcher: F,
    surface: S,
    state: PollState,
    tracker: ProgressTracker,
    stats: PollStats,
    outcome: Option<PollOutcome>,
}

impl<F, S> PollController<F, S>
where
    F: StatusFetcher,
    S: PresentationSurface,
{
    /// Validate the configuration and mount the dialog on the surface
    pub fn new(config: PollerConfig, fetcher: F, mut surface: S) -> Result<Self> {
        config.validate()?;
        surface.mount(&config.dialog_options());

        let state = if config.endpoint.is_some() {
            PollState::Initializing
        } else {
            PollState::Idle
        };

        Ok(Self {
            config,
            fetcher,
            surface,
            state,
            tracker: ProgressTracker::new(),
            stats: PollStats::default(),
            outcome: None,
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn is_dialog_open(&self) -> bool {
        self.tracker.is_dialog_open()
    }

    /// Poll until the operation reaches a terminal outcome.
    ///
    /// Calling `run` again after it returned yields the same outcome without
    /// polling again.
    pub async fn run(&mut self) -> PollOutcome {
        self.drive(None).await
    }

    /// Run the controller as a task on the current tokio runtime
    pub fn spawn(self) -> PollerHandle
    where
        F: 'static,
        S: 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut controller = self;
        let task = tokio::spawn(async move { controller.drive(Some(shutdown_rx)).await });

        PollerHandle {
            task,
            shutdown: shutdown_tx,
        }
    }

    async fn drive(&mut self, mut shutdown: Option<watch::Receiver<bool>>) -> PollOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let outcome = match self.config.endpoint.clone() {
            Some(endpoint) => self.poll_loop(&endpoint, &mut shutdown).await,
            None => {
                tracing::warn!("No status endpoint configured, progress controller stays idle");
                PollOutcome::Idle
            }
        };

        tracing::info!("Progress polling finished in state {}: {:?}", self.state, outcome);
        self.outcome = Some(outcome.clone());
        outcome
    }

    async fn poll_loop(
        &mut self,
        endpoint: &Url,
        shutdown: &mut Option<watch::Receiver<bool>>,
    ) -> PollOutcome {
        tracing::info!(
            "Starting progress polling for {} (interval: {:?}, continuous: {})",
            endpoint,
            self.config.poll_interval,
            self.config.continuous
        );
        self.stats.started_at = Some(SystemTime::now());

        let mut delay = self.config.poll_interval;

        loop {
            self.transition(PollState::Polling);

            let event = {
                let fetcher = &self.fetcher;
                let cycle = async move {
                    tokio::time::sleep(delay).await;
                    fetcher.fetch(endpoint).await
                };

                tokio::select! {
                    result = cycle => CycleEvent::Fetched(result),
                    _ = wait_for_shutdown(shutdown) => CycleEvent::Shutdown,
                }
            };

            match event {
                CycleEvent::Shutdown => return self.stop(),
                CycleEvent::Fetched(Ok(payload)) => {
                    self.stats.poll_count += 1;
                    self.stats.consecutive_failures = 0;

                    if let Some(outcome) = self.apply(&payload) {
                        return outcome;
                    }
                    delay = self.config.poll_interval;
                }
                CycleEvent::Fetched(Err(error)) => {
                    self.stats.poll_count += 1;

                    match self.record_failure(error) {
                        Ok(backoff) => delay = backoff,
                        Err(error) => return self.fail(error),
                    }
                }
            }
        }
    }

    /// Act on a resolved payload. Returns an outcome when the run is over.
    fn apply(&mut self, payload: &StatusPayload) -> Option<PollOutcome> {
        self.transition(PollState::Rendering);

        let decision = decide(&self.config, &self.tracker, payload);
        tracing::debug!("Status {:?} -> {:?}", payload, decision);

        match decision {
            Decision::Reload => {
                tracing::info!(
                    "Operation finished {:?}s ago, past the age timeout; reload required",
                    payload.age
                );
                self.transition(PollState::StaleTimeout);
                return Some(PollOutcome::ReloadRequired);
            }
            Decision::Restart => {
                self.surface.hide_dialog();
                self.stats.runs_completed += 1;
                self.transition(PollState::Restarting);
            }
            Decision::Complete => {
                self.surface.hide_dialog();
                self.stats.runs_completed += 1;
                self.transition(PollState::Completed);
            }
            Decision::Continue { render } => {
                self.surface.show_dialog();
                if let Some((value, max)) = render {
                    self.surface.render_progress(value, max);
                    self.stats.render_count += 1;
                }
            }
        }

        self.tracker.record(&decision);

        if decision.schedules_next_poll() {
            None
        } else {
            Some(PollOutcome::Completed)
        }
    }

    /// Count a failed fetch and work out the delay before retrying, or the
    /// error to give up with.
    fn record_failure(&mut self, error: FetchError) -> Result<Duration> {
        self.stats.consecutive_failures += 1;
        self.stats.total_failures += 1;
        let failures = self.stats.consecutive_failures;

        tracing::warn!(
            "Status fetch failed (attempt {}/{}): {}",
            failures,
            self.config.max_consecutive_failures,
            error
        );

        let reported = PollerError::Transport(error.clone());
        self.surface.report_error(&reported);

        if !error.is_retryable() {
            return Err(reported);
        }

        if failures >= self.config.max_consecutive_failures {
            return Err(PollerError::TooManyFailures {
                failures,
                last: error,
            });
        }

        Ok(backoff_delay(
            self.config.poll_interval,
            self.config.max_backoff,
            failures,
        ))
    }

    fn fail(&mut self, error: PollerError) -> PollOutcome {
        tracing::error!("Giving up on progress polling: {}", error);
        self.close_dialog();
        self.transition(PollState::Failed);
        PollOutcome::Failed(error)
    }

    fn stop(&mut self) -> PollOutcome {
        tracing::info!("Progress polling shut down");
        self.close_dialog();
        self.transition(PollState::Stopped);
        PollOutcome::Stopped
    }

    fn close_dialog(&mut self) {
        if self.tracker.is_dialog_open() {
            self.surface.hide_dialog();
            self.tracker.record_hidden();
        }
    }

    fn transition(&mut self, next: PollState) {
        if self.state != next {
            tracing::debug!("Progress controller {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

/// Resolve once shutdown has been requested. Never resolves without a
/// receiver, or after every handle has been dropped.
async fn wait_for_shutdown(shutdown: &mut Option<watch::Receiver<bool>>) {
    if let Some(rx) = shutdown {
        while !*rx.borrow() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        if *rx.borrow() {
            return;
        }
    }
    std::future::pending::<()>().await
}

/// Handle to a controller running as a background task
#[derive(Debug)]
pub struct PollerHandle {
    task: JoinHandle<PollOutcome>,
    shutdown: watch::Sender<bool>,
}

impl PollerHandle {
    /// Check if the controller task is still running
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Wait for the controller to reach an outcome on its own
    pub async fn join(self) -> Result<PollOutcome> {
        self.task
            .await
            .map_err(|e| PollerError::TaskJoin(format!("Failed to await polling task: {}", e)))
    }

    /// Cancel the pending cycle, hide the dialog, and wait for the task.
    ///
    /// Resolves to [`PollOutcome::Stopped`] unless the controller had
    /// already reached another outcome.
    pub async fn shutdown(self) -> Result<PollOutcome> {
        // The task may already be gone; that is not an error
        let _ = self.shutdown.send(true);
        self.join().await
    }
}
