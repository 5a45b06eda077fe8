//! Test helpers shared by the integration tests.
//!
//! - `ScriptedFetcher` replays a fixed list of fetch results, records when
//!   each fetch started, and blocks forever once the script runs out
//! - `RecordingSurface` records every presentation call in order

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use progress_poller::{
    DialogOptions, FetchError, PollerError, PresentationSurface, StatusFetcher, StatusPayload, Url,
};
use tokio::sync::Notify;
use tokio::time::Instant;

pub fn test_endpoint() -> Url {
    Url::parse("http://127.0.0.1:9/jobs/1/status").unwrap()
}

pub fn running(value: f64, max: f64) -> Result<StatusPayload, FetchError> {
    Ok(StatusPayload::in_progress(value, max))
}

pub fn finished(value: f64, max: f64) -> Result<StatusPayload, FetchError> {
    Ok(StatusPayload::finished(value, max))
}

pub fn network_error() -> Result<StatusPayload, FetchError> {
    Err(FetchError::Network("connection refused".to_string()))
}

/// Fetcher that replays scripted results
#[derive(Clone)]
pub struct ScriptedFetcher {
    script: Arc<Mutex<VecDeque<Result<StatusPayload, FetchError>>>>,
    fetch_started: Arc<Mutex<Vec<Instant>>>,
    latency: Duration,
    exhausted: Arc<Notify>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<StatusPayload, FetchError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            fetch_started: Arc::new(Mutex::new(Vec::new())),
            latency: Duration::ZERO,
            exhausted: Arc::new(Notify::new()),
        }
    }

    /// Every fetch takes this long before resolving
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_started.lock().unwrap().len()
    }

    pub fn fetch_times(&self) -> Vec<Instant> {
        self.fetch_started.lock().unwrap().clone()
    }

    /// Resolves once a fetch found the script empty
    pub async fn wait_until_exhausted(&self) {
        self.exhausted.notified().await;
    }
}

#[async_trait]
impl StatusFetcher for ScriptedFetcher {
    async fn fetch(&self, _endpoint: &Url) -> Result<StatusPayload, FetchError> {
        self.fetch_started.lock().unwrap().push(Instant::now());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                self.exhausted.notify_one();
                std::future::pending().await
            }
        }
    }
}

/// One presentation call
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Mounted(DialogOptions),
    Shown,
    Hidden,
    Rendered(f64, f64),
    Error(String),
}

/// Surface that records every call; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingSurface {
    events: Arc<Mutex<Vec<SurfaceEvent>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn renders(&self) -> Vec<(f64, f64)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::Rendered(value, max) => Some((value, max)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &SurfaceEvent) -> usize {
        self.events().iter().filter(|event| *event == wanted).count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SurfaceEvent::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Whether the dialog is visible after replaying the log
    pub fn is_open(&self) -> bool {
        self.events().iter().fold(false, |open, event| match event {
            SurfaceEvent::Shown => true,
            SurfaceEvent::Hidden => false,
            _ => open,
        })
    }

    /// Number of times the dialog went from hidden to visible
    pub fn open_transitions(&self) -> usize {
        let mut open = false;
        let mut transitions = 0;
        for event in self.events() {
            match event {
                SurfaceEvent::Shown if !open => {
                    open = true;
                    transitions += 1;
                }
                SurfaceEvent::Hidden => open = false,
                _ => {}
            }
        }
        transitions
    }

    fn push(&self, event: SurfaceEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl PresentationSurface for RecordingSurface {
    fn mount(&mut self, dialog: &DialogOptions) {
        self.push(SurfaceEvent::Mounted(dialog.clone()));
    }

    fn show_dialog(&mut self) {
        self.push(SurfaceEvent::Shown);
    }

    fn hide_dialog(&mut self) {
        self.push(SurfaceEvent::Hidden);
    }

    fn render_progress(&mut self, value: f64, max: f64) {
        self.push(SurfaceEvent::Rendered(value, max));
    }

    fn report_error(&mut self, error: &PollerError) {
        self.push(SurfaceEvent::Error(error.to_string()));
    }
}
