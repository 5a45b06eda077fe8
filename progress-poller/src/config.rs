//! Configuration types for the progress-poll crate
//!
//! A [`PollerConfig`] is built once per tracked operation and never changes
//! afterwards. It can be assembled in code through the fluent `with_*`
//! methods, or from a caller-supplied options object ([`PollerOptions`]) such
//! as the JSON a web host passes along with the job it just started.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use status_fetcher::Url;

use crate::error::{PollerError, Result};

/// Labels and modality forwarded to the presentation surface when it mounts
/// the dialog. The state machine never looks at these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogOptions {
    pub title: String,
    pub content: String,
    pub modal: bool,
}

/// Configuration for a poll controller
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Status endpoint. Without one the controller stays idle.
    /// Default: None
    pub endpoint: Option<Url>,

    /// Delay between the end of one cycle's decision and the next fetch
    /// Default: 3 seconds
    pub poll_interval: Duration,

    /// Restart the sequence after each finished payload instead of stopping
    /// Default: false
    pub continuous: bool,

    /// Finished payloads older than this force a reload
    /// Default: None
    pub age_timeout: Option<Duration>,

    /// Dialog title
    /// Default: "Progress"
    pub title: String,

    /// Dialog body text
    /// Default: "Please wait..."
    pub content: String,

    /// Whether the dialog blocks the rest of the host UI
    /// Default: true
    pub modal: bool,

    /// Failed fetches in a row before the controller gives up
    /// Default: 5
    pub max_consecutive_failures: u32,

    /// Upper bound for the retry delay after failed fetches
    /// Default: 30 seconds
    pub max_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            poll_interval: Duration::from_secs(3),
            continuous: false,
            age_timeout: None,
            title: "Progress".to_string(),
            content: "Please wait...".to_string(),
            modal: true,
            max_consecutive_failures: 5,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl PollerConfig {
    /// Create a new PollerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a PollerConfig that polls every second
    pub fn fast() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_backoff: Duration::from_secs(10),
            ..Default::default()
        }
    }

    /// Create a PollerConfig for jobs that take minutes rather than seconds
    pub fn relaxed() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            max_backoff: Duration::from_secs(60),
            ..Default::default()
        }
    }

    /// Build a validated configuration from caller options
    pub fn from_options(options: PollerOptions) -> Result<Self> {
        let endpoint = match options.endpoint.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(Url::parse(raw).map_err(|e| {
                PollerError::Configuration(format!("Invalid endpoint URL {:?}: {}", raw, e))
            })?),
        };

        let age_timeout = options
            .age_timeout_seconds
            .map(|secs| seconds_to_duration("ageTimeoutSeconds", secs))
            .transpose()?;

        let config = Self {
            endpoint,
            poll_interval: seconds_to_duration("pollIntervalSeconds", options.poll_interval_seconds)?,
            continuous: options.continuous,
            age_timeout,
            title: options.title,
            content: options.content,
            modal: options.modal,
            max_consecutive_failures: options.max_consecutive_failures,
            max_backoff: seconds_to_duration("maxBackoffSeconds", options.max_backoff_seconds)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse caller options from JSON and build a validated configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: PollerOptions = serde_json::from_str(json)
            .map_err(|e| PollerError::Configuration(format!("Invalid poller options: {}", e)))?;
        Self::from_options(options)
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval == Duration::ZERO {
            return Err(PollerError::Configuration(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if self.max_consecutive_failures == 0 {
            return Err(PollerError::Configuration(
                "Max consecutive failures must be greater than 0".to_string(),
            ));
        }

        if self.max_backoff < self.poll_interval {
            return Err(PollerError::Configuration(
                "Invalid backoff: max backoff must not be less than the poll interval".to_string(),
            ));
        }

        Ok(())
    }

    /// Dialog parameters handed to the presentation surface
    pub fn dialog_options(&self) -> DialogOptions {
        DialogOptions {
            title: self.title.clone(),
            content: self.content.clone(),
            modal: self.modal,
        }
    }

    /// Builder pattern methods for fluent configuration

    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_continuous(mut self, continuous: bool) -> Self {
        self.continuous = continuous;
        self
    }

    pub fn with_age_timeout(mut self, timeout: Duration) -> Self {
        self.age_timeout = Some(timeout);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_modal(mut self, modal: bool) -> Self {
        self.modal = modal;
        self
    }

    pub fn with_failure_budget(mut self, max_consecutive_failures: u32, max_backoff: Duration) -> Self {
        self.max_consecutive_failures = max_consecutive_failures;
        self.max_backoff = max_backoff;
        self
    }
}

fn seconds_to_duration(field: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(PollerError::Configuration(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, secs
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| {
        PollerError::Configuration(format!("{} is out of range ({} seconds): {}", field, secs, e))
    })
}

/// Caller-facing options object.
///
/// Every field is optional on the wire and falls back to the same defaults as
/// [`PollerConfig::default`]. The short names `pollTimer`, `ageTimeout` and
/// `url` are accepted as aliases.
///
/// The endpoint must be an absolute URL such as
/// `https://example.com/jobs/7/status`. Relative paths are rejected because
/// there is no page to resolve them against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PollerOptions {
    pub title: String,
    pub content: String,
    pub continuous: bool,
    pub modal: bool,
    #[serde(alias = "pollTimer")]
    pub poll_interval_seconds: f64,
    #[serde(alias = "ageTimeout")]
    pub age_timeout_seconds: Option<f64>,
    #[serde(alias = "url")]
    pub endpoint: Option<String>,
    pub max_consecutive_failures: u32,
    pub max_backoff_seconds: f64,
}

impl Default for PollerOptions {
    fn default() -> Self {
        let defaults = PollerConfig::default();
        Self {
            title: defaults.title,
            content: defaults.content,
            continuous: defaults.continuous,
            modal: defaults.modal,
            poll_interval_seconds: defaults.poll_interval.as_secs_f64(),
            age_timeout_seconds: None,
            endpoint: None,
            max_consecutive_failures: defaults.max_consecutive_failures,
            max_backoff_seconds: defaults.max_backoff.as_secs_f64(),
        }
    }
}
