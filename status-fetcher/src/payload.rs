//! Status payload returned by a progress endpoint

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, Result};

/// One status report for a tracked server-side job.
///
/// Decoding is strict: `value`, `max` and `finished` must be present and
/// correctly typed. `age` is optional on the wire since servers only need to
/// send it when clients enforce an age timeout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    /// Current progress
    pub value: f64,

    /// Upper bound of progress
    pub max: f64,

    /// Server declares the operation complete
    pub finished: bool,

    /// Seconds since the job was created or last touched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
}

impl StatusPayload {
    /// Create an unfinished payload without an age
    pub fn in_progress(value: f64, max: f64) -> Self {
        Self {
            value,
            max,
            finished: false,
            age: None,
        }
    }

    /// Create a finished payload without an age
    pub fn finished(value: f64, max: f64) -> Self {
        Self {
            value,
            max,
            finished: true,
            age: None,
        }
    }

    /// Attach an age in seconds
    pub fn with_age(mut self, age: f64) -> Self {
        self.age = Some(age);
        self
    }

    /// Decode a payload from a JSON body
    pub fn from_json_str(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|e| FetchError::Schema(e.to_string()))
    }

    /// Decode a payload from an already parsed JSON value
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| FetchError::Schema(e.to_string()))
    }

    /// The `(value, max)` pair used for change detection
    pub fn progress(&self) -> (f64, f64) {
        (self.value, self.max)
    }

    /// Whether the reported age is strictly greater than `threshold`.
    ///
    /// A payload without an age is never older than anything.
    pub fn is_older_than(&self, threshold: Duration) -> bool {
        self.age
            .map(|age| age > threshold.as_secs_f64())
            .unwrap_or(false)
    }
}
