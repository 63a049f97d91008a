//! Canonical provider job status.
//!
//! Providers report free-form status text ("IN_QUEUE", "processing_failed",
//! "COMPLETED", ...). Everything is folded into four states here so callers
//! never have to look at provider vocabulary.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Keywords checked in priority order. Failure wins over everything else.
const FAILED_KEYWORDS: &[&str] = &["fail", "error", "cancel", "abort"];
const COMPLETED_KEYWORDS: &[&str] = &["success", "complete"];
const RUNNING_KEYWORDS: &[&str] = &["process", "running"];

/// Coarse progress values reported for each state.
const PROGRESS_COMPLETED: u8 = 100;
const PROGRESS_RUNNING: u8 = 60;
const PROGRESS_WAITING: u8 = 15;

/// Provider job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the provider, not started yet
    #[default]
    Pending,
    /// Generation in progress
    Running,
    /// Output is available
    Completed,
    /// Provider reported a failure
    Failed,
}

impl JobStatus {
    /// Map provider status text onto a canonical status.
    ///
    /// Case-insensitive substring match. A string carrying both a failure
    /// and a progress keyword ("processing_failed") is a failure.
    pub fn from_provider_text(text: &str) -> Self {
        let normalized = text.to_lowercase();
        let contains_any = |keywords: &[&str]| keywords.iter().any(|k| normalized.contains(k));

        if contains_any(FAILED_KEYWORDS) {
            JobStatus::Failed
        } else if contains_any(COMPLETED_KEYWORDS) {
            JobStatus::Completed
        } else if contains_any(RUNNING_KEYWORDS) {
            JobStatus::Running
        } else {
            JobStatus::Pending
        }
    }

    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Progress percentage used when the provider does not report one.
    pub fn progress_hint(&self) -> u8 {
        match self {
            JobStatus::Completed => PROGRESS_COMPLETED,
            JobStatus::Running => PROGRESS_RUNNING,
            JobStatus::Pending | JobStatus::Failed => PROGRESS_WAITING,
        }
    }

    /// Merge a newly observed status into the current one.
    ///
    /// Terminal states are sticky: once a job is completed or failed, later
    /// observations for the same external id are ignored.
    pub fn advance(self, next: JobStatus) -> JobStatus {
        if self.is_terminal() {
            self
        } else {
            next
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
