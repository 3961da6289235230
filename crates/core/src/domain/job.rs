// Print Job Domain Model

use super::document::TemporaryDocument;
use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Badge identifier (strictly positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(u64);

impl BadgeId {
    pub fn new(value: u64) -> Result<Self> {
        if value == 0 {
            return Err(DomainError::InvalidBadgeId(value.to_string()));
        }
        Ok(Self(value))
    }

    /// Parse a raw path segment. Anything that is not a positive base-10
    /// integer is rejected, including `"12abc"`, `"-3"` and `"0"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: u64 = raw
            .parse()
            .map_err(|_| DomainError::InvalidBadgeId(raw.to_string()))?;
        Self::new(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for BadgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// Remote badge fetched from the upstream API
    Remote(BadgeId),
    /// File already on disk, owned by the caller
    Local(PathBuf),
}

/// Inbound request (immutable, one per call)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintJobRequest {
    pub source: JobSource,
}

impl PrintJobRequest {
    pub fn remote(id: BadgeId) -> Self {
        Self {
            source: JobSource::Remote(id),
        }
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            source: JobSource::Local(path.into()),
        }
    }
}

/// Job lifecycle state
///
/// ```text
/// Received -> Fetching -> Fetched -> Printing -> Printed -> CleanupScheduled -> Done
///                |                       |
///                v                       v
///           FailedFetch             FailedPrint
/// ```
///
/// Local jobs skip the fetch and cleanup legs: `Received -> Printing -> Printed -> Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Received,
    Fetching,
    Fetched,
    Printing,
    Printed,
    CleanupScheduled,
    Done,
    FailedFetch,
    FailedPrint,
}

impl JobState {
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        matches!(
            (self, next),
            (Received, Fetching)
                | (Received, Printing)
                | (Fetching, Fetched)
                | (Fetching, FailedFetch)
                | (Fetched, Printing)
                | (Printing, Printed)
                | (Printing, FailedPrint)
                | (Printed, CleanupScheduled)
                | (Printed, Done)
                | (CleanupScheduled, Done)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Done | JobState::FailedFetch | JobState::FailedPrint
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Received => write!(f, "RECEIVED"),
            JobState::Fetching => write!(f, "FETCHING"),
            JobState::Fetched => write!(f, "FETCHED"),
            JobState::Printing => write!(f, "PRINTING"),
            JobState::Printed => write!(f, "PRINTED"),
            JobState::CleanupScheduled => write!(f, "CLEANUP_SCHEDULED"),
            JobState::Done => write!(f, "DONE"),
            JobState::FailedFetch => write!(f, "FAILED_FETCH"),
            JobState::FailedPrint => write!(f, "FAILED_PRINT"),
        }
    }
}

/// In-flight print job (lives for the duration of one request)
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub request: PrintJobRequest,
    pub state: JobState,
    pub received_at: i64, // epoch ms
    pub finished_at: Option<i64>,
    pub document: Option<TemporaryDocument>,
}

impl PrintJob {
    pub fn new(request: PrintJobRequest, received_at: i64) -> Self {
        Self {
            request,
            state: JobState::Received,
            received_at,
            finished_at: None,
            document: None,
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow
    pub fn transition(&mut self, next: JobState, now: i64) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        self.state = next;
        if next.is_terminal() {
            self.finished_at = Some(now);
        }
        Ok(())
    }

    pub fn badge_id(&self) -> Option<BadgeId> {
        match &self.request.source {
            JobSource::Remote(id) => Some(*id),
            JobSource::Local(_) => None,
        }
    }
}

/// Final classification reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Success,
    FetchError,
    PrintError,
    ValidationError,
}

/// Result of one request. Never persisted beyond the response.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub status: JobStatus,
    /// Caller-safe message
    pub message: String,
    /// `None` when validation rejected the request before a job existed
    pub final_state: Option<JobState>,
    pub received_at: i64,
    pub finished_at: i64,
    pub badge_id: Option<BadgeId>,
    pub file: Option<String>,
    pub source_url: Option<String>,
    pub printer_output: Option<String>,
}

impl JobOutcome {
    pub fn validation_error(message: impl Into<String>, now: i64) -> Self {
        Self {
            status: JobStatus::ValidationError,
            message: message.into(),
            final_state: None,
            received_at: now,
            finished_at: now,
            badge_id: None,
            file: None,
            source_url: None,
            printer_output: None,
        }
    }

    /// Build an outcome from a job that reached a terminal state
    pub fn from_job(job: &PrintJob, status: JobStatus, message: impl Into<String>) -> Self {
        let file = match &job.request.source {
            JobSource::Remote(_) => job
                .document
                .as_ref()
                .and_then(|d| d.file_name())
                .map(str::to_string),
            JobSource::Local(path) => Some(path.display().to_string()),
        };

        Self {
            status,
            message: message.into(),
            final_state: Some(job.state),
            received_at: job.received_at,
            finished_at: job.finished_at.unwrap_or(job.received_at),
            badge_id: job.badge_id(),
            file,
            source_url: None,
            printer_output: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_id_parse() {
        assert_eq!(BadgeId::parse("42").unwrap().get(), 42);
        assert_eq!(BadgeId::parse("007").unwrap().get(), 7);

        for raw in ["0", "-1", "abc", "12abc", "", " 5", "1.5", "99999999999999999999999"] {
            assert!(BadgeId::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_remote_happy_path_transitions() {
        let mut job = PrintJob::new(PrintJobRequest::remote(BadgeId::new(7).unwrap()), 1000);

        for (i, next) in [
            JobState::Fetching,
            JobState::Fetched,
            JobState::Printing,
            JobState::Printed,
            JobState::CleanupScheduled,
        ]
        .into_iter()
        .enumerate()
        {
            job.transition(next, 1000 + i as i64).unwrap();
            assert!(job.finished_at.is_none());
        }

        job.transition(JobState::Done, 2000).unwrap();
        assert_eq!(job.state, JobState::Done);
        assert_eq!(job.finished_at, Some(2000));
    }

    #[test]
    fn test_local_job_skips_fetch() {
        let mut job = PrintJob::new(PrintJobRequest::local("/tmp/a.pdf"), 0);
        job.transition(JobState::Printing, 1).unwrap();
        job.transition(JobState::Printed, 2).unwrap();
        job.transition(JobState::Done, 3).unwrap();
        assert!(job.badge_id().is_none());
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut job = PrintJob::new(PrintJobRequest::remote(BadgeId::new(1).unwrap()), 0);
        job.transition(JobState::Fetching, 1).unwrap();
        job.transition(JobState::FailedFetch, 2).unwrap();

        let err = job.transition(JobState::Printing, 3).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidStateTransition {
                from: "FAILED_FETCH".to_string(),
                to: "PRINTING".to_string(),
            }
        );
        assert_eq!(job.finished_at, Some(2));
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Done.is_terminal());
        assert!(JobState::FailedFetch.is_terminal());
        assert!(JobState::FailedPrint.is_terminal());
        assert!(!JobState::CleanupScheduled.is_terminal());
        assert!(!JobState::Printed.can_transition_to(JobState::Printing));
    }
}
