// Job Coordinator - fetch -> submit -> deferred cleanup for one request

use crate::application::cleanup::CleanupScheduler;
use crate::application::constants::{BADGE_API_PATH, MAX_COPIES};
use crate::domain::{
    badge_file_name, BadgeId, DomainError, JobOutcome, JobState, JobStatus, PrintJob,
    PrintJobRequest,
};
use crate::port::{DocumentFetcher, PrintOptions, PrintSubsystem, TimeProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

const MSG_BADGE_PRINTED: &str = "Badge sent to printer.";
const MSG_FILE_PRINTED: &str = "File sent to printer.";
const MSG_INVALID_ID: &str = "Invalid ID.";
const MSG_FILE_PATH_REQUIRED: &str = "file_path is required.";
const MSG_FILE_NOT_FOUND: &str = "File not found.";
const MSG_INVALID_COPIES: &str = "copies must be between 1 and 99.";
const MSG_FETCH_FAILED: &str = "Failed to download the badge.";
const MSG_PRINT_FAILED: &str = "Printing failed.";

/// Coordinator settings (sliced out of the daemon config)
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Upstream API base URL, e.g. `https://events.example.com/api`
    pub api_url: String,
    /// Directory receiving fetched badges
    pub temp_dir: PathBuf,
    /// Printer used when a request does not name one
    pub default_printer: Option<String>,
}

/// Job Coordinator
///
/// Owns the temp-file naming and lifetime policy. Jobs are independent: no
/// lock serializes them, the spooler's own queue orders physical output.
pub struct JobCoordinator {
    settings: CoordinatorSettings,
    fetcher: Arc<dyn DocumentFetcher>,
    subsystem: Arc<dyn PrintSubsystem>,
    cleanup: Arc<CleanupScheduler>,
    time_provider: Arc<dyn TimeProvider>,
}

impl JobCoordinator {
    pub fn new(
        settings: CoordinatorSettings,
        fetcher: Arc<dyn DocumentFetcher>,
        subsystem: Arc<dyn PrintSubsystem>,
        cleanup: Arc<CleanupScheduler>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            subsystem,
            cleanup,
            time_provider,
        }
    }

    pub fn cleanup(&self) -> &CleanupScheduler {
        &self.cleanup
    }

    /// `<api_url>/app/totem/badge/<id>`
    pub fn badge_url(&self, id: BadgeId) -> String {
        format!(
            "{}/{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            BADGE_API_PATH,
            id
        )
    }

    /// Unique temp path for this badge at `now_millis`
    pub fn temp_path_for(&self, id: BadgeId, now_millis: i64) -> PathBuf {
        self.settings.temp_dir.join(badge_file_name(id, now_millis))
    }

    /// Fetch and print a remote badge
    ///
    /// `raw_id` is the untrusted path segment. Anything but a positive integer
    /// yields `ValidationError` before any fetch or subprocess call.
    pub async fn handle_badge_job(&self, raw_id: &str) -> JobOutcome {
        let now = self.time_provider.now_millis();
        let id = match BadgeId::parse(raw_id) {
            Ok(id) => id,
            Err(e) => {
                warn!(raw_id = %raw_id, error = %e, "Rejected badge request");
                return JobOutcome::validation_error(MSG_INVALID_ID, now);
            }
        };

        let span = info_span!("badge_job", badge_id = %id);
        self.run_badge_job(id, now).instrument(span).await
    }

    async fn run_badge_job(&self, id: BadgeId, received_at: i64) -> JobOutcome {
        let mut job = PrintJob::new(PrintJobRequest::remote(id), received_at);
        let url = self.badge_url(id);
        let destination = self.temp_path_for(id, received_at);

        info!(url = %url, file = %destination.display(), "Badge job received");

        if let Err(e) = self.advance(&mut job, JobState::Fetching) {
            return self.internal_failure(&job, e, Some(&url));
        }

        match self.fetcher.fetch(&url, &destination).await {
            Ok(document) => {
                info!(size_bytes = document.size_bytes, "Badge downloaded");
                job.document = Some(document);
                if let Err(e) = self.advance(&mut job, JobState::Fetched) {
                    return self.internal_failure(&job, e, Some(&url));
                }
            }
            Err(e) => {
                // A partial file may remain; it is left for the queue listing.
                error!(url = %url, error = %e, "Badge download failed");
                self.record_failure(&mut job, JobState::FailedFetch);
                let mut outcome = JobOutcome::from_job(&job, JobStatus::FetchError, MSG_FETCH_FAILED);
                outcome.source_url = Some(url);
                return outcome;
            }
        }

        let options = PrintOptions::default().with_default_printer(self.default_printer());
        let mut outcome = self
            .print_document(&mut job, &destination, &options, MSG_BADGE_PRINTED)
            .await;
        outcome.source_url = Some(url);

        if outcome.is_success() {
            self.cleanup.schedule(destination);
            if let Err(e) = self
                .advance(&mut job, JobState::CleanupScheduled)
                .and_then(|_| self.advance(&mut job, JobState::Done))
            {
                return self.internal_failure(&job, e, outcome.source_url.as_deref());
            }
            outcome.final_state = Some(job.state);
            outcome.finished_at = job.finished_at.unwrap_or(outcome.finished_at);
            info!(delay_ms = self.cleanup.delay().as_millis() as u64, "Badge printed, cleanup scheduled");
        }

        outcome
    }

    /// Print a file that is already on disk. The caller keeps ownership: no
    /// cleanup is scheduled.
    pub async fn handle_local_print(&self, file_path: &str, options: PrintOptions) -> JobOutcome {
        let now = self.time_provider.now_millis();

        if file_path.trim().is_empty() {
            return JobOutcome::validation_error(MSG_FILE_PATH_REQUIRED, now);
        }
        if let Some(copies) = options.copies {
            if copies == 0 || copies > MAX_COPIES {
                warn!(error = %DomainError::InvalidCopies(copies), "Rejected local print request");
                return JobOutcome::validation_error(MSG_INVALID_COPIES, now);
            }
        }

        let path = PathBuf::from(file_path);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) | Err(_) => {
                warn!(file = %path.display(), "Local print target missing or not a file");
                return JobOutcome::validation_error(MSG_FILE_NOT_FOUND, now);
            }
        }

        let options = options.with_default_printer(self.default_printer());
        let span = info_span!("local_job", file = %path.display());
        async {
            let mut job = PrintJob::new(PrintJobRequest::local(path.clone()), now);
            info!("Local print job received");
            let outcome = self
                .print_document(&mut job, &path, &options, MSG_FILE_PRINTED)
                .await;
            if !outcome.is_success() {
                return outcome;
            }
            match self.advance(&mut job, JobState::Done) {
                Ok(()) => JobOutcome {
                    final_state: Some(job.state),
                    finished_at: job.finished_at.unwrap_or(outcome.finished_at),
                    ..outcome
                },
                Err(e) => self.internal_failure(&job, e, None),
            }
        }
        .instrument(span)
        .await
    }

    /// Printing -> Printed | FailedPrint
    async fn print_document(
        &self,
        job: &mut PrintJob,
        file: &Path,
        options: &PrintOptions,
        success_message: &str,
    ) -> JobOutcome {
        if let Err(e) = self.advance(job, JobState::Printing) {
            return self.internal_failure(job, e, None);
        }

        // The helper may run from another working directory
        let target = match std::path::absolute(file) {
            Ok(target) => target,
            Err(e) => {
                error!(file = %file.display(), error = %e, "Cannot resolve document path");
                self.record_failure(job, JobState::FailedPrint);
                return JobOutcome::from_job(job, JobStatus::PrintError, MSG_PRINT_FAILED);
            }
        };

        match self.subsystem.submit(&target, options).await {
            Ok(stdout) => {
                if let Err(e) = self.advance(job, JobState::Printed) {
                    return self.internal_failure(job, e, None);
                }
                info!(output = %stdout.trim(), "Print submitted");
                let mut outcome = JobOutcome::from_job(job, JobStatus::Success, success_message);
                outcome.printer_output = Some(stdout);
                outcome
            }
            Err(e) => {
                // Full cause (may hold paths/commands) stays in the log.
                error!(error = %e, "Print submission failed");
                self.record_failure(job, JobState::FailedPrint);
                JobOutcome::from_job(job, JobStatus::PrintError, MSG_PRINT_FAILED)
            }
        }
    }

    fn advance(&self, job: &mut PrintJob, next: JobState) -> Result<(), DomainError> {
        job.transition(next, self.time_provider.now_millis())
    }

    /// Move into a failure state; the outcome is already an error either way
    fn record_failure(&self, job: &mut PrintJob, failed: JobState) {
        if let Err(e) = self.advance(job, failed) {
            error!(state = %job.state, error = %e, "Job lifecycle violated");
        }
    }

    /// Lifecycle bug: report as a print error without leaking details
    fn internal_failure(&self, job: &PrintJob, e: DomainError, url: Option<&str>) -> JobOutcome {
        error!(state = %job.state, error = %e, "Job lifecycle violated");
        let status = match job.state {
            JobState::Received | JobState::Fetching => JobStatus::FetchError,
            _ => JobStatus::PrintError,
        };
        let message = match status {
            JobStatus::FetchError => MSG_FETCH_FAILED,
            _ => MSG_PRINT_FAILED,
        };
        let mut outcome = JobOutcome::from_job(job, status, message);
        outcome.finished_at = self.time_provider.now_millis();
        outcome.source_url = url.map(str::to_string);
        outcome
    }

    fn default_printer(&self) -> Option<&str> {
        self.settings.default_printer.as_deref()
    }
}
