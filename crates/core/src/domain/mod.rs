// Domain Layer - Pure job lifecycle and temp-area policy

pub mod document;
pub mod error;
pub mod job;

// Re-exports
pub use document::{badge_file_name, is_document, QueueEntry, TemporaryDocument, DOCUMENT_EXTENSIONS};
pub use error::DomainError;
pub use job::{BadgeId, JobOutcome, JobSource, JobState, JobStatus, PrintJob, PrintJobRequest};
