// Status/Queue Inspector - read-only views over the temp area and the spooler

use crate::domain::{is_document, QueueEntry};
use crate::error::{AppError, Result};
use crate::port::PrintSubsystem;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of the spooler health probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsystemHealth {
    /// Probe output, passed through untouched
    Available(String),
    /// Failure cause, for the log only
    Unavailable(String),
}

/// Service descriptor plus live subsystem status
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub service: String,
    pub version: String,
    pub api_url: String,
    pub subsystem: SubsystemHealth,
}

/// Queue Inspector
///
/// Nothing is cached: every call re-reads the directory or re-queries the
/// spooler. Runs concurrently with the coordinator writing and deleting files.
pub struct QueueInspector {
    temp_dir: PathBuf,
    api_url: String,
    subsystem: Arc<dyn PrintSubsystem>,
}

impl QueueInspector {
    pub fn new(
        temp_dir: impl Into<PathBuf>,
        api_url: impl Into<String>,
        subsystem: Arc<dyn PrintSubsystem>,
    ) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            api_url: api_url.into(),
            subsystem,
        }
    }

    /// List documents currently in the temp area, oldest first
    ///
    /// A missing directory is an empty queue. Entries deleted between the
    /// directory scan and the metadata read are skipped.
    pub async fn list_queue(&self) -> Result<Vec<QueueEntry>> {
        let mut dir = match tokio::fs::read_dir(&self.temp_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.temp_dir.display(), "Temp directory missing, queue empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(introspection(&self.temp_dir, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| introspection(&self.temp_dir, e))?
        {
            let path = entry.path();
            if !is_document(&path) {
                continue;
            }

            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(introspection(&path, e)),
            };
            if !meta.is_file() {
                continue;
            }

            let modified = meta.modified().map_err(|e| introspection(&path, e))?;
            // Not every filesystem records birth time
            let created = meta.created().unwrap_or(modified);

            entries.push(QueueEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size_bytes: meta.len(),
                created_at: DateTime::<Utc>::from(created),
                modified_at: DateTime::<Utc>::from(modified),
            });
        }

        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }

    /// Service descriptor + live spooler probe. Never fails.
    pub async fn health(&self) -> HealthReport {
        let subsystem = match self.subsystem.check_health().await {
            Ok(output) => SubsystemHealth::Available(output),
            Err(e) => {
                warn!(error = %e, "Printing subsystem health check failed");
                SubsystemHealth::Unavailable(e.to_string())
            }
        };

        HealthReport {
            service: crate::SERVICE_NAME.to_string(),
            version: crate::VERSION.to_string(),
            api_url: self.api_url.clone(),
            subsystem,
        }
    }

    pub async fn printers(&self) -> Result<String> {
        Ok(self.subsystem.list_printers().await?)
    }

    pub async fn printer_status(&self) -> Result<String> {
        Ok(self.subsystem.query_status().await?)
    }

    pub async fn spooler_queue(&self) -> Result<String> {
        Ok(self.subsystem.query_queue().await?)
    }
}

fn introspection(path: &std::path::Path, e: std::io::Error) -> AppError {
    AppError::Introspection(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::print_subsystem::mocks::{MockBehavior, MockPrintSubsystem};
    use crate::port::PrintFailure;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn inspector(dir: PathBuf, subsystem: Arc<MockPrintSubsystem>) -> QueueInspector {
        QueueInspector::new(dir, "https://api.example.com", subsystem)
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_queue() {
        let dir = TempDir::new().unwrap();
        let inspector = inspector(
            dir.path().join("does-not-exist"),
            Arc::new(MockPrintSubsystem::new_success()),
        );

        let queue = inspector.list_queue().await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_lists_documents_only() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("badge_1_100.pdf"), b"%PDF-1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        std::fs::write(dir.path().join("UPPER.PDF"), b"%PDF-12").unwrap();

        let inspector = inspector(
            dir.path().to_path_buf(),
            Arc::new(MockPrintSubsystem::new_success()),
        );
        let queue = inspector.list_queue().await.unwrap();

        let mut names: Vec<_> = queue.iter().map(|e| e.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["UPPER.PDF", "badge_1_100.pdf"]);

        let badge = queue.iter().find(|e| e.name == "badge_1_100.pdf").unwrap();
        assert_eq!(badge.size_bytes, 6);
        assert!(badge.modified_at >= badge.created_at - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_queue_ordered_oldest_first() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("b_old.pdf");
        let new = dir.path().join("a_new.pdf");
        std::fs::write(&old, b"1").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        std::fs::write(&new, b"2").unwrap();

        // Birth time may be unavailable; pin modification times too.
        let base = SystemTime::now() - Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(base)
            .unwrap();

        let inspector = inspector(
            dir.path().to_path_buf(),
            Arc::new(MockPrintSubsystem::new_success()),
        );
        let queue = inspector.list_queue().await.unwrap();
        assert_eq!(queue[0].name, "b_old.pdf");
        assert_eq!(queue[1].name, "a_new.pdf");
    }

    #[tokio::test]
    async fn test_health_ok_and_degraded() {
        let subsystem = Arc::new(MockPrintSubsystem::new_success());
        let inspector = inspector(PathBuf::from("files"), subsystem.clone());

        let report = inspector.health().await;
        assert_eq!(report.service, crate::SERVICE_NAME);
        assert_eq!(
            report.subsystem,
            SubsystemHealth::Available("CUPS service is running".to_string())
        );

        subsystem.set_health(MockBehavior::Fail(PrintFailure::NonZeroExit {
            code: Some(1),
            stderr: String::new(),
        }));
        let report = inspector.health().await;
        assert!(matches!(report.subsystem, SubsystemHealth::Unavailable(_)));
        assert_eq!(report.api_url, "https://api.example.com");
    }

    #[tokio::test]
    async fn test_pass_through_queries_are_stable() {
        let subsystem = Arc::new(MockPrintSubsystem::new_success());
        let inspector = inspector(PathBuf::from("files"), subsystem.clone());

        let first = inspector.printers().await.unwrap();
        let second = inspector.printers().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            inspector.printer_status().await.unwrap(),
            inspector.printer_status().await.unwrap()
        );
        assert_eq!(subsystem.query_count(), 4);

        subsystem.set_all(MockBehavior::Fail(PrintFailure::Timeout(15_000)));
        let err = inspector.spooler_queue().await.unwrap_err();
        assert!(matches!(err, AppError::Print(PrintFailure::Timeout(_))));
    }
}
