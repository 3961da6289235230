// Print Subsystem Port
// The OS print spooler modeled as one capability: submit, health, list, status, queue

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Per-submission options forwarded to the spooler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrintOptions {
    /// Destination printer; the spooler default is used when `None`
    pub printer: Option<String>,
    pub copies: Option<u32>,
}

impl PrintOptions {
    pub fn with_default_printer(mut self, default_printer: Option<&str>) -> Self {
        if self.printer.is_none() {
            self.printer = default_printer.map(str::to_string);
        }
        self
    }
}

/// Print subsystem errors
///
/// The `Display` output may contain paths and command lines. Log it; never
/// hand it to a caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrintFailure {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Process exited with code {code:?}: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    /// Exit code 0 but something was written to stderr
    #[error("Process reported errors: {0}")]
    Stderr(String),

    #[error("Process timeout after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Print Subsystem trait
///
/// Implementations:
/// - CommandPrintSubsystem: bounded helper-command invocations (infra-system)
/// - mocks::MockPrintSubsystem: scripted answers for tests
#[async_trait]
pub trait PrintSubsystem: Send + Sync {
    /// Submit a file for printing and return the spooler's stdout
    ///
    /// # Errors
    /// - PrintFailure::NonZeroExit / Stderr if the spooler reports a problem
    /// - PrintFailure::Timeout if the submission exceeds its deadline
    async fn submit(&self, file: &Path, options: &PrintOptions) -> Result<String, PrintFailure>;

    /// Spooler service availability
    async fn check_health(&self) -> Result<String, PrintFailure>;

    /// Configured printers
    async fn list_printers(&self) -> Result<String, PrintFailure>;

    /// Current printer status
    async fn query_status(&self) -> Result<String, PrintFailure>;

    /// Jobs currently held by the spooler
    async fn query_queue(&self) -> Result<String, PrintFailure>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Scripted answer for one operation
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        Success(String),
        Fail(PrintFailure),
    }

    impl MockBehavior {
        fn answer(&self) -> Result<String, PrintFailure> {
            match self {
                MockBehavior::Success(out) => Ok(out.clone()),
                MockBehavior::Fail(e) => Err(e.clone()),
            }
        }
    }

    /// Recorded submission
    #[derive(Debug, Clone)]
    pub struct Submission {
        pub file: PathBuf,
        pub options: PrintOptions,
        /// Whether the file existed when the spooler was called
        pub file_existed: bool,
    }

    struct Script {
        submit: MockBehavior,
        health: MockBehavior,
        list: MockBehavior,
        status: MockBehavior,
        queue: MockBehavior,
    }

    /// Mock Print Subsystem for testing
    pub struct MockPrintSubsystem {
        script: Arc<Mutex<Script>>,
        submissions: Arc<Mutex<Vec<Submission>>>,
        query_count: Arc<Mutex<usize>>,
    }

    impl MockPrintSubsystem {
        pub fn new_success() -> Self {
            Self {
                script: Arc::new(Mutex::new(Script {
                    submit: MockBehavior::Success("request id is Kiosk-1 (1 file(s))".to_string()),
                    health: MockBehavior::Success("CUPS service is running".to_string()),
                    list: MockBehavior::Success("Available printers:\n  - Kiosk".to_string()),
                    status: MockBehavior::Success("printer Kiosk is idle.".to_string()),
                    queue: MockBehavior::Success("Queue empty".to_string()),
                })),
                submissions: Arc::new(Mutex::new(Vec::new())),
                query_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn set_submit(&self, behavior: MockBehavior) {
            self.script.lock().unwrap().submit = behavior;
        }

        pub fn set_health(&self, behavior: MockBehavior) {
            self.script.lock().unwrap().health = behavior;
        }

        pub fn set_all(&self, behavior: MockBehavior) {
            let mut script = self.script.lock().unwrap();
            script.submit = behavior.clone();
            script.health = behavior.clone();
            script.list = behavior.clone();
            script.status = behavior.clone();
            script.queue = behavior;
        }

        pub fn submissions(&self) -> Vec<Submission> {
            self.submissions.lock().unwrap().clone()
        }

        pub fn submit_count(&self) -> usize {
            self.submissions.lock().unwrap().len()
        }

        /// Number of health/list/status/queue calls
        pub fn query_count(&self) -> usize {
            *self.query_count.lock().unwrap()
        }

        fn query(&self, pick: impl Fn(&Script) -> &MockBehavior) -> Result<String, PrintFailure> {
            *self.query_count.lock().unwrap() += 1;
            let script = self.script.lock().unwrap();
            pick(&script).answer()
        }
    }

    #[async_trait]
    impl PrintSubsystem for MockPrintSubsystem {
        async fn submit(
            &self,
            file: &Path,
            options: &PrintOptions,
        ) -> Result<String, PrintFailure> {
            self.submissions.lock().unwrap().push(Submission {
                file: file.to_path_buf(),
                options: options.clone(),
                file_existed: file.exists(),
            });
            let behavior = self.script.lock().unwrap().submit.clone();
            behavior.answer()
        }

        async fn check_health(&self) -> Result<String, PrintFailure> {
            self.query(|s| &s.health)
        }

        async fn list_printers(&self) -> Result<String, PrintFailure> {
            self.query(|s| &s.list)
        }

        async fn query_status(&self) -> Result<String, PrintFailure> {
            self.query(|s| &s.status)
        }

        async fn query_queue(&self) -> Result<String, PrintFailure> {
            self.query(|s| &s.queue)
        }
    }
}
