// Command-driven print subsystem
// reason: tokio::process for non-blocking, killable helper invocations
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, warn};

use kiosk_print_core::application::constants::{DEFAULT_PRINT_TIMEOUT, DEFAULT_QUERY_TIMEOUT};
use kiosk_print_core::port::{PrintFailure, PrintOptions, PrintSubsystem, TimeProvider};

const FLAG_CHECK_CUPS: &str = "--check-cups";
const FLAG_LIST: &str = "--list";
const FLAG_STATUS: &str = "--status";
const FLAG_QUEUE: &str = "--queue";
const FLAG_PRINTER: &str = "--printer";
const FLAG_COPIES: &str = "--copies";

/// Environment variables passed through to the helper by default
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "LC_ALL"];

/// Current process environment, skipping entries that are not valid UTF-8
fn process_env() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}

/// Per-operation deadlines
#[derive(Debug, Clone, Copy)]
pub struct CommandTimeouts {
    pub submit: Duration,
    pub query: Duration,
}

impl Default for CommandTimeouts {
    fn default() -> Self {
        Self {
            submit: DEFAULT_PRINT_TIMEOUT,
            query: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Print subsystem backed by an external helper command
///
/// Every operation is one bounded invocation of
/// `<program> <base_args...> <operation args...>`. The helper is spawned
/// directly (no shell), with a cleared environment rebuilt from the
/// allowlist, and killed if it overruns its deadline.
pub struct CommandPrintSubsystem {
    program: String,
    base_args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeouts: CommandTimeouts,
    env_allowlist: Vec<String>,
    time_provider: Arc<dyn TimeProvider>,
}

impl CommandPrintSubsystem {
    /// Create a new command print subsystem
    ///
    /// # Arguments
    /// * `program` - Helper executable, e.g. `python3`
    /// * `base_args` - Arguments placed before the operation, e.g. `["utils/printer.py"]`
    /// * `timeouts` - Submit and query deadlines
    /// * `time_provider` - Time provider for duration tracking
    ///
    /// # Example
    /// ```ignore
    /// let subsystem = CommandPrintSubsystem::new(
    ///     "python3",
    ///     vec!["utils/printer.py".to_string()],
    ///     CommandTimeouts::default(),
    ///     Arc::new(SystemTimeProvider),
    /// );
    /// ```
    pub fn new(
        program: impl Into<String>,
        base_args: Vec<String>,
        timeouts: CommandTimeouts,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            program: program.into(),
            base_args,
            working_dir: None,
            timeouts,
            env_allowlist: DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
            time_provider,
        }
    }

    /// Run the helper from `dir` (relative helper paths resolve against it)
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env_allowlist(mut self, allowlist: Vec<String>) -> Self {
        self.env_allowlist = allowlist;
        self
    }

    /// Filter environment variables to allowlist only
    fn filter_env(
        &self,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> HashMap<String, String> {
        vars.into_iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    /// Operation arguments for a submission
    fn submit_args(file: &Path, options: &PrintOptions) -> Vec<String> {
        let mut args = vec![file.display().to_string()];
        if let Some(printer) = &options.printer {
            args.push(FLAG_PRINTER.to_string());
            args.push(printer.clone());
        }
        if let Some(copies) = options.copies {
            args.push(FLAG_COPIES.to_string());
            args.push(copies.to_string());
        }
        args
    }

    /// Spawn the helper and wait for output within `deadline`
    async fn spawn_and_wait(
        &self,
        args: &[String],
        deadline: Duration,
    ) -> Result<std::process::Output, PrintFailure> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(args)
            .env_clear()
            .envs(self.filter_env(process_env()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let child = command
            .spawn()
            .map_err(|e| PrintFailure::SpawnFailed(e.to_string()))?;

        // On timeout the child future is dropped, which kills the process.
        match timeout(deadline, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(PrintFailure::IoError(e.to_string())),
            Err(_) => Err(PrintFailure::Timeout(deadline.as_millis() as u64)),
        }
    }

    /// Map process output onto the failure taxonomy
    ///
    /// Non-empty stderr is a failure even with exit code 0.
    fn classify(output: std::process::Output) -> Result<String, PrintFailure> {
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(PrintFailure::NonZeroExit {
                code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            return Err(PrintFailure::Stderr(stderr));
        }
        Ok(stdout)
    }

    /// One bounded invocation, logged start to finish
    async fn run(&self, operation: &str, args: &[String], deadline: Duration) -> Result<String, PrintFailure> {
        let start_time = self.time_provider.now_millis();

        info!(
            operation = %operation,
            program = %self.program,
            args = ?args,
            timeout_ms = deadline.as_millis() as u64,
            "Starting print subsystem command"
        );

        let result = self
            .spawn_and_wait(args, deadline)
            .await
            .and_then(Self::classify);

        let duration_ms = self.time_provider.now_millis() - start_time;
        match &result {
            Ok(_) => info!(
                operation = %operation,
                duration_ms = %duration_ms,
                "Print subsystem command completed"
            ),
            Err(e) => warn!(
                operation = %operation,
                duration_ms = %duration_ms,
                error = %e,
                "Print subsystem command failed"
            ),
        }

        result
    }
}

#[async_trait]
impl PrintSubsystem for CommandPrintSubsystem {
    async fn submit(&self, file: &Path, options: &PrintOptions) -> Result<String, PrintFailure> {
        let args = Self::submit_args(file, options);
        self.run("submit", &args, self.timeouts.submit).await
    }

    async fn check_health(&self) -> Result<String, PrintFailure> {
        self.run("health", &[FLAG_CHECK_CUPS.to_string()], self.timeouts.query)
            .await
    }

    async fn list_printers(&self) -> Result<String, PrintFailure> {
        self.run("list", &[FLAG_LIST.to_string()], self.timeouts.query)
            .await
    }

    async fn query_status(&self) -> Result<String, PrintFailure> {
        self.run("status", &[FLAG_STATUS.to_string()], self.timeouts.query)
            .await
    }

    async fn query_queue(&self) -> Result<String, PrintFailure> {
        self.run("queue", &[FLAG_QUEUE.to_string()], self.timeouts.query)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_print_core::port::time_provider::SystemTimeProvider;

    /// `sh -c <script> sh <args...>`: the operation args land in `$1..`
    fn shell(script: &str, timeouts: CommandTimeouts) -> CommandPrintSubsystem {
        CommandPrintSubsystem::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            timeouts,
            Arc::new(SystemTimeProvider),
        )
    }

    #[tokio::test]
    async fn test_submit_success_returns_stdout() {
        let subsystem = shell("echo \"queued $1\"", CommandTimeouts::default());

        let out = subsystem
            .submit(Path::new("files/badge_1_2.pdf"), &PrintOptions::default())
            .await
            .unwrap();

        assert_eq!(out.trim(), "queued files/badge_1_2.pdf");
    }

    #[tokio::test]
    async fn test_submit_forwards_options() {
        let subsystem = shell("echo \"$@\"", CommandTimeouts::default());
        let options = PrintOptions {
            printer: Some("Kiosk_A".to_string()),
            copies: Some(2),
        };

        let out = subsystem.submit(Path::new("a.pdf"), &options).await.unwrap();
        assert_eq!(out.trim(), "a.pdf --printer Kiosk_A --copies 2");
    }

    #[tokio::test]
    async fn test_query_flags() {
        let subsystem = shell("echo \"$1\"", CommandTimeouts::default());

        assert_eq!(subsystem.check_health().await.unwrap().trim(), "--check-cups");
        assert_eq!(subsystem.list_printers().await.unwrap().trim(), "--list");
        assert_eq!(subsystem.query_status().await.unwrap().trim(), "--status");
        assert_eq!(subsystem.query_queue().await.unwrap().trim(), "--queue");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let subsystem = shell("echo 'lp: printer offline' >&2; exit 3", CommandTimeouts::default());

        let err = subsystem.check_health().await.unwrap_err();
        assert_eq!(
            err,
            PrintFailure::NonZeroExit {
                code: Some(3),
                stderr: "lp: printer offline".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_stderr_with_zero_exit_is_failure() {
        let subsystem = shell("echo done; echo 'warning: low toner' >&2", CommandTimeouts::default());

        let err = subsystem
            .submit(Path::new("a.pdf"), &PrintOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, PrintFailure::Stderr("warning: low toner".to_string()));
    }

    #[tokio::test]
    async fn test_timeout_kills_helper() {
        let subsystem = shell(
            "sleep 10",
            CommandTimeouts {
                submit: Duration::from_millis(100),
                query: Duration::from_millis(100),
            },
        );

        let started = std::time::Instant::now();
        let err = subsystem.list_printers().await.unwrap_err();

        assert_eq!(err, PrintFailure::Timeout(100));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let subsystem = CommandPrintSubsystem::new(
            "/nonexistent/kiosk-printer-helper",
            vec![],
            CommandTimeouts::default(),
            Arc::new(SystemTimeProvider),
        );

        let err = subsystem.query_status().await.unwrap_err();
        assert!(matches!(err, PrintFailure::SpawnFailed(_)));
    }

    #[tokio::test]
    async fn test_working_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let subsystem = shell("pwd", CommandTimeouts::default()).with_working_dir(dir.path());

        let out = subsystem.query_status().await.unwrap();
        let reported = std::fs::canonicalize(out.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_env_filtering() {
        let subsystem = shell("true", CommandTimeouts::default())
            .with_env_allowlist(vec!["ALLOWED_VAR".to_string()]);

        let filtered = subsystem.filter_env(vec![
            ("ALLOWED_VAR".to_string(), "value1".to_string()),
            ("BLOCKED_VAR".to_string(), "value2".to_string()),
        ]);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("ALLOWED_VAR"));
        assert!(!filtered.contains_key("BLOCKED_VAR"));
    }
}
