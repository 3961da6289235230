//! Shared harness: a real daemon stack (HTTP fetcher, command subsystem,
//! axum server) on loopback, fed by a local upstream badge API.
#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use kiosk_print_api_http::{ApiServer, ApiServerConfig, AppStateInner};
use kiosk_print_core::application::{
    shutdown_channel, CleanupScheduler, CoordinatorSettings, JobCoordinator, QueueInspector,
    ShutdownSender,
};
use kiosk_print_core::port::time_provider::SystemTimeProvider;
use kiosk_print_core::port::TimeProvider;
use kiosk_print_infra_http::{FetchLimits, HttpFetcher};
use kiosk_print_infra_system::{CommandPrintSubsystem, CommandTimeouts};
use serde_json::Value;
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub const BADGE_PDF: &[u8] = b"%PDF-1.4\n% kiosk badge\n%%EOF\n";

/// Upstream answers after 5s
pub const SLOW_BADGE: u64 = 900;
/// Upstream declares a body over the test size limit
pub const HUGE_BADGE: u64 = 901;
/// Upstream streams past the size limit without a Content-Length
pub const STREAMED_HUGE_BADGE: u64 = 902;
/// Upstream answers 404
pub const MISSING_BADGE: u64 = 903;

pub const TEST_MAX_BYTES: u64 = 1024;

// ============================================================================
// Upstream badge API
// ============================================================================

pub struct Upstream {
    /// Base URL the daemon is configured with
    pub api_url: String,
    hits: Arc<AtomicUsize>,
}

impl Upstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn badge(State(hits): State<Arc<AtomicUsize>>, Path(id): Path<u64>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    match id {
        SLOW_BADGE => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            BADGE_PDF.into_response()
        }
        HUGE_BADGE => vec![b'x'; 4096].into_response(),
        STREAMED_HUGE_BADGE => {
            let chunks = (0..4).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![b'y'; 600])));
            Body::from_stream(futures::stream::iter(chunks)).into_response()
        }
        MISSING_BADGE => StatusCode::NOT_FOUND.into_response(),
        _ => BADGE_PDF.into_response(),
    }
}

pub async fn spawn_upstream() -> Upstream {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route("/api/app/totem/badge/{id}", get(badge))
        .with_state(hits.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Upstream {
        // Trailing slash on purpose: the coordinator must normalize it
        api_url: format!("http://{addr}/api/"),
        hits,
    }
}

// ============================================================================
// Printing helper scripts (run as `sh -c <script> sh <args...>`)
// ============================================================================

/// Behaves like the real helper; appends every submission to `log`
pub fn healthy_helper(log: &FsPath) -> String {
    format!(
        r#"case "$1" in
  --check-cups) echo "CUPS service is running" ;;
  --list) printf 'Available printers:\n  - Kiosk\n' ;;
  --status) echo "printer Kiosk is idle." ;;
  --queue) echo "Queue empty" ;;
  *)
    [ -f "$1" ] || {{ echo "no such file: $1" >&2; exit 2; }}
    echo "$@" >> '{}'
    echo "request id is Kiosk-1 (1 file(s))" ;;
esac"#,
        log.display()
    )
}

/// Fails every operation the way a broken spooler does
pub const BROKEN_HELPER: &str =
    r#"echo "python3 utils/printer.py: lp: Unable to connect to CUPS server" >&2; exit 1"#;

// ============================================================================
// Daemon under test
// ============================================================================

pub struct KioskOptions {
    pub cleanup_delay: Duration,
    pub fetch_timeout: Duration,
    /// `None` selects the healthy helper
    pub helper_script: Option<String>,
    pub default_printer: Option<String>,
    /// Keep the temp area under the test's cwd, addressed by a relative path
    pub relative_temp_dir: bool,
    /// Run the helper from this directory instead of the test's cwd
    pub helper_working_dir: Option<PathBuf>,
}

impl Default for KioskOptions {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_secs(1),
            fetch_timeout: Duration::from_millis(500),
            helper_script: None,
            default_printer: None,
            relative_temp_dir: false,
            helper_working_dir: None,
        }
    }
}

pub struct Kiosk {
    pub base_url: String,
    pub temp_dir: PathBuf,
    pub submit_log: PathBuf,
    pub scratch: TempDir,
    pub cleanup: Arc<CleanupScheduler>,
    http: reqwest::Client,
    shutdown_tx: ShutdownSender,
    server: JoinHandle<std::io::Result<()>>,
}

impl Kiosk {
    pub async fn start(upstream: &Upstream, options: KioskOptions) -> Self {
        let scratch = if options.relative_temp_dir {
            TempDir::new_in(".").unwrap()
        } else {
            TempDir::new().unwrap()
        };
        let temp_dir = scratch.path().join("files");
        let submit_log = std::path::absolute(scratch.path().join("submissions.log")).unwrap();
        let script = options
            .helper_script
            .unwrap_or_else(|| healthy_helper(&submit_log));

        let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let fetcher = Arc::new(
            HttpFetcher::new(
                FetchLimits {
                    timeout: options.fetch_timeout,
                    max_bytes: TEST_MAX_BYTES,
                },
                time_provider.clone(),
            )
            .unwrap(),
        );
        let mut subsystem = CommandPrintSubsystem::new(
            "sh",
            vec!["-c".to_string(), script, "sh".to_string()],
            CommandTimeouts {
                submit: Duration::from_secs(5),
                query: Duration::from_secs(5),
            },
            time_provider.clone(),
        );
        if let Some(dir) = options.helper_working_dir {
            subsystem = subsystem.with_working_dir(dir);
        }
        let subsystem = Arc::new(subsystem);
        let cleanup = Arc::new(CleanupScheduler::new(options.cleanup_delay));

        let coordinator = JobCoordinator::new(
            CoordinatorSettings {
                api_url: upstream.api_url.clone(),
                temp_dir: temp_dir.clone(),
                default_printer: options.default_printer,
            },
            fetcher,
            subsystem.clone(),
            cleanup.clone(),
            time_provider,
        );
        let inspector = QueueInspector::new(temp_dir.clone(), upstream.api_url.clone(), subsystem);

        let state = Arc::new(AppStateInner {
            coordinator: Arc::new(coordinator),
            inspector: Arc::new(inspector),
        });
        let config = ApiServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let server = ApiServer::bind(&config, state).await.unwrap();
        let addr = server.local_addr().unwrap();

        let (shutdown_tx, token) = shutdown_channel();
        let server = tokio::spawn(server.serve(token.cancelled()));

        Self {
            base_url: format!("http://{addr}"),
            temp_dir,
            submit_log,
            scratch,
            cleanup,
            http: reqwest::Client::new(),
            shutdown_tx,
            server,
        }
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (u16, Value) {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    /// Lines the healthy helper recorded, one per submission
    pub fn submissions(&self) -> Vec<String> {
        std::fs::read_to_string(&self.submit_log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Stop the server the way the daemon does, then flush pending cleanups
    pub async fn shutdown(&mut self) -> usize {
        self.shutdown_tx.shutdown();
        (&mut self.server).await.unwrap().unwrap();
        self.cleanup.flush().await
    }
}

/// Poll until `path` disappears or `within` elapses
pub async fn wait_for_removal(path: &FsPath, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if !path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !path.exists()
}

pub fn assert_timestamp(body: &Value) {
    let ts = body["timestamp"].as_str().expect("timestamp present");
    chrono::DateTime::parse_from_rfc3339(ts).expect("RFC 3339 timestamp");
}
