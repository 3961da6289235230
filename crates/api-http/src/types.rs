//! HTTP Request/Response Types

use chrono::{SecondsFormat, Utc};
use kiosk_print_core::domain::QueueEntry;
use serde::{Deserialize, Serialize};

pub const STATUS_OK: &str = "ok";
pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// Routes listed in the 404 body
pub const AVAILABLE_ENDPOINTS: [&str; 7] = [
    "GET /health",
    "GET /printers",
    "GET /printer-status",
    "GET /print-queue",
    "GET /badge/:id",
    "POST /test-print",
    "GET /queue",
];

/// RFC 3339 UTC with millisecond precision, e.g. `2024-05-01T12:00:00.123Z`
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub service: String,
    pub version: String,
    /// Probe output, or `"unavailable"`
    pub cups: String,
    pub api_url: String,
    pub timestamp: String,
}

/// GET /printers
#[derive(Debug, Clone, Serialize)]
pub struct PrintersResponse {
    pub status: &'static str,
    pub output: String,
    pub timestamp: String,
}

/// GET /printer-status
#[derive(Debug, Clone, Serialize)]
pub struct PrinterStatusResponse {
    pub status: &'static str,
    pub printer_status: String,
    pub timestamp: String,
}

/// GET /print-queue
#[derive(Debug, Clone, Serialize)]
pub struct PrintQueueResponse {
    pub status: &'static str,
    pub print_queue: String,
    pub timestamp: String,
}

/// GET /badge/:id
#[derive(Debug, Clone, Serialize)]
pub struct BadgeResponse {
    pub status: &'static str,
    pub message: String,
    pub id: u64,
    pub file: String,
    /// Upstream URL the badge was fetched from
    pub api_url: String,
    pub timestamp: String,
}

/// POST /test-print
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestPrintRequest {
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub printer: Option<String>,
    #[serde(default)]
    pub copies: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestPrintResponse {
    pub status: &'static str,
    pub message: String,
    pub file: String,
    pub timestamp: String,
}

/// GET /queue
#[derive(Debug, Clone, Serialize)]
pub struct QueueResponse {
    pub queue: Vec<QueueEntry>,
    pub count: usize,
    pub timestamp: String,
}

/// Body of every failed request
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    pub timestamp: String,
}

/// Fallback for unknown routes
#[derive(Debug, Clone, Serialize)]
pub struct NotFoundResponse {
    pub status: &'static str,
    pub message: String,
    pub available_endpoints: Vec<&'static str>,
    pub timestamp: String,
}
