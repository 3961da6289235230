//! HTTP Handlers
//!
//! Thin adapters: parse the request, call the coordinator or the inspector,
//! shape the JSON body.

use crate::error::ApiError;
use crate::types::{
    timestamp, BadgeResponse, HealthResponse, NotFoundResponse, PrintQueueResponse,
    PrinterStatusResponse, PrintersResponse, QueueResponse, TestPrintRequest, TestPrintResponse,
    AVAILABLE_ENDPOINTS, STATUS_ERROR, STATUS_OK, STATUS_SUCCESS,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kiosk_print_core::application::{JobCoordinator, QueueInspector, SubsystemHealth};
use kiosk_print_core::port::PrintOptions;
use std::sync::Arc;
use tracing::{debug, warn};

const MSG_SUBSYSTEM_UNAVAILABLE: &str = "Printing subsystem unavailable.";
const MSG_INVALID_BODY: &str = "Invalid JSON body.";
const MSG_NOT_FOUND: &str = "Endpoint not found.";

pub struct AppStateInner {
    pub coordinator: Arc<JobCoordinator>,
    pub inspector: Arc<QueueInspector>,
}

pub type ApiState = Arc<AppStateInner>;

pub async fn health(State(state): State<ApiState>) -> Response {
    let report = state.inspector.health().await;

    let (code, status, message, cups) = match report.subsystem {
        SubsystemHealth::Available(output) => (StatusCode::OK, STATUS_OK, None, output),
        SubsystemHealth::Unavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            STATUS_ERROR,
            Some(MSG_SUBSYSTEM_UNAVAILABLE.to_string()),
            "unavailable".to_string(),
        ),
    };

    let body = HealthResponse {
        status,
        message,
        service: report.service,
        version: report.version,
        cups,
        api_url: report.api_url,
        timestamp: timestamp(),
    };
    (code, Json(body)).into_response()
}

pub async fn printers(State(state): State<ApiState>) -> Result<Json<PrintersResponse>, ApiError> {
    let output = state.inspector.printers().await?;
    Ok(Json(PrintersResponse {
        status: STATUS_OK,
        output,
        timestamp: timestamp(),
    }))
}

pub async fn printer_status(
    State(state): State<ApiState>,
) -> Result<Json<PrinterStatusResponse>, ApiError> {
    let printer_status = state.inspector.printer_status().await?;
    Ok(Json(PrinterStatusResponse {
        status: STATUS_OK,
        printer_status,
        timestamp: timestamp(),
    }))
}

pub async fn print_queue(
    State(state): State<ApiState>,
) -> Result<Json<PrintQueueResponse>, ApiError> {
    let print_queue = state.inspector.spooler_queue().await?;
    Ok(Json(PrintQueueResponse {
        status: STATUS_OK,
        print_queue,
        timestamp: timestamp(),
    }))
}

pub async fn print_badge(
    State(state): State<ApiState>,
    Path(raw_id): Path<String>,
) -> Result<Json<BadgeResponse>, ApiError> {
    let outcome = state.coordinator.handle_badge_job(&raw_id).await;
    if !outcome.is_success() {
        return Err(outcome.into());
    }

    Ok(Json(BadgeResponse {
        status: STATUS_SUCCESS,
        id: outcome.badge_id.map(|id| id.get()).unwrap_or_default(),
        file: outcome.file.unwrap_or_default(),
        api_url: outcome.source_url.unwrap_or_default(),
        message: outcome.message,
        timestamp: timestamp(),
    }))
}

pub async fn test_print(
    State(state): State<ApiState>,
    payload: Result<Json<TestPrintRequest>, JsonRejection>,
) -> Result<Json<TestPrintResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(reason = %rejection.body_text(), "Rejected test-print body");
        ApiError::BadRequest(MSG_INVALID_BODY.to_string())
    })?;

    let options = PrintOptions {
        printer: request.printer.filter(|p| !p.trim().is_empty()),
        copies: request.copies,
    };
    let file_path = request.file_path.unwrap_or_default();

    let outcome = state.coordinator.handle_local_print(&file_path, options).await;
    if !outcome.is_success() {
        return Err(outcome.into());
    }

    Ok(Json(TestPrintResponse {
        status: STATUS_SUCCESS,
        file: outcome.file.unwrap_or(file_path),
        message: outcome.message,
        timestamp: timestamp(),
    }))
}

pub async fn queue(State(state): State<ApiState>) -> Result<Json<QueueResponse>, ApiError> {
    let queue = state.inspector.list_queue().await?;
    Ok(Json(QueueResponse {
        count: queue.len(),
        queue,
        timestamp: timestamp(),
    }))
}

pub async fn not_found(uri: Uri) -> Response {
    debug!(uri = %uri, "No route");
    let body = NotFoundResponse {
        status: STATUS_ERROR,
        message: MSG_NOT_FOUND.to_string(),
        available_endpoints: AVAILABLE_ENDPOINTS.to_vec(),
        timestamp: timestamp(),
    };
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
