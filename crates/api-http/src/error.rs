//! HTTP Error Types
//!
//! Maps application errors and failed job outcomes to status codes. Bodies
//! only ever carry the short caller-safe message; causes go to the log.

use crate::types::{timestamp, ErrorResponse, STATUS_ERROR};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kiosk_print_core::domain::{JobOutcome, JobStatus};
use kiosk_print_core::error::AppError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request rejected before reaching a component
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    App(#[from] AppError),

    /// A job finished in a non-success state
    #[error("job failed ({status:?}): {message}")]
    Job { status: JobStatus, message: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::App(AppError::Validation(_) | AppError::Domain(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::App(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Job { status, .. } => match status {
                JobStatus::ValidationError => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::App(e) => e.public_message().to_string(),
            ApiError::Job { message, .. } => message.clone(),
        }
    }
}

impl From<JobOutcome> for ApiError {
    fn from(outcome: JobOutcome) -> Self {
        ApiError::Job {
            status: outcome.status,
            message: outcome.message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::App(e) = &self {
            error!(error = %e, "Request failed");
        }

        let body = ErrorResponse {
            status: STATUS_ERROR,
            message: self.public_message(),
            timestamp: timestamp(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
