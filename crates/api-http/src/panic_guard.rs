//! Panic isolation for request handlers
//!
//! A handler that panics answers with the uniform JSON 500 instead of
//! resetting the connection.

use crate::types::{timestamp, ErrorResponse, STATUS_ERROR};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

pub const MSG_INTERNAL_ERROR: &str = "Internal server error.";

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

pub async fn panic_guard(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(payload) => {
            error!(
                method = %method,
                path = %path,
                panic_msg = %panic_message(payload.as_ref()),
                "Request handler panicked"
            );
            let body = ErrorResponse {
                status: STATUS_ERROR,
                message: MSG_INTERNAL_ERROR.to_string(),
                timestamp: timestamp(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cors::{cors_middleware, ALLOW_ORIGIN};
    use axum::body::Body;
    use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
    use axum::http::Request;
    use axum::routing::get;
    use axum::{middleware, Router};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::util::ServiceExt;

    async fn boom() -> &'static str {
        panic!("lpstat exploded in /opt/kiosk/printer.py")
    }

    async fn fine() -> &'static str {
        "ok"
    }

    fn app() -> Router {
        Router::new()
            .route("/boom", get(boom))
            .route("/fine", get(fine))
            .layer(middleware::from_fn(panic_guard))
            .layer(middleware::from_fn(cors_middleware))
    }

    #[tokio::test]
    async fn test_panicking_handler_is_json_500() {
        let app = app();

        let response = app
            .clone()
            .oneshot(Request::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ALLOW_ORIGIN
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], MSG_INTERNAL_ERROR);
        assert!(body["timestamp"].is_string());

        // Later requests are unaffected
        let response = app
            .oneshot(Request::get("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42_u32), "Unknown panic");
    }
}
