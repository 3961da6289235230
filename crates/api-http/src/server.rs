//! HTTP Server
//!
//! Binds the listener up front so the caller can log (or, in tests, dial)
//! the real address before serving.

use crate::cors::cors_middleware;
use crate::handler::{self, ApiState};
use crate::panic_guard::panic_guard;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// All routes, the JSON 404 fallback, panic isolation and the CORS layer
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handler::health))
        .route("/printers", get(handler::printers))
        .route("/printer-status", get(handler::printer_status))
        .route("/print-queue", get(handler::print_queue))
        .route("/badge/{id}", get(handler::print_badge))
        .route("/test-print", post(handler::test_print))
        .route("/queue", get(handler::queue))
        .fallback(handler::not_found)
        .method_not_allowed_fallback(handler::not_found)
        .layer(middleware::from_fn(panic_guard))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

pub struct ApiServer {
    listener: TcpListener,
    router: Router,
}

impl ApiServer {
    pub async fn bind(config: &ApiServerConfig, state: ApiState) -> io::Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;

        info!(addr = %listener.local_addr()?, "HTTP server bound");

        Ok(Self {
            listener,
            router: router(state),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn serve<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("HTTP server stopped");
        Ok(())
    }
}
