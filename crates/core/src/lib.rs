// Kiosk Print Core - Job Lifecycle & Ports
// NO infrastructure dependencies: HTTP, subprocesses and axum live in the infra/api crates

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "kiosk-print-daemon";
