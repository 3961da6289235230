//! HTTP API Layer
//!
//! axum routes for the kiosk: badge printing, local test prints and
//! read-only printer/queue introspection. Every body is JSON.

pub mod cors;
pub mod error;
pub mod handler;
pub mod panic_guard;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use handler::{ApiState, AppStateInner};
pub use server::{router, ApiServer, ApiServerConfig};
