// Application Layer - Use Cases

pub mod cleanup;
pub mod constants;
pub mod coordinator;
pub mod inspector;
mod shutdown;

// Re-exports
pub use cleanup::{CleanupResult, CleanupScheduler, CleanupTicket};
pub use coordinator::{CoordinatorSettings, JobCoordinator};
pub use inspector::{HealthReport, QueueInspector, SubsystemHealth};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
