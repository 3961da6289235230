// Port Layer - Interfaces for external collaborators

pub mod fetcher;
pub mod print_subsystem;
pub mod time_provider;

// Re-exports
pub use fetcher::{DocumentFetcher, FetchFailure};
pub use print_subsystem::{PrintFailure, PrintOptions, PrintSubsystem};
pub use time_provider::TimeProvider;
