// Kiosk Print Infrastructure - Network Adapters
// Implements: DocumentFetcher (streamed HTTP GET with time and size bounds)

pub mod http_fetcher;

pub use http_fetcher::{FetchLimits, HttpFetcher};
