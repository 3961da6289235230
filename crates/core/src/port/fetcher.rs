// Document Fetcher Port
// Abstraction for pulling a remote document into the temp area

use crate::domain::TemporaryDocument;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Fetch errors (all carry a human-readable cause for the log sink)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream responded with HTTP {0}")]
    Status(u16),

    #[error("Download timed out after {0}ms")]
    Timeout(u64),

    #[error("Document exceeds size limit of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Filesystem error: {0}")]
    Io(String),
}

/// Document Fetcher trait
///
/// Implementations:
/// - HttpFetcher: streamed GET with time and size bounds (infra-http)
/// - mocks::MockFetcher: in-memory bodies for tests
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Download `url` into `destination`
    ///
    /// Creates the parent directory if needed and at most one file at
    /// `destination`. A partially written file may remain on failure.
    ///
    /// # Errors
    /// - FetchFailure::InvalidUrl if `url` is not an absolute http(s) URL
    /// - FetchFailure::Status for non-2xx responses
    /// - FetchFailure::Timeout / TooLarge when a bound is exceeded
    async fn fetch(&self, url: &str, destination: &Path)
        -> Result<TemporaryDocument, FetchFailure>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock fetcher behavior
    #[derive(Debug, Clone)]
    pub enum MockFetchBehavior {
        /// Write these bytes to the destination
        Body(Vec<u8>),
        /// Write a partial body, then fail
        PartialThenFail(Vec<u8>, FetchFailure),
        /// Fail without touching the filesystem
        Fail(FetchFailure),
    }

    /// Mock Document Fetcher for testing
    pub struct MockFetcher {
        behavior: Arc<Mutex<MockFetchBehavior>>,
        requested_urls: Arc<Mutex<Vec<String>>>,
    }

    impl MockFetcher {
        pub fn new(behavior: MockFetchBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                requested_urls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_success() -> Self {
            Self::new(MockFetchBehavior::Body(b"%PDF-1.4 mock badge".to_vec()))
        }

        pub fn new_fail(failure: FetchFailure) -> Self {
            Self::new(MockFetchBehavior::Fail(failure))
        }

        pub fn set_behavior(&self, behavior: MockFetchBehavior) {
            *self.behavior.lock().unwrap() = behavior;
        }

        pub fn call_count(&self) -> usize {
            self.requested_urls.lock().unwrap().len()
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.requested_urls.lock().unwrap().clone()
        }
    }

    async fn write_body(destination: &Path, body: &[u8]) -> Result<(), FetchFailure> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchFailure::Io(e.to_string()))?;
        }
        tokio::fs::write(destination, body)
            .await
            .map_err(|e| FetchFailure::Io(e.to_string()))
    }

    #[async_trait]
    impl DocumentFetcher for MockFetcher {
        async fn fetch(
            &self,
            url: &str,
            destination: &Path,
        ) -> Result<TemporaryDocument, FetchFailure> {
            self.requested_urls.lock().unwrap().push(url.to_string());

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockFetchBehavior::Body(body) => {
                    write_body(destination, &body).await?;
                    Ok(TemporaryDocument::new(
                        destination,
                        chrono::Utc::now().timestamp_millis(),
                        body.len() as u64,
                    ))
                }
                MockFetchBehavior::PartialThenFail(body, failure) => {
                    write_body(destination, &body).await?;
                    Err(failure)
                }
                MockFetchBehavior::Fail(failure) => Err(failure),
            }
        }
    }
}
