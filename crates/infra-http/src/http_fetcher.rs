// HTTP document fetcher
// reqwest streamed body -> tokio::fs::File, never buffering the whole document
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use kiosk_print_core::application::constants::{DEFAULT_FETCH_MAX_BYTES, DEFAULT_FETCH_TIMEOUT};
use kiosk_print_core::domain::TemporaryDocument;
use kiosk_print_core::port::{DocumentFetcher, FetchFailure, TimeProvider};

/// Time and size bounds for one download
#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Covers connect, headers, body and the file writes
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            max_bytes: DEFAULT_FETCH_MAX_BYTES,
        }
    }
}

/// Fetches documents with a shared `reqwest::Client`
pub struct HttpFetcher {
    client: reqwest::Client,
    limits: FetchLimits,
    time_provider: Arc<dyn TimeProvider>,
}

impl HttpFetcher {
    /// # Errors
    /// FetchFailure::Network if the TLS backend cannot be initialized
    pub fn new(limits: FetchLimits, time_provider: Arc<dyn TimeProvider>) -> Result<Self, FetchFailure> {
        let client = reqwest::Client::builder()
            .timeout(limits.timeout)
            .connect_timeout(limits.timeout)
            .user_agent(concat!("kiosk-print-daemon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        Ok(Self {
            client,
            limits,
            time_provider,
        })
    }

    fn parse_url(url: &str) -> Result<reqwest::Url, FetchFailure> {
        let parsed =
            reqwest::Url::parse(url).map_err(|e| FetchFailure::InvalidUrl(format!("{url}: {e}")))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(FetchFailure::InvalidUrl(format!(
                "{url}: unsupported scheme '{other}'"
            ))),
        }
    }

    fn map_reqwest(&self, e: reqwest::Error) -> FetchFailure {
        if e.is_timeout() {
            FetchFailure::Timeout(self.limits.timeout.as_millis() as u64)
        } else {
            FetchFailure::Network(e.to_string())
        }
    }

    fn too_large(&self) -> FetchFailure {
        FetchFailure::TooLarge {
            limit: self.limits.max_bytes,
        }
    }

    /// GET + stream to disk; returns bytes written
    async fn download(&self, url: reqwest::Url, destination: &Path) -> Result<u64, FetchFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }
        if let Some(declared) = response.content_length() {
            if declared > self.limits.max_bytes {
                debug!(declared, limit = self.limits.max_bytes, "Content-Length over limit");
                return Err(self.too_large());
            }
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| FetchFailure::Io(e.to_string()))?;

        let mut written: u64 = 0;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| self.map_reqwest(e))?;
            written += chunk.len() as u64;
            if written > self.limits.max_bytes {
                return Err(self.too_large());
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchFailure::Io(e.to_string()))?;
        }

        file.flush()
            .await
            .map_err(|e| FetchFailure::Io(e.to_string()))?;
        Ok(written)
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
    ) -> Result<TemporaryDocument, FetchFailure> {
        let parsed = Self::parse_url(url)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| FetchFailure::Io(e.to_string()))?;
        }

        let start_time = self.time_provider.now_millis();
        let result = tokio::time::timeout(self.limits.timeout, self.download(parsed, destination))
            .await
            .unwrap_or_else(|_| Err(FetchFailure::Timeout(self.limits.timeout.as_millis() as u64)));
        let duration_ms = self.time_provider.now_millis() - start_time;

        match result {
            Ok(size_bytes) => {
                info!(
                    url = %url,
                    file = %destination.display(),
                    size_bytes,
                    duration_ms,
                    "Document downloaded"
                );
                Ok(TemporaryDocument::new(
                    destination,
                    self.time_provider.now_millis(),
                    size_bytes,
                ))
            }
            Err(e) => {
                warn!(url = %url, duration_ms, error = %e, "Document download failed");
                Err(e)
            }
        }
    }
}
