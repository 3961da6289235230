// Deferred Cleanup Scheduler
// Deletes printed temp documents after a grace delay, one cancellable task per path

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// What a cleanup task did when it fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupResult {
    Removed,
    /// Someone else already deleted the file
    AlreadyGone,
    Failed(String),
}

type PendingMap = Arc<Mutex<HashMap<PathBuf, (u64, AbortHandle)>>>;

/// Cleanup scheduler
///
/// Tasks are detached from the request that scheduled them: dropping the
/// returned [`CleanupTicket`] does not cancel anything. Timers run on the tokio
/// clock, so tests can drive them with `tokio::time::pause`.
pub struct CleanupScheduler {
    delay: Duration,
    pending: PendingMap,
    next_id: AtomicU64,
}

/// Handle to one scheduled deletion
pub struct CleanupTicket {
    handle: JoinHandle<CleanupResult>,
}

impl CleanupTicket {
    /// Wait for the deletion to run. `None` if it was cancelled or replaced.
    pub async fn wait(self) -> Option<CleanupResult> {
        self.handle.await.ok()
    }
}

fn lock(pending: &PendingMap) -> MutexGuard<'_, HashMap<PathBuf, (u64, AbortHandle)>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Drop the map entry for `path` if it still belongs to task `id`
fn release(pending: &PendingMap, path: &Path, id: u64) {
    let mut map = lock(pending);
    if map.get(path).map(|(owner, _)| *owner) == Some(id) {
        map.remove(path);
    }
}

async fn remove_document(path: &Path) -> CleanupResult {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            info!(path = %path.display(), "Temporary document removed");
            CleanupResult::Removed
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Temporary document already gone");
            CleanupResult::AlreadyGone
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary document");
            CleanupResult::Failed(e.to_string())
        }
    }
}

impl CleanupScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule deletion of `path` after the grace delay
    ///
    /// Scheduling a path that already has a pending deletion replaces it.
    pub fn schedule(&self, path: impl Into<PathBuf>) -> CleanupTicket {
        let path = path.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;
        let task_path = path.clone();

        // Registered under the lock: the task cannot release an entry that
        // has not been inserted yet.
        let mut map = lock(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            release(&pending, &task_path, id);
            remove_document(&task_path).await
        });
        if let Some((_, previous)) = map.insert(path.clone(), (id, handle.abort_handle())) {
            previous.abort();
        }
        drop(map);

        debug!(path = %path.display(), delay_ms = delay.as_millis() as u64, "Cleanup scheduled");
        CleanupTicket { handle }
    }

    /// Cancel the pending deletion of `path`. Returns false if none was pending.
    pub fn cancel(&self, path: &Path) -> bool {
        match lock(&self.pending).remove(path) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, path: &Path) -> bool {
        lock(&self.pending).contains_key(path)
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Cancel every timer and delete the documents right away
    ///
    /// Used on shutdown so grace timers do not outlive the process and leave
    /// files behind. Returns the number of documents actually removed.
    pub async fn flush(&self) -> usize {
        let drained: Vec<(PathBuf, AbortHandle)> = lock(&self.pending)
            .drain()
            .map(|(path, (_, handle))| (path, handle))
            .collect();

        let mut removed = 0;
        for (path, handle) in drained {
            handle.abort();
            if remove_document(&path).await == CleanupResult::Removed {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Flushed pending cleanups");
        }
        removed
    }
}
