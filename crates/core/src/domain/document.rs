// Temporary documents and the temp-area naming policy

use super::job::BadgeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extensions the queue listing recognizes as documents
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Document on disk, owned by exactly one job while it is printed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryDocument {
    pub path: PathBuf,
    pub created_at: i64, // epoch ms
    pub size_bytes: u64,
}

impl TemporaryDocument {
    pub fn new(path: impl Into<PathBuf>, created_at: i64, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            created_at,
            size_bytes,
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

/// `badge_<id>_<epoch_millis>.pdf`
///
/// Unique per job as long as the same badge is not requested twice within
/// the same millisecond.
pub fn badge_file_name(id: BadgeId, now_millis: i64) -> String {
    format!("badge_{}_{}.pdf", id, now_millis)
}

pub fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// One entry of a queue snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}
