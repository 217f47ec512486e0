//! Append-only ledger of completed acquisitions

use crate::utils::BilifetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One completed acquisition; immutable once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub title: String,
    pub url: String,
    pub cover_url: String,
    pub cover_path: Option<String>,
    /// Relative paths of the stored media assets, in download order
    pub video_files: Vec<String>,
    pub project_path: String,
    pub cut_video_path: String,
    pub original_video_path: String,
    pub download_time: DateTime<Utc>,
    /// Human-readable label of the quality actually served
    pub quality: String,
    pub owner: String,
    pub duration: u64,
    pub aid: u64,
    pub bvid: String,
}

/// Ordered download records persisted as a JSON array.
///
/// Loaded once at construction; mutated only by [`append`](Self::append),
/// which rewrites the backing file synchronously. A missing or malformed file
/// yields an empty ledger, healed by replacement on the next flush. Concurrent
/// processes writing the same file race last-write-wins; this is a single-user
/// tool and the race is accepted.
pub struct RecordLedger {
    path: PathBuf,
    records: Vec<DownloadRecord>,
}

impl RecordLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = Self::load(&path);
        Self { path, records }
    }

    fn load(path: &Path) -> Vec<DownloadRecord> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&text) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "ledger at {} is unreadable ({}), starting empty",
                    path.display(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Appends a record and flushes. The in-memory append always succeeds; a
    /// flush failure is logged and the record stays committed for this
    /// session, so a crash before the next successful flush can lose it.
    pub fn append(&mut self, record: DownloadRecord) {
        self.records.push(record);
        if let Err(e) = self.flush() {
            warn!(
                "failed to persist ledger to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    fn flush(&self) -> Result<(), BilifetchError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.records)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    /// Records in insertion order
    pub fn all(&self) -> &[DownloadRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
