//! Library organizer
//!
//! Sweeps a directory of videos that were downloaded out-of-band into the same
//! per-video project layout the pipeline produces, recovers metadata through
//! the search API, and appends ledger records so the spreadsheet export covers
//! them too.

use crate::extractor::search::{SearchClient, VideoSearch};
use crate::ledger::{DownloadRecord, RecordLedger};
use crate::storage::{sanitize_title, AssetCategory};
use crate::utils::{AppSettings, BilifetchError, LogStatus, StatusLevel, StatusSink};
use chrono::Utc;
use reqwest::header;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::warn;
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"];

/// Quality column value for imports with no negotiated stream
const IMPORTED_QUALITY_LABEL: &str = "unknown";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub imported: usize,
    pub skipped: usize,
    /// Imported without search metadata
    pub unmatched: usize,
}

pub struct LibraryOrganizer {
    source: PathBuf,
    target: PathBuf,
    search: Arc<dyn VideoSearch>,
    client: reqwest::Client,
    referer: String,
    status: Arc<dyn StatusSink>,
}

impl LibraryOrganizer {
    pub fn new(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        settings: &AppSettings,
    ) -> Result<Self, BilifetchError> {
        let search = Arc::new(SearchClient::new(settings)?);
        Self::with_parts(source, target, settings, search, Arc::new(LogStatus))
    }

    /// Constructor with injectable search and status seams; used by tests
    pub fn with_parts(
        source: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        settings: &AppSettings,
        search: Arc<dyn VideoSearch>,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self, BilifetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            source: source.into(),
            target: target.into(),
            search,
            client,
            referer: settings.referer.clone(),
            status,
        })
    }

    /// Video files under the source directory, recursively
    pub fn scan(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.source)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .map(|entry| entry.into_path())
            .collect()
    }

    /// Imports every video file found under the source directory, appending a
    /// ledger record per imported file. Files already present in the ledger
    /// are skipped; search misses still get a record with blank metadata.
    pub async fn run(&self, ledger: &mut RecordLedger) -> Result<OrganizeSummary, BilifetchError> {
        let mut summary = OrganizeSummary::default();

        for file in self.scan() {
            let file_name = match file.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            let cleaned = clean_name(&file_name);
            // same path shape the project-directory backend reports
            let stored = format!(
                "{}/{}/{}",
                cleaned,
                AssetCategory::Cut.dir_name(),
                file_name
            );

            if already_imported(ledger, &stored) {
                self.status.notify(
                    StatusLevel::Info,
                    &format!("{} already imported, skipping", file_name),
                );
                summary.skipped += 1;
                continue;
            }

            let project_dir = self.target.join(&cleaned);
            let cut_dir = project_dir.join(AssetCategory::Cut.dir_name());
            fs::create_dir_all(&cut_dir).await?;
            fs::create_dir_all(project_dir.join(AssetCategory::Original.dir_name())).await?;

            move_file(&file, &cut_dir.join(&file_name)).await?;

            let hit = match self.search.lookup(&cleaned).await {
                Ok(hit) => hit,
                Err(e) => {
                    warn!("search for {:?} failed: {}", cleaned, e);
                    None
                }
            };

            let cover_path = match &hit {
                Some(hit) if !hit.cover_url.is_empty() => {
                    self.download_cover(&hit.cover_url, &project_dir, &cleaned).await
                }
                _ => None,
            };

            if hit.is_none() {
                summary.unmatched += 1;
            }

            let record = DownloadRecord {
                title: hit.as_ref().map(|h| h.title.clone()).unwrap_or_else(|| cleaned.clone()),
                url: hit.as_ref().map(|h| h.url.clone()).unwrap_or_default(),
                cover_url: hit.as_ref().map(|h| h.cover_url.clone()).unwrap_or_default(),
                cover_path,
                video_files: vec![stored],
                project_path: cleaned.clone(),
                cut_video_path: format!("{}/{}", cleaned, AssetCategory::Cut.dir_name()),
                original_video_path: format!("{}/{}", cleaned, AssetCategory::Original.dir_name()),
                download_time: Utc::now(),
                quality: IMPORTED_QUALITY_LABEL.to_string(),
                owner: String::new(),
                duration: 0,
                aid: 0,
                bvid: hit.as_ref().map(|h| h.bvid.clone()).unwrap_or_default(),
            };
            ledger.append(record);

            self.status
                .notify(StatusLevel::Success, &format!("Imported {}", file_name));
            summary.imported += 1;
        }

        Ok(summary)
    }

    async fn download_cover(
        &self,
        cover_url: &str,
        project_dir: &Path,
        project: &str,
    ) -> Option<String> {
        let response = self
            .client
            .get(cover_url)
            .header(header::REFERER, &self.referer)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            warn!("cover fetch for {:?} returned {}", project, response.status());
            return None;
        }
        let bytes = response.bytes().await.ok()?;

        if let Err(e) = fs::write(project_dir.join("cover.jpg"), &bytes).await {
            warn!("could not write cover for {:?}: {}", project, e);
            return None;
        }
        Some(format!("{}/cover.jpg", project))
    }
}

fn already_imported(ledger: &RecordLedger, stored: &str) -> bool {
    ledger
        .all()
        .iter()
        .any(|record| record.video_files.iter().any(|f| f == stored))
}

/// Project name for an imported file: the stem, sanitized and trimmed
fn clean_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    sanitize_title(stem).trim().to_string()
}

/// Rename when possible, copy-and-remove across filesystems
async fn move_file(from: &Path, to: &Path) -> Result<(), BilifetchError> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    fs::copy(from, to).await?;
    fs::remove_file(from).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name_strips_extension_and_sanitizes() {
        assert_eq!(clean_name("My Clip.mp4"), "My Clip");
        assert_eq!(clean_name("a:b?.mkv"), "a_b_");
        assert_eq!(clean_name(" padded .mp4"), "padded");
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(temp.path().join("clip.MP4"), b"v").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"t").unwrap();
        std::fs::create_dir(temp.path().join("nested")).unwrap();
        std::fs::write(temp.path().join("nested/other.webm"), b"v").unwrap();

        let settings = AppSettings::default();
        let organizer = LibraryOrganizer::new(temp.path(), temp.path(), &settings).unwrap();
        let mut found: Vec<_> = organizer
            .scan()
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect();
        found.sort();

        assert_eq!(found, vec!["clip.MP4", "other.webm"]);
    }
}
