//! Asset acquisition and two-tier persistence

use crate::storage::backend::{
    AssetCategory, LooseDownloadBackend, ProjectDirBackend, StorageBackend,
};
use crate::utils::{AppSettings, BilifetchError};
use async_trait::async_trait;
use reqwest::header;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

const INVALID_FILENAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];
const MAX_TITLE_CHARS: usize = 100;

/// Replaces filesystem-hostile characters with `_` and caps the length at 100
/// characters. Idempotent; also used for project directory names, so titles
/// that sanitize to the same string share a directory.
pub fn sanitize_title(name: &str) -> String {
    name.chars()
        .map(|c| {
            if INVALID_FILENAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .take(MAX_TITLE_CHARS)
        .collect()
}

/// Stores fetched assets; the seam the pipeline downloads through
#[async_trait]
pub trait AssetSink: Send + Sync {
    async fn store(
        &self,
        project: &str,
        url: &str,
        filename: &str,
        category: AssetCategory,
    ) -> Result<String, BilifetchError>;

    async fn store_cover(
        &self,
        project: &str,
        url: &str,
        filename: &str,
    ) -> Result<String, BilifetchError>;
}

/// Fetches raw bytes and commits them through one of two storage backends
pub struct AssetPersister {
    client: reqwest::Client,
    referer: String,
    download_root: Option<PathBuf>,
    downloads_dir: Option<PathBuf>,
}

impl AssetPersister {
    pub fn new(settings: &AppSettings) -> Result<Self, BilifetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            referer: settings.referer.clone(),
            download_root: settings.download_root.clone(),
            downloads_dir: None,
        })
    }

    /// Overrides the loose-download target directory; used by tests
    pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = Some(dir.into());
        self
    }

    /// GET with the host-site referrer attached; the streaming CDN rejects
    /// requests lacking it
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BilifetchError> {
        let response = self
            .client
            .get(url)
            .header(header::REFERER, &self.referer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BilifetchError::Fetch(format!("{} returned HTTP {}", url, status)));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Capability probe, evaluated once per call: the project-directory
    /// backend is usable only when a download root is configured and creatable
    fn probe_project_backend(&self, project: &str) -> Option<ProjectDirBackend> {
        let root = self.download_root.as_ref()?;
        if let Err(e) = std::fs::create_dir_all(root) {
            debug!("download root {} unusable: {}", root.display(), e);
            return None;
        }
        Some(ProjectDirBackend::new(root.clone(), project))
    }

    fn fallback_backend(&self) -> LooseDownloadBackend {
        match &self.downloads_dir {
            Some(dir) => LooseDownloadBackend::with_dir(dir.clone()),
            None => LooseDownloadBackend::new(),
        }
    }

    /// Commits bytes via the preferred backend, falling back to the loose
    /// download on any failure. `category` of `None` means a cover at the
    /// project root.
    pub async fn persist(
        &self,
        project: &str,
        bytes: &[u8],
        filename: &str,
        category: Option<AssetCategory>,
    ) -> Result<String, BilifetchError> {
        if let Some(backend) = self.probe_project_backend(project) {
            let attempt = match category {
                Some(cat) => backend.persist(bytes, filename, cat).await,
                None => backend.persist_cover(bytes, filename).await,
            };
            match attempt {
                Ok(path) => return Ok(path),
                Err(e) => {
                    warn!("project directory backend failed ({}), using loose download", e)
                }
            }
        }

        let fallback = self.fallback_backend();
        match category {
            Some(cat) => fallback.persist(bytes, filename, cat).await,
            None => fallback.persist_cover(bytes, filename).await,
        }
    }
}

#[async_trait]
impl AssetSink for AssetPersister {
    async fn store(
        &self,
        project: &str,
        url: &str,
        filename: &str,
        category: AssetCategory,
    ) -> Result<String, BilifetchError> {
        let bytes = self.fetch(url).await?;
        self.persist(project, &bytes, filename, Some(category)).await
    }

    async fn store_cover(
        &self,
        project: &str,
        url: &str,
        filename: &str,
    ) -> Result<String, BilifetchError> {
        let bytes = self.fetch(url).await?;
        self.persist(project, &bytes, filename, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_replaces_invalid_characters() {
        assert_eq!(sanitize_title("Test/Video"), "Test_Video");
        assert_eq!(sanitize_title("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_title("Normal Title"), "Normal Title");
    }

    #[test]
    fn test_sanitize_truncates_to_100_chars() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_title(&long).chars().count(), 100);

        // multibyte titles are truncated by character, not byte
        let cjk = "视".repeat(150);
        assert_eq!(sanitize_title(&cjk).chars().count(), 100);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_title("What? A <Weird> Title: v2/final");
        assert_eq!(sanitize_title(&once), once);
    }

    proptest! {
        #[test]
        fn prop_sanitize_idempotent_and_bounded(name in ".{0,200}") {
            let once = sanitize_title(&name);
            prop_assert_eq!(sanitize_title(&once), once.clone());
            prop_assert!(once.chars().count() <= 100);
            prop_assert!(!once.chars().any(|c| INVALID_FILENAME_CHARS.contains(&c)));
        }
    }

    fn settings_with_root(root: Option<std::path::PathBuf>) -> AppSettings {
        AppSettings {
            download_root: root,
            ..AppSettings::default()
        }
    }

    #[tokio::test]
    async fn test_persist_prefers_project_backend() {
        let root = TempDir::new().expect("temp dir");
        let downloads = TempDir::new().expect("temp dir");
        let persister = AssetPersister::new(&settings_with_root(Some(root.path().into())))
            .unwrap()
            .with_downloads_dir(downloads.path());

        let path = persister
            .persist("proj", b"bytes", "clip.m4s", Some(AssetCategory::Cut))
            .await
            .unwrap();

        assert_eq!(path, "proj/cut_video/clip.m4s");
        assert!(root.path().join("proj/cut_video/clip.m4s").exists());
    }

    #[tokio::test]
    async fn test_persist_falls_back_when_root_unusable() {
        // a plain file where the root should be makes create_dir_all fail
        let scratch = TempDir::new().expect("temp dir");
        let blocked_root = scratch.path().join("not_a_dir");
        std::fs::write(&blocked_root, b"occupied").unwrap();

        let downloads = TempDir::new().expect("temp dir");
        let persister = AssetPersister::new(&settings_with_root(Some(blocked_root)))
            .unwrap()
            .with_downloads_dir(downloads.path());

        let path = persister
            .persist("proj", b"bytes", "clip.m4s", Some(AssetCategory::Cut))
            .await
            .unwrap();

        assert_eq!(path, "Downloads/clip.m4s");
        assert!(downloads.path().join("clip.m4s").exists());
    }

    #[tokio::test]
    async fn test_persist_without_root_uses_fallback() {
        let downloads = TempDir::new().expect("temp dir");
        let persister = AssetPersister::new(&settings_with_root(None))
            .unwrap()
            .with_downloads_dir(downloads.path());

        let path = persister.persist("proj", b"img", "cover.jpg", None).await.unwrap();
        assert_eq!(path, "Downloads/cover.jpg");
    }
}
