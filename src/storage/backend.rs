//! Storage backends for downloaded assets
//!
//! Two implementations behind one trait so the pipeline stays backend-agnostic:
//! a project-directory layout under a chosen root, and a loose-download
//! fallback that drops files into the Downloads directory.

use crate::utils::BilifetchError;
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tokio::fs;

/// Logical sub-directory of a project: processed vs. raw assets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Cut,
    Original,
}

impl AssetCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Cut => "cut_video",
            AssetCategory::Original => "original_video",
        }
    }
}

/// Commits raw bytes to storage and reports the stored relative path
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn persist(
        &self,
        bytes: &[u8],
        filename: &str,
        category: AssetCategory,
    ) -> Result<String, BilifetchError>;

    /// Covers live at the project root rather than in a category directory
    async fn persist_cover(&self, bytes: &[u8], filename: &str) -> Result<String, BilifetchError>;
}

/// Preferred backend: `{root}/{project}/{category}/{filename}`
pub struct ProjectDirBackend {
    root: PathBuf,
    project: String,
}

impl ProjectDirBackend {
    pub fn new(root: impl Into<PathBuf>, project: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            project: project.into(),
        }
    }

    /// Obtains-or-creates the project directory and both category
    /// sub-directories; safe to repeat
    async fn ensure_layout(&self) -> Result<PathBuf, BilifetchError> {
        let project_dir = self.root.join(&self.project);
        fs::create_dir_all(project_dir.join(AssetCategory::Cut.dir_name())).await?;
        fs::create_dir_all(project_dir.join(AssetCategory::Original.dir_name())).await?;
        Ok(project_dir)
    }
}

#[async_trait]
impl StorageBackend for ProjectDirBackend {
    async fn persist(
        &self,
        bytes: &[u8],
        filename: &str,
        category: AssetCategory,
    ) -> Result<String, BilifetchError> {
        let project_dir = self.ensure_layout().await?;
        let target = project_dir.join(category.dir_name()).join(filename);
        fs::write(&target, bytes).await?;
        Ok(format!(
            "{}/{}/{}",
            self.project,
            category.dir_name(),
            filename
        ))
    }

    async fn persist_cover(&self, bytes: &[u8], filename: &str) -> Result<String, BilifetchError> {
        let project_dir = self.ensure_layout().await?;
        fs::write(project_dir.join(filename), bytes).await?;
        Ok(format!("{}/{}", self.project, filename))
    }
}

/// Fallback backend: a flat save into the Downloads directory.
///
/// Cannot honor the project/category layout, so reported paths are the
/// approximate `Downloads/{filename}` form.
pub struct LooseDownloadBackend {
    downloads_dir: PathBuf,
}

impl LooseDownloadBackend {
    pub fn new() -> Self {
        Self {
            downloads_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from("./downloads")),
        }
    }

    pub fn with_dir(downloads_dir: impl Into<PathBuf>) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
        }
    }

    async fn save(&self, bytes: &[u8], filename: &str) -> Result<String, BilifetchError> {
        let write_err = |e: std::io::Error| BilifetchError::Write(e.to_string());

        fs::create_dir_all(&self.downloads_dir).await.map_err(write_err)?;

        // Stage through a transient temp file; dropping it releases the file
        // on every exit path, including errors.
        let mut staged = tempfile::NamedTempFile::new().map_err(write_err)?;
        staged.write_all(bytes).map_err(write_err)?;
        staged.flush().map_err(write_err)?;

        let target = self.downloads_dir.join(filename);
        fs::copy(staged.path(), &target).await.map_err(write_err)?;

        Ok(format!("Downloads/{}", filename))
    }
}

impl Default for LooseDownloadBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for LooseDownloadBackend {
    async fn persist(
        &self,
        bytes: &[u8],
        filename: &str,
        _category: AssetCategory,
    ) -> Result<String, BilifetchError> {
        self.save(bytes, filename).await
    }

    async fn persist_cover(&self, bytes: &[u8], filename: &str) -> Result<String, BilifetchError> {
        self.save(bytes, filename).await
    }
}
