//! Acquisition pipeline
//!
//! One run: metadata → stream negotiation (two-attempt quality ladder) →
//! sequential asset downloads → ledger append → spreadsheet export. Assets are
//! fetched strictly one after another; a failed asset degrades the resulting
//! record instead of aborting, but a run that stores nothing at all never
//! reaches the ledger.

use crate::extractor::playurl::{StreamDescriptor, StreamSource};
use crate::extractor::quality::quality_label;
use crate::extractor::VideoInfo;
use crate::ledger::{DownloadRecord, ExportEmitter, RecordLedger};
use crate::storage::{sanitize_title, AssetCategory, AssetPersister, AssetSink};
use crate::utils::{AppSettings, BilifetchError, LogStatus, StatusLevel, StatusSink};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// File extension for the cover asset, inferred from its URL
fn cover_extension(url: &str) -> &'static str {
    if url.contains(".png") {
        ".png"
    } else if url.contains(".gif") {
        ".gif"
    } else {
        ".jpg"
    }
}

pub struct Pipeline {
    settings: AppSettings,
    streams: Arc<dyn StreamSource>,
    assets: Arc<dyn AssetSink>,
    ledger: RecordLedger,
    exporter: ExportEmitter,
    status: Arc<dyn StatusSink>,
}

impl Pipeline {
    pub fn new(
        settings: AppSettings,
        streams: Arc<dyn StreamSource>,
        assets: Arc<dyn AssetSink>,
        ledger: RecordLedger,
        exporter: ExportEmitter,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            settings,
            streams,
            assets,
            ledger,
            exporter,
            status,
        }
    }

    /// Wires the real playurl client, persister and log-backed status sink
    pub fn with_defaults(settings: AppSettings) -> Result<Self, BilifetchError> {
        let streams = Arc::new(crate::extractor::PlayUrlClient::new(&settings)?);
        let assets = Arc::new(AssetPersister::new(&settings)?);
        let ledger = RecordLedger::open(&settings.ledger_path);
        let exporter = ExportEmitter::new(&settings.export_dir);
        Ok(Self::new(
            settings,
            streams,
            assets,
            ledger,
            exporter,
            Arc::new(LogStatus),
        ))
    }

    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    fn fail(&self, err: BilifetchError) -> BilifetchError {
        self.status.notify(StatusLevel::Error, &err.to_string());
        err
    }

    /// Runs one acquisition for the video described by `state`.
    ///
    /// Returns the committed record, or the terminal error when metadata
    /// resolution fails, both ladder attempts are exhausted, or no asset at
    /// all could be stored.
    pub async fn run(&mut self, state: &Value) -> Result<DownloadRecord, BilifetchError> {
        self.status
            .notify(StatusLevel::Info, "Resolving video metadata");
        let video = VideoInfo::from_page_state(state).map_err(|e| self.fail(e))?;

        self.status
            .notify(StatusLevel::Info, "Negotiating stream quality");
        let stream = self.negotiate_stream(&video).await?;
        let served_label = quality_label(stream.quality());
        self.status.notify(
            StatusLevel::Success,
            &format!("Downloading at {}", served_label),
        );

        let project = sanitize_title(&video.title);
        let video_files = self.store_media(&project, &stream).await;
        let cover_path = self.store_cover(&project, &video).await;

        if video_files.is_empty() && cover_path.is_none() {
            return Err(self.fail(BilifetchError::Write(
                "no asset could be stored".to_string(),
            )));
        }

        let record = DownloadRecord {
            title: video.title.clone(),
            url: video.url.clone(),
            cover_url: video.pic.clone(),
            cover_path,
            video_files,
            project_path: project.clone(),
            cut_video_path: format!("{}/{}", project, AssetCategory::Cut.dir_name()),
            original_video_path: format!("{}/{}", project, AssetCategory::Original.dir_name()),
            download_time: Utc::now(),
            quality: served_label,
            owner: video.owner.clone(),
            duration: video.duration,
            aid: video.aid,
            bvid: video.bvid.clone(),
        };
        self.ledger.append(record.clone());

        match self.exporter.emit(self.ledger.all()) {
            Ok(path) => self.status.notify(
                StatusLevel::Success,
                &format!("Spreadsheet exported to {}", path.display()),
            ),
            Err(e) => self.status.notify(
                StatusLevel::Warning,
                &format!("Spreadsheet export failed: {}", e),
            ),
        }

        self.status.notify(StatusLevel::Success, "Download complete");
        Ok(record)
    }

    /// Two attempts only: the preferred quality, then the single fallback.
    /// Exhausting both is terminal for the run.
    async fn negotiate_stream(
        &self,
        video: &VideoInfo,
    ) -> Result<StreamDescriptor, BilifetchError> {
        let preferred = self.settings.preferred_quality;
        match self.streams.resolve(video, preferred).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                let fallback = self.settings.fallback_quality;
                self.status.notify(
                    StatusLevel::Warning,
                    &format!(
                        "{} unavailable ({}), retrying at {}",
                        quality_label(preferred),
                        e,
                        quality_label(fallback)
                    ),
                );
                self.streams.resolve(video, fallback).await.map_err(|e| {
                    warn!("fallback quality attempt failed: {}", e);
                    self.fail(BilifetchError::NoPlayableStream)
                })
            }
        }
    }

    /// Downloads the media assets one after another; failures degrade the
    /// record rather than aborting the run
    async fn store_media(&self, project: &str, stream: &StreamDescriptor) -> Vec<String> {
        let mut stored = Vec::new();

        match stream {
            StreamDescriptor::Dash {
                video_url,
                audio_url,
                ..
            } => {
                let filename = format!("{}_video.m4s", project);
                self.store_one(project, video_url, &filename, &mut stored)
                    .await;

                if let Some(audio_url) = audio_url {
                    let filename = format!("{}_audio.m4s", project);
                    self.store_one(project, audio_url, &filename, &mut stored)
                        .await;
                }
            }
            StreamDescriptor::Direct { url, .. } => {
                let filename = format!("{}.mp4", project);
                self.store_one(project, url, &filename, &mut stored).await;
            }
        }

        stored
    }

    async fn store_one(&self, project: &str, url: &str, filename: &str, stored: &mut Vec<String>) {
        self.status
            .notify(StatusLevel::Info, &format!("Downloading {}", filename));
        match self
            .assets
            .store(project, url, filename, AssetCategory::Cut)
            .await
        {
            Ok(path) => stored.push(path),
            Err(e) => self.status.notify(
                StatusLevel::Warning,
                &format!("{} not stored: {}", filename, e),
            ),
        }
    }

    async fn store_cover(&self, project: &str, video: &VideoInfo) -> Option<String> {
        if video.pic.is_empty() {
            return None;
        }

        let filename = format!("cover{}", cover_extension(&video.pic));
        match self.assets.store_cover(project, &video.pic, &filename).await {
            Ok(path) => Some(path),
            Err(e) => {
                self.status.notify(
                    StatusLevel::Warning,
                    &format!("Cover not stored: {}", e),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_extension() {
        assert_eq!(cover_extension("https://host/c.png"), ".png");
        assert_eq!(cover_extension("https://host/c.gif"), ".gif");
        assert_eq!(cover_extension("https://host/c.jpg"), ".jpg");
        assert_eq!(cover_extension("https://host/c"), ".jpg");
    }
}
