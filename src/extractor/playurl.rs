//! Stream resolution against the playurl API
//!
//! One authenticated request per attempt. The requested quality code is
//! advisory: the server substitutes a lower tier when the account or video
//! cannot serve the requested one, and the descriptor carries whatever was
//! actually served.

use crate::extractor::models::VideoInfo;
use crate::utils::{AppSettings, BilifetchError};
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const PLAYURL_ENDPOINT: &str = "https://api.bilibili.com/x/player/playurl";

/// A negotiated stream URL set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDescriptor {
    /// Separate video/audio elementary streams, combined client-side
    Dash {
        video_url: String,
        audio_url: Option<String>,
        quality: u32,
    },
    /// Single muxed file
    Direct { url: String, quality: u32 },
}

impl StreamDescriptor {
    /// Quality code the server actually served
    pub fn quality(&self) -> u32 {
        match self {
            StreamDescriptor::Dash { quality, .. } => *quality,
            StreamDescriptor::Direct { quality, .. } => *quality,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayUrlResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<PlayUrlData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayUrlData {
    #[serde(default)]
    pub quality: u32,
    #[serde(default)]
    pub dash: Option<DashInfo>,
    #[serde(default)]
    pub durl: Option<Vec<DurlEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct DashInfo {
    #[serde(default)]
    pub video: Option<Vec<DashStream>>,
    #[serde(default)]
    pub audio: Option<Vec<DashStream>>,
}

#[derive(Debug, Deserialize)]
pub struct DashStream {
    pub base_url: String,
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub bandwidth: u64,
}

#[derive(Debug, Deserialize)]
pub struct DurlEntry {
    pub url: String,
    #[serde(default)]
    pub size: u64,
}

/// Picks a stream out of a decoded playurl payload.
///
/// The first listed representation is the server's recommended default, so
/// selection never compares bitrates: first dash video plus first dash audio
/// when a dash set is present, else the first muxed entry.
pub fn select_stream(data: &PlayUrlData) -> Result<StreamDescriptor, BilifetchError> {
    if let Some(dash) = &data.dash {
        if let Some(first) = dash.video.as_deref().unwrap_or(&[]).first() {
            let audio_url = dash
                .audio
                .as_deref()
                .unwrap_or(&[])
                .first()
                .map(|a| a.base_url.clone());
            return Ok(StreamDescriptor::Dash {
                video_url: first.base_url.clone(),
                audio_url,
                quality: data.quality,
            });
        }
    }

    if let Some(first) = data.durl.as_deref().unwrap_or(&[]).first() {
        return Ok(StreamDescriptor::Direct {
            url: first.url.clone(),
            quality: data.quality,
        });
    }

    Err(BilifetchError::NoPlayableStream)
}

/// Source of negotiated streams; the pipeline drives the quality ladder
/// through this seam
#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn resolve(
        &self,
        video: &VideoInfo,
        quality: u32,
    ) -> Result<StreamDescriptor, BilifetchError>;
}

/// playurl API client
pub struct PlayUrlClient {
    client: reqwest::Client,
    referer: String,
}

impl PlayUrlClient {
    pub fn new(settings: &AppSettings) -> Result<Self, BilifetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            referer: settings.referer.clone(),
        })
    }
}

#[async_trait]
impl StreamSource for PlayUrlClient {
    async fn resolve(
        &self,
        video: &VideoInfo,
        quality: u32,
    ) -> Result<StreamDescriptor, BilifetchError> {
        let response = self
            .client
            .get(PLAYURL_ENDPOINT)
            .header(header::REFERER, &self.referer)
            .query(&[
                ("avid", video.aid.to_string()),
                ("bvid", video.bvid.clone()),
                ("cid", video.cid.to_string()),
                ("qn", quality.to_string()),
                ("fnver", "0".to_string()),
                ("fnval", "4048".to_string()),
                ("fourk", "1".to_string()),
            ])
            .send()
            .await?
            .json::<PlayUrlResponse>()
            .await?;

        if response.code != 0 {
            return Err(BilifetchError::Api {
                code: response.code,
                message: response.message,
            });
        }

        let data = response.data.ok_or(BilifetchError::NoPlayableStream)?;
        if data.quality != quality {
            debug!(
                requested = quality,
                served = data.quality,
                "server substituted quality"
            );
        }

        select_stream(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> PlayUrlData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_dash_selects_first_listed_representations() {
        let data = decode(json!({
            "quality": 80,
            "dash": {
                "video": [
                    { "base_url": "v-first", "id": 80, "bandwidth": 2000 },
                    { "base_url": "v-second", "id": 80, "bandwidth": 9000 }
                ],
                "audio": [
                    { "base_url": "a-first", "id": 30280 },
                    { "base_url": "a-second", "id": 30216 }
                ]
            }
        }));

        let stream = select_stream(&data).unwrap();
        assert_eq!(
            stream,
            StreamDescriptor::Dash {
                video_url: "v-first".to_string(),
                audio_url: Some("a-first".to_string()),
                quality: 80,
            }
        );
    }

    #[test]
    fn test_dash_without_audio() {
        let data = decode(json!({
            "quality": 64,
            "dash": { "video": [{ "base_url": "v1" }], "audio": null }
        }));

        let stream = select_stream(&data).unwrap();
        assert_eq!(
            stream,
            StreamDescriptor::Dash {
                video_url: "v1".to_string(),
                audio_url: None,
                quality: 64,
            }
        );
    }

    #[test]
    fn test_empty_dash_falls_through_to_durl() {
        let data = decode(json!({
            "quality": 48,
            "dash": { "video": [], "audio": [] },
            "durl": [{ "url": "muxed-first", "size": 1024 }, { "url": "muxed-second" }]
        }));

        let stream = select_stream(&data).unwrap();
        assert_eq!(
            stream,
            StreamDescriptor::Direct {
                url: "muxed-first".to_string(),
                quality: 48,
            }
        );
    }

    #[test]
    fn test_no_representation_is_no_playable_stream() {
        let data = decode(json!({ "quality": 80 }));
        let err = select_stream(&data).unwrap_err();
        assert!(matches!(err, BilifetchError::NoPlayableStream));

        let data = decode(json!({ "quality": 80, "durl": [] }));
        let err = select_stream(&data).unwrap_err();
        assert!(matches!(err, BilifetchError::NoPlayableStream));
    }

    #[test]
    fn test_response_decode_with_api_error_shape() {
        let response: PlayUrlResponse = serde_json::from_value(json!({
            "code": -404,
            "message": "video not found",
            "data": null
        }))
        .unwrap();
        assert_eq!(response.code, -404);
        assert_eq!(response.message, "video not found");
        assert!(response.data.is_none());
    }
}
