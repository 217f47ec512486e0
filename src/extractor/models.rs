//! Video metadata extracted from host-provided page state

use crate::utils::BilifetchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable snapshot of the video being acquired, read once per run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub aid: u64,
    pub bvid: String,
    pub cid: u64,
    /// Cover image URL
    pub pic: String,
    pub desc: String,
    /// Duration in seconds
    pub duration: u64,
    /// Uploader display name
    pub owner: String,
    /// Canonical page URL
    pub url: String,
    /// Sub-pages of a multi-part video; only the first part is acquired
    pub pages: Vec<VideoPage>,
}

/// One playable part of a multi-part video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoPage {
    pub cid: u64,
    pub page: u32,
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub duration: u64,
}

/// Shape of the host page's injected state object
#[derive(Debug, Deserialize)]
struct PageState {
    #[serde(rename = "videoData")]
    video_data: Option<RawVideoData>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawVideoData {
    #[serde(default)]
    title: String,
    #[serde(default)]
    aid: u64,
    #[serde(default)]
    bvid: String,
    #[serde(default)]
    cid: u64,
    #[serde(default)]
    pic: String,
    #[serde(default)]
    desc: String,
    #[serde(default)]
    duration: u64,
    owner: Option<RawOwner>,
    #[serde(default)]
    pages: Vec<VideoPage>,
}

#[derive(Debug, Deserialize)]
struct RawOwner {
    #[serde(default)]
    name: String,
}

impl VideoInfo {
    /// Resolves a [`VideoInfo`] from a page-state document.
    ///
    /// Fails with [`BilifetchError::NoPageState`] when the document does not
    /// have the expected shape, the nested video data is absent, or any of the
    /// `aid`/`bvid`/`cid` identifiers is missing.
    pub fn from_page_state(state: &Value) -> Result<Self, BilifetchError> {
        let state: PageState =
            serde_json::from_value(state.clone()).map_err(|_| BilifetchError::NoPageState)?;
        let data = state.video_data.ok_or(BilifetchError::NoPageState)?;

        if data.aid == 0 || data.bvid.is_empty() || data.cid == 0 {
            return Err(BilifetchError::NoPageState);
        }

        let url = state
            .url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| format!("https://www.bilibili.com/video/{}", data.bvid));

        Ok(Self {
            title: data.title,
            aid: data.aid,
            bvid: data.bvid,
            cid: data.cid,
            pic: data.pic,
            desc: data.desc,
            duration: data.duration,
            owner: data.owner.map(|o| o.name).unwrap_or_default(),
            url,
            pages: data.pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_state() -> Value {
        json!({
            "videoData": {
                "title": "Sample Video",
                "aid": 170001,
                "bvid": "BV17x411w7KC",
                "cid": 279786,
                "pic": "https://i0.hdslb.com/cover.jpg",
                "desc": "demo",
                "duration": 486,
                "owner": { "name": "Uploader" },
                "pages": [
                    { "cid": 279786, "page": 1, "part": "P1", "duration": 486 }
                ]
            },
            "url": "https://www.bilibili.com/video/BV17x411w7KC"
        })
    }

    #[test]
    fn test_resolve_from_page_state() {
        let info = VideoInfo::from_page_state(&sample_state()).unwrap();
        assert_eq!(info.title, "Sample Video");
        assert_eq!(info.aid, 170001);
        assert_eq!(info.bvid, "BV17x411w7KC");
        assert_eq!(info.cid, 279786);
        assert_eq!(info.owner, "Uploader");
        assert_eq!(info.pages.len(), 1);
    }

    #[test]
    fn test_missing_video_data_fails() {
        let err = VideoInfo::from_page_state(&json!({})).unwrap_err();
        assert!(matches!(err, BilifetchError::NoPageState));

        let err = VideoInfo::from_page_state(&json!({ "videoData": null })).unwrap_err();
        assert!(matches!(err, BilifetchError::NoPageState));
    }

    #[test]
    fn test_empty_identifiers_fail() {
        let state = json!({
            "videoData": { "title": "t", "aid": 0, "bvid": "", "cid": 0 }
        });
        let err = VideoInfo::from_page_state(&state).unwrap_err();
        assert!(matches!(err, BilifetchError::NoPageState));
    }

    #[test]
    fn test_url_derived_from_bvid_when_absent() {
        let state = json!({
            "videoData": { "title": "t", "aid": 1, "bvid": "BV1x", "cid": 9 }
        });
        let info = VideoInfo::from_page_state(&state).unwrap();
        assert_eq!(info.url, "https://www.bilibili.com/video/BV1x");
    }
}
