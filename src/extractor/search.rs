//! Title lookup against the Bilibili search API
//!
//! Used by the library organizer to recover metadata for videos that were
//! downloaded out-of-band. Best effort: one request, first video hit only.

use crate::utils::{AppSettings, BilifetchError};
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use std::time::Duration;

pub const SEARCH_ENDPOINT: &str = "https://api.bilibili.com/x/web-interface/search/all/v2";

/// First matching video for a keyword lookup
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub cover_url: String,
    pub bvid: String,
}

/// Metadata lookup seam for the organizer
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Returns the best match for the keyword, or `None` when nothing matched
    async fn lookup(&self, keyword: &str) -> Result<Option<SearchHit>, BilifetchError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    code: i64,
    data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    video: Option<SearchCategory>,
}

#[derive(Debug, Deserialize)]
struct SearchCategory {
    #[serde(default)]
    data: Vec<SearchVideo>,
}

#[derive(Debug, Deserialize)]
struct SearchVideo {
    #[serde(default)]
    title: String,
    #[serde(default)]
    bvid: String,
    #[serde(default)]
    pic: String,
}

/// Search results carry `<em class="keyword">` highlighting around the match
fn strip_keyword_markup(title: &str) -> String {
    title
        .replace("<em class=\"keyword\">", "")
        .replace("</em>", "")
}

/// Search covers come back protocol-relative
fn absolute_cover_url(pic: &str) -> String {
    if pic.starts_with("//") {
        format!("https:{}", pic)
    } else {
        pic.to_string()
    }
}

/// Bilibili search API client
pub struct SearchClient {
    client: reqwest::Client,
    referer: String,
}

impl SearchClient {
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
impl VideoSearch for SearchClient {
    async fn lookup(&self, keyword: &str) -> Result<Option<SearchHit>, BilifetchError> {
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .header(header::REFERER, &self.referer)
            .query(&[
                ("keyword", keyword),
                ("page", "1"),
                ("pagesize", "1"),
            ])
            .send()
            .await?
            .json::<SearchResponse>()
            .await?;

        if response.code != 0 {
            return Ok(None);
        }

        let first = response
            .data
            .and_then(|d| d.result)
            .and_then(|r| r.video)
            .and_then(|c| c.data.into_iter().next());

        Ok(first.map(|v| SearchHit {
            title: strip_keyword_markup(&v.title),
            url: format!("https://www.bilibili.com/video/{}", v.bvid),
            cover_url: absolute_cover_url(&v.pic),
            bvid: v.bvid,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_keyword_markup() {
        assert_eq!(
            strip_keyword_markup("<em class=\"keyword\">Rust</em> tutorial"),
            "Rust tutorial"
        );
        assert_eq!(strip_keyword_markup("plain title"), "plain title");
    }

    #[test]
    fn test_absolute_cover_url() {
        assert_eq!(
            absolute_cover_url("//i0.hdslb.com/cover.jpg"),
            "https://i0.hdslb.com/cover.jpg"
        );
        assert_eq!(
            absolute_cover_url("https://i0.hdslb.com/cover.jpg"),
            "https://i0.hdslb.com/cover.jpg"
        );
    }

    #[test]
    fn test_search_response_decode() {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "code": 0,
                "data": {
                    "result": {
                        "video": {
                            "data": [
                                { "title": "hit", "bvid": "BV1x", "pic": "//host/p.jpg" }
                            ]
                        }
                    }
                }
            }"#,
        )
        .unwrap();
        let first = response
            .data
            .and_then(|d| d.result)
            .and_then(|r| r.video)
            .and_then(|c| c.data.into_iter().next())
            .unwrap();
        assert_eq!(first.bvid, "BV1x");
    }
}
